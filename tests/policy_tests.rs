use chrono::Duration;
use fdcalllog::ledger::CallLedger;
use fdcalllog::models::call::{Associations, Call};
use fdcalllog::settings::{
    EditPolicy, KEY_ADMIN_CAN_ALWAYS_EDIT, KEY_EDIT_TIME_LIMIT, parse_time_limit, set_setting,
};

mod common;
use common::{add_member, open_db, sample_call};

fn filed_call(pool: &mut fdcalllog::db::pool::DbPool, creator: i64) -> Call {
    CallLedger::create_call(
        &mut pool.conn,
        &sample_call(creator, "2026-03-01 10:00", "Structure Fire", "Stamford"),
        &Associations::default(),
    )
    .expect("create call")
}

#[test]
fn test_creator_window_boundary() {
    let (mut pool, _) = open_db("policy_boundary");
    let u = add_member(&pool, "Jane", "Doe", "1111", false);
    let call = filed_call(&mut pool, u.id);

    let at_limit = call.created_at + Duration::minutes(30);
    assert!(CallLedger::can_user_edit_call_at(&pool.conn, call.id, u.id, call.created_at).unwrap());
    assert!(CallLedger::can_user_edit_call_at(&pool.conn, call.id, u.id, at_limit).unwrap());
    assert!(
        !CallLedger::can_user_edit_call_at(
            &pool.conn,
            call.id,
            u.id,
            at_limit + Duration::microseconds(1)
        )
        .unwrap()
    );

    // freshly filed: inside the window right now
    assert!(CallLedger::can_user_edit_call(&pool.conn, call.id, u.id).unwrap());
}

#[test]
fn test_non_creator_cannot_edit() {
    let (mut pool, _) = open_db("policy_non_creator");
    let owner = add_member(&pool, "Jane", "Doe", "1111", false);
    let other = add_member(&pool, "Bob", "Adams", "2222", false);
    let call = filed_call(&mut pool, owner.id);

    let allowed =
        CallLedger::can_user_edit_call_at(&pool.conn, call.id, other.id, call.created_at).unwrap();
    assert!(!allowed);
}

#[test]
fn test_admin_override_follows_setting() {
    let (mut pool, _) = open_db("policy_admin");
    let owner = add_member(&pool, "Jane", "Doe", "1111", false);
    let chief = add_member(&pool, "Carl", "Chief", "9999", true);
    let call = filed_call(&mut pool, owner.id);
    let much_later = call.created_at + Duration::days(400);

    assert!(CallLedger::can_user_edit_call_at(&pool.conn, call.id, chief.id, much_later).unwrap());

    set_setting(&pool.conn, KEY_ADMIN_CAN_ALWAYS_EDIT, "false").unwrap();
    assert!(!CallLedger::can_user_edit_call_at(&pool.conn, call.id, chief.id, much_later).unwrap());
    let fresh = call.created_at;
    assert!(!CallLedger::can_user_edit_call_at(&pool.conn, call.id, chief.id, fresh).unwrap());

    set_setting(&pool.conn, KEY_ADMIN_CAN_ALWAYS_EDIT, "TRUE").unwrap();
    assert!(CallLedger::can_user_edit_call_at(&pool.conn, call.id, chief.id, much_later).unwrap());
}

#[test]
fn test_admin_creator_without_override_uses_window() {
    let (mut pool, _) = open_db("policy_admin_creator");
    let chief = add_member(&pool, "Carl", "Chief", "9999", true);
    let call = filed_call(&mut pool, chief.id);
    set_setting(&pool.conn, KEY_ADMIN_CAN_ALWAYS_EDIT, "no").unwrap();

    let fresh = call.created_at;
    assert!(CallLedger::can_user_edit_call_at(&pool.conn, call.id, chief.id, fresh).unwrap());
    assert!(
        !CallLedger::can_user_edit_call_at(
            &pool.conn,
            call.id,
            chief.id,
            call.created_at + Duration::minutes(31)
        )
        .unwrap()
    );
}

#[test]
fn test_custom_and_invalid_limits() {
    let (mut pool, _) = open_db("policy_limits");
    let u = add_member(&pool, "Jane", "Doe", "1111", false);
    let call = filed_call(&mut pool, u.id);
    let after = |m: i64| call.created_at + Duration::minutes(m);

    set_setting(&pool.conn, KEY_EDIT_TIME_LIMIT, "5").unwrap();
    assert!(CallLedger::can_user_edit_call_at(&pool.conn, call.id, u.id, after(5)).unwrap());
    assert!(!CallLedger::can_user_edit_call_at(&pool.conn, call.id, u.id, after(6)).unwrap());

    set_setting(&pool.conn, KEY_EDIT_TIME_LIMIT, "half an hour").unwrap();
    assert!(CallLedger::can_user_edit_call_at(&pool.conn, call.id, u.id, after(30)).unwrap());
    assert!(!CallLedger::can_user_edit_call_at(&pool.conn, call.id, u.id, after(31)).unwrap());

    pool.conn
        .execute("DELETE FROM settings WHERE key = ?1", [KEY_ADMIN_CAN_ALWAYS_EDIT])
        .unwrap();
    let policy = EditPolicy::load(&pool.conn).unwrap();
    assert!(!policy.admin_can_always_edit);
    assert_eq!(policy.edit_time_limit, Duration::minutes(30));
}

#[test]
fn test_parse_time_limit_fallbacks() {
    assert_eq!(parse_time_limit(Some("45")), 45);
    assert_eq!(parse_time_limit(Some(" 10 ")), 10);
    assert_eq!(parse_time_limit(Some("")), 30);
    assert_eq!(parse_time_limit(Some("abc")), 30);
    assert_eq!(parse_time_limit(Some("0")), 30);
    assert_eq!(parse_time_limit(Some("-5")), 30);
    assert_eq!(parse_time_limit(None), 30);
}

#[test]
fn test_unknown_call_or_user() {
    let (mut pool, _) = open_db("policy_unknown");
    let u = add_member(&pool, "Jane", "Doe", "1111", false);
    let call = filed_call(&mut pool, u.id);

    assert!(CallLedger::can_user_edit_call(&pool.conn, 9_999, u.id).unwrap_err().is_not_found());
    assert!(CallLedger::can_user_edit_call(&pool.conn, call.id, 9_999).unwrap_err().is_not_found());
}
