use chrono::NaiveDate;
use fdcalllog::errors::AppError;
use fdcalllog::identity::IdentityDirectory;
use fdcalllog::identity::break_glass::BreakGlass;

mod common;
use common::{ADMIN_NAME, ADMIN_PIN, add_member, count, open_db, seeded_admin};

#[test]
fn test_break_glass_login_is_virtual_admin() {
    let (pool, _) = open_db("identity_break_glass");

    let user = IdentityDirectory::authenticate_user(
        &pool.conn,
        ADMIN_NAME,
        ADMIN_PIN,
        &BreakGlass::default(),
    )
    .unwrap();
    assert_eq!(user.id, 0);
    assert!(user.is_admin);
    assert!(user.is_break_glass());
    assert!(IdentityDirectory::find_user_by_id(&pool.conn, 0).unwrap().is_none());
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM users WHERE id = 0"), 0);
}

#[test]
fn test_break_glass_disabled_falls_through_to_storage() {
    let (pool, _) = open_db("identity_break_glass_off");

    // the seeded administrator carries the same credential
    let stored = IdentityDirectory::authenticate_user(
        &pool.conn,
        ADMIN_NAME,
        ADMIN_PIN,
        &BreakGlass::disabled(),
    )
    .unwrap();
    assert_eq!(stored.id, seeded_admin(&pool).id);
    assert_ne!(stored.id, 0);

    let custom = BreakGlass {
        enabled: false,
        name: "Night Watch".to_string(),
        pin: "0000".to_string(),
    };
    let res = IdentityDirectory::authenticate_user(&pool.conn, "Night Watch", "0000", &custom);
    assert!(matches!(res, Err(AppError::NotFound(_))));

    let enabled = BreakGlass {
        enabled: true,
        ..custom
    };
    let user =
        IdentityDirectory::authenticate_user(&pool.conn, "Night Watch", "0000", &enabled).unwrap();
    assert_eq!(user.id, 0);
    assert_eq!(user.first_name, "Night");
    assert_eq!(user.last_name, "Watch");
}

#[test]
fn test_wrong_name_and_wrong_pin_look_the_same() {
    let (pool, _) = open_db("identity_uniform_errors");
    add_member(&pool, "Jane", "Doe", "4321", false);
    let bg = BreakGlass::disabled();

    let wrong_pin = IdentityDirectory::authenticate_user(&pool.conn, "Jane Doe", "0000", &bg)
        .unwrap_err()
        .to_string();
    let wrong_name = IdentityDirectory::authenticate_user(&pool.conn, "Jane Smith", "4321", &bg)
        .unwrap_err()
        .to_string();
    let wrong_case = IdentityDirectory::authenticate_user(&pool.conn, "jane doe", "4321", &bg)
        .unwrap_err()
        .to_string();

    assert_eq!(wrong_pin, wrong_name);
    assert_eq!(wrong_pin, wrong_case);

    let ok = IdentityDirectory::authenticate_user(&pool.conn, "Jane Doe", "4321", &bg).unwrap();
    assert_eq!(ok.full_name(), "Jane Doe");
}

#[test]
fn test_inactive_member_cannot_log_in() {
    let (pool, _) = open_db("identity_inactive");
    let u = add_member(&pool, "Jane", "Doe", "4321", false);

    IdentityDirectory::deactivate_user(&pool.conn, u.id).unwrap();
    let bg = BreakGlass::disabled();
    let res = IdentityDirectory::authenticate_user(&pool.conn, "Jane Doe", "4321", &bg);
    assert!(res.unwrap_err().is_not_found());

    let active = IdentityDirectory::active_users(&pool.conn).unwrap();
    assert!(active.iter().all(|x| x.id != u.id));
    let all = IdentityDirectory::all_users(&pool.conn).unwrap();
    assert!(all.iter().any(|x| x.id == u.id && !x.active));
}

#[test]
fn test_change_pin() {
    let (pool, _) = open_db("identity_change_pin");
    let u = add_member(&pool, "Jane", "Doe", "4321", false);
    let bg = BreakGlass::disabled();

    IdentityDirectory::change_pin(&pool.conn, u.id, "8765").unwrap();
    assert!(IdentityDirectory::authenticate_user(&pool.conn, "Jane Doe", "4321", &bg).is_err());
    assert!(IdentityDirectory::authenticate_user(&pool.conn, "Jane Doe", "8765", &bg).is_ok());

    let zero = IdentityDirectory::change_pin(&pool.conn, 0, "1111");
    assert!(matches!(zero, Err(AppError::Unauthorized(_))));

    let missing = IdentityDirectory::change_pin(&pool.conn, 9_999, "1111");
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[test]
fn test_profile_mutators() {
    let (pool, _) = open_db("identity_mutators");
    let u = add_member(&pool, "Jane", "Doe", "4321", false);

    IdentityDirectory::update_position(&pool.conn, u.id, "Captain").unwrap();
    IdentityDirectory::update_admin_status(&pool.conn, u.id, true).unwrap();
    let joined = NaiveDate::from_ymd_opt(2019, 6, 1).unwrap();
    IdentityDirectory::update_join_date(&pool.conn, u.id, Some(joined)).unwrap();

    let stored = IdentityDirectory::get_user_by_id(&pool.conn, u.id).unwrap();
    assert_eq!(stored.position, "Captain");
    assert!(stored.is_admin);
    assert_eq!(stored.joined_date, Some(joined));
    assert_eq!(stored.pin, "4321");
    assert!(IdentityDirectory::validate_admin_pin(&pool.conn, "4321").unwrap());

    let mut edited = stored.clone();
    edited.last_name = "Doe-Smith".to_string();
    edited.pin = "ignored".to_string();
    IdentityDirectory::update_user(&pool.conn, &edited).unwrap();
    let stored = IdentityDirectory::get_user_by_id(&pool.conn, u.id).unwrap();
    assert_eq!(stored.last_name, "Doe-Smith");
    assert_eq!(stored.pin, "4321");

    IdentityDirectory::update_join_date(&pool.conn, u.id, None).unwrap();
    assert_eq!(IdentityDirectory::get_user_by_id(&pool.conn, u.id).unwrap().joined_date, None);

    let missing = IdentityDirectory::update_position(&pool.conn, 9_999, "Chief");
    assert!(missing.unwrap_err().is_not_found());
    assert!(!IdentityDirectory::validate_admin_pin(&pool.conn, "0000").unwrap());
}

#[test]
fn test_break_glass_shadowing_seeded_admin() {
    let (pool, _) = open_db("identity_shadowing");
    let admin = seeded_admin(&pool);

    let shadows = |bg: BreakGlass| {
        IdentityDirectory::break_glass_shadows_user(&pool.conn, &bg).unwrap()
    };
    assert!(shadows(BreakGlass::default()));
    assert!(!shadows(BreakGlass::disabled()));

    IdentityDirectory::change_pin(&pool.conn, admin.id, "8080").unwrap();
    assert!(!shadows(BreakGlass::default()));
}
