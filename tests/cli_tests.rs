use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

mod common;
use common::{ADMIN_NAME, ADMIN_PIN, init_cli_db, rti, setup_test_db};

/// Init a DB and add a regular member "Jane Doe" / 4321 through the CLI
fn db_with_member(name: &str) -> String {
    let db_path = setup_test_db(name);
    init_cli_db(&db_path);

    rti()
        .args([
            "--db", &db_path, "--test", "--user", ADMIN_NAME, "--pin", ADMIN_PIN, "user", "add",
            "--first", "Jane", "--last", "Doe", "--new-pin", "4321",
        ])
        .assert()
        .success()
        .stdout(contains("Member Jane Doe added"));

    db_path
}

/// Id of a seeded apparatus entry, read straight from the file
fn apparatus_id(db_path: &str, value: &str) -> String {
    let conn = rusqlite::Connection::open(db_path).expect("open db");
    let id: i64 = conn
        .query_row(
            "SELECT id FROM picklists WHERE category = 'apparatus' AND value = ?1",
            [value],
            |row| row.get(0),
        )
        .expect("apparatus id");
    id.to_string()
}

fn add_call(db_path: &str, call_type: &str, town: &str) -> assert_cmd::assert::Assert {
    let engine = apparatus_id(db_path, "Engine 1");
    rti()
        .args([
            "--db",
            db_path,
            "--test",
            "--user",
            "Jane Doe",
            "--pin",
            "4321",
            "call",
            "add",
            "--type",
            call_type,
            "--address",
            "12 Main St",
            "--town",
            town,
            "--dispatched",
            "2026-03-01 10:00",
            "--apparatus",
            &engine,
            "--narrative",
            "Smoke showing on arrival.",
        ])
        .assert()
}

#[test]
fn test_init_creates_database() {
    let db_path = setup_test_db("cli_init");

    rti()
        .args(["--db", &db_path, "--test", "init"])
        .assert()
        .success()
        .stdout(contains("Database initialized"))
        .stderr(contains("break-glass admin").and(contains("break_glass.enabled: false")));

    assert!(std::path::Path::new(&db_path).exists());

    rti()
        .args(["--db", &db_path, "--test", "settings", "get", "edit_time_limit_minutes"])
        .assert()
        .success()
        .stdout(contains("30"));
}

#[test]
fn test_commands_refuse_uninitialized_database() {
    let db_path = setup_test_db("cli_uninitialized");

    rti()
        .args(["--db", &db_path, "--test", "call", "list"])
        .assert()
        .failure()
        .stderr(contains("fdcalllog init"));
}

#[test]
fn test_call_add_list_show() {
    let db_path = db_with_member("cli_call_add");

    add_call(&db_path, "Structure Fire", "Stamford")
        .success()
        .stdout(contains("Call 2026-001 saved"));
    add_call(&db_path, "Medical Emergency", "Readsboro")
        .success()
        .stdout(contains("Call 2026-002 saved"));

    rti()
        .args(["--db", &db_path, "--test", "call", "list"])
        .assert()
        .success()
        .stdout(contains("2026-001").and(contains("2026-002")));

    rti()
        .args(["--db", &db_path, "--test", "call", "show", "1"])
        .assert()
        .success()
        .stdout(
            contains("Structure Fire")
                .and(contains("Engine 1"))
                .and(contains("Smoke showing on arrival.")),
        );

    rti()
        .args(["--db", &db_path, "--test", "call", "next-number", "--year", "2026"])
        .assert()
        .success()
        .stdout(contains("2026-003"));
}

#[test]
fn test_call_add_requires_login() {
    let db_path = db_with_member("cli_call_login");

    rti()
        .args([
            "--db", &db_path, "--test", "call", "add", "--type", "Rescue", "--address", "1 Elm",
            "--dispatched", "2026-03-01 10:00",
        ])
        .assert()
        .failure()
        .stderr(contains("login required"));

    rti()
        .args([
            "--db", &db_path, "--test", "--user", "Jane Doe", "--pin", "0000", "call", "add",
            "--type", "Rescue", "--address", "1 Elm", "--dispatched", "2026-03-01 10:00",
        ])
        .assert()
        .failure()
        .stderr(contains("invalid name or PIN"));
}

#[test]
fn test_call_search_json_and_filters() {
    let db_path = db_with_member("cli_call_search");
    add_call(&db_path, "Structure Fire", "Stamford").success();
    add_call(&db_path, "Medical Emergency", "Stamford").success();

    let out = rti()
        .args([
            "--db", &db_path, "--test", "--json", "call", "search", "--type", "Structure Fire",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let calls: serde_json::Value = serde_json::from_slice(&out).expect("json output");
    let calls = calls.as_array().expect("array");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["incident_number"], "2026-001");

    rti()
        .args(["--db", &db_path, "--test", "call", "search", "--filter", "station=2"])
        .assert()
        .failure()
        .stderr(contains("Invalid search filter"));
}

#[test]
fn test_call_edit_within_window() {
    let db_path = db_with_member("cli_call_edit");
    add_call(&db_path, "Structure Fire", "Stamford").success();

    rti()
        .args([
            "--db", &db_path, "--test", "--user", "Jane Doe", "--pin", "4321", "call", "edit", "1",
            "--town", "Whitingham", "--responder", "2:Driver",
        ])
        .assert()
        .success()
        .stdout(contains("updated"));

    rti()
        .args(["--db", &db_path, "--test", "call", "show", "1"])
        .assert()
        .success()
        .stdout(
            contains("Whitingham")
                .and(contains("Jane Doe (Driver)"))
                .and(contains("Engine 1")),
        );
}

#[test]
fn test_member_cannot_change_settings() {
    let db_path = db_with_member("cli_settings_gate");

    rti()
        .args([
            "--db", &db_path, "--test", "--user", "Jane Doe", "--pin", "4321", "settings", "set",
            "edit_time_limit_minutes", "90",
        ])
        .assert()
        .failure()
        .stderr(contains("administrator privileges required"));

    rti()
        .args([
            "--db", &db_path, "--test", "--user", ADMIN_NAME, "--pin", ADMIN_PIN, "settings", "set",
            "edit_time_limit_minutes", "90",
        ])
        .assert()
        .success();

    rti()
        .args(["--db", &db_path, "--test", "audit", "--table", "settings"])
        .assert()
        .success()
        .stdout(contains("edit_time_limit_minutes"));
}

#[test]
fn test_picklist_and_log_output() {
    let db_path = db_with_member("cli_picklist_log");

    rti()
        .args(["--db", &db_path, "--test", "picklist", "list", "apparatus"])
        .assert()
        .success()
        .stdout(contains("Engine 1").and(contains("Tanker 1")));

    rti()
        .args(["--db", &db_path, "--test", "log"])
        .assert()
        .success()
        .stdout(contains("migration_applied").and(contains("init")));
}
