use fdcalllog::db::initialize::init_db;
use fdcalllog::db::migrate::applied_versions;
use fdcalllog::db::pool::DbPool;
use fdcalllog::identity::IdentityDirectory;
use fdcalllog::identity::break_glass::BreakGlass;

mod common;
use common::{count, setup_test_db};

/// A users table from before the admin flag: `role` instead of `is_admin`,
/// no EMS level and no join date.
fn legacy_db(name: &str) -> DbPool {
    let db_path = setup_test_db(name);
    let pool = DbPool::new(&db_path).expect("open db");
    pool.conn
        .execute_batch(
            r#"
            CREATE TABLE users (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name TEXT NOT NULL,
                last_name  TEXT NOT NULL,
                position   TEXT NOT NULL DEFAULT 'Member',
                role       TEXT NOT NULL DEFAULT 'member',
                pin        TEXT,
                active     INTEGER NOT NULL DEFAULT 1,
                created    TEXT NOT NULL
            );
            INSERT INTO users (first_name, last_name, position, role, pin, created)
                VALUES ('Carl', 'Chief', 'Chief', 'admin', '9999', '2024-01-15 08:00:00');
            INSERT INTO users (first_name, last_name, position, role, pin, created)
                VALUES ('Jane', 'Doe', 'Member', 'member', '4321', '2024-02-01 19:30:00');
            "#,
        )
        .expect("legacy schema");
    pool
}

#[test]
fn test_legacy_role_column_becomes_admin_flag() {
    let pool = legacy_db("migrate_legacy_role");

    init_db(&pool.conn).expect("init legacy db");

    let bg = BreakGlass::disabled();
    let chief =
        IdentityDirectory::authenticate_user(&pool.conn, "Carl Chief", "9999", &bg).unwrap();
    assert!(chief.is_admin);
    assert_eq!(chief.joined_date, None);
    assert_eq!(chief.ems_level, "");

    let jane = IdentityDirectory::authenticate_user(&pool.conn, "Jane Doe", "4321", &bg).unwrap();
    assert!(!jane.is_admin);

    // an admin already exists, so no default administrator is seeded
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM users"), 2);
}

#[test]
fn test_legacy_migration_runs_once() {
    let pool = legacy_db("migrate_legacy_once");

    init_db(&pool.conn).expect("first init");
    init_db(&pool.conn).expect("second init");

    let versions = applied_versions(&pool.conn).unwrap();
    assert_eq!(versions.len(), 3);
    let logged = count(&pool, "SELECT COUNT(*) FROM log WHERE operation = 'migration_applied'");
    assert_eq!(logged, 3);
}
