#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::NaiveDateTime;
use fdcalllog::db::initialize::init_db;
use fdcalllog::db::pool::DbPool;
use fdcalllog::identity::IdentityDirectory;
use fdcalllog::models::call::Call;
use fdcalllog::models::user::{NewUser, User};
use std::env;
use std::fs;
use std::path::PathBuf;

pub const ADMIN_NAME: &str = "Admin User";
pub const ADMIN_PIN: &str = "1234";

pub fn rti() -> Command {
    cargo_bin_cmd!("fdcalllog")
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_fdcalllog.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Initialize a DB through the CLI, the way a user would
pub fn init_cli_db(db_path: &str) {
    rti()
        .args(["--db", db_path, "--test", "init"])
        .assert()
        .success();
}

/// Open a fresh file database with schema and seed data
pub fn open_db(name: &str) -> (DbPool, String) {
    let db_path = setup_test_db(name);
    let pool = DbPool::new(&db_path).expect("open db");
    init_db(&pool.conn).expect("init db");
    (pool, db_path)
}

/// The administrator row created by seeding
pub fn seeded_admin(pool: &DbPool) -> User {
    let admins = IdentityDirectory::admin_users(&pool.conn).expect("admins");
    admins.into_iter().next().expect("seeded admin")
}

pub fn add_member(pool: &DbPool, first: &str, last: &str, pin: &str, is_admin: bool) -> User {
    IdentityDirectory::create_user(
        &pool.conn,
        &NewUser {
            first_name: first.to_string(),
            last_name: last.to_string(),
            position: "Member".to_string(),
            ems_level: "EMT".to_string(),
            pin: pin.to_string(),
            is_admin,
        },
    )
    .expect("create user")
}

pub fn wall(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").expect("wall time")
}

pub fn sample_call(created_by: i64, dispatched: &str, call_type: &str, town: &str) -> Call {
    Call {
        call_type: call_type.to_string(),
        mutual_aid: "No".to_string(),
        address: "12 Main St".to_string(),
        town: town.to_string(),
        dispatched: wall(dispatched),
        narrative: "Crew responded.".to_string(),
        created_by,
        ..Call::default()
    }
}

/// Id of a seeded picklist value
pub fn picklist_id(pool: &DbPool, category: &str, value: &str) -> i64 {
    pool.conn
        .query_row(
            "SELECT id FROM picklists WHERE category = ?1 AND value = ?2",
            [category, value],
            |row| row.get(0),
        )
        .expect("picklist id")
}

pub fn count(pool: &DbPool, sql: &str) -> i64 {
    pool.conn.query_row(sql, [], |row| row.get(0)).expect("count")
}
