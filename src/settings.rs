//! Flat key → string settings store and the edit policy derived from it.

use crate::errors::AppResult;
use chrono::Duration;
use rusqlite::{Connection, OptionalExtension, params};

pub const KEY_EDIT_TIME_LIMIT: &str = "edit_time_limit_minutes";
pub const KEY_ADMIN_CAN_ALWAYS_EDIT: &str = "admin_can_always_edit";

pub const DEFAULT_EDIT_TIME_LIMIT_MINUTES: i64 = 30;

pub fn get_setting(conn: &Connection, key: &str) -> AppResult<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            [key],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(value)
}

/// Insert or overwrite one setting.
pub fn set_setting(conn: &Connection, key: &str, value: &str) -> AppResult<()> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// All settings ordered by key.
pub fn all_settings(conn: &Connection) -> AppResult<Vec<(String, String)>> {
    let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key ASC")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Who may edit a call, and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditPolicy {
    pub edit_time_limit: Duration,
    pub admin_can_always_edit: bool,
}

impl EditPolicy {
    /// Read the policy from the settings table. Read fresh on every check.
    pub fn load(conn: &Connection) -> AppResult<Self> {
        let limit = get_setting(conn, KEY_EDIT_TIME_LIMIT)?;
        let admin = get_setting(conn, KEY_ADMIN_CAN_ALWAYS_EDIT)?;

        Ok(Self {
            edit_time_limit: Duration::minutes(parse_time_limit(limit.as_deref())),
            admin_can_always_edit: admin
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}

/// Minutes from the stored value. Missing, empty, non-numeric or
/// non-positive values fall back to the default.
pub fn parse_time_limit(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|m| *m > 0)
        .unwrap_or(DEFAULT_EDIT_TIME_LIMIT_MINUTES)
}
