//! Identity directory: department members, their PINs and admin flags.
//!
//! This module answers "who is this caller and are they an admin?". It
//! holds no authorization logic of its own; gating of the mutators lives in
//! `core::session`.

pub mod break_glass;

use crate::errors::{AppError, AppResult};
use crate::models::user::{BREAK_GLASS_USER_ID, NewUser, User};
use crate::utils::time::{now_utc, parse_date, utc_from_db, utc_to_db};
use break_glass::BreakGlass;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Column list shared by every user query. The PIN is selected separately
/// where it is needed.
const USER_COLUMNS: &str =
    "id, first_name, last_name, position, ems_level, is_admin, active, joined_date, created";

pub(crate) fn map_user_row(row: &Row) -> rusqlite::Result<User> {
    let created_str: String = row.get("created")?;
    let created = utc_from_db(&created_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(AppError::InvalidDate(created_str.clone())),
        )
    })?;

    let joined: Option<String> = row.get("joined_date")?;
    let joined_date = joined.as_deref().and_then(parse_date);

    Ok(User {
        id: row.get("id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        position: row.get("position")?,
        ems_level: row.get::<_, Option<String>>("ems_level")?.unwrap_or_default(),
        is_admin: row.get("is_admin")?,
        pin: String::new(),
        active: row.get("active")?,
        joined_date,
        created,
    })
}

fn map_user_row_with_pin(row: &Row) -> rusqlite::Result<User> {
    let mut user = map_user_row(row)?;
    user.pin = row.get::<_, Option<String>>("pin")?.unwrap_or_default();
    Ok(user)
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("user {}", id))
}

/// Fail with NotFound when an UPDATE touched nothing.
fn expect_one(changed: usize, id: i64) -> AppResult<()> {
    if changed == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

pub struct IdentityDirectory;

impl IdentityDirectory {
    /// Check a login.
    ///
    /// The break-glass credential is tried first. Otherwise the full name
    /// (`first || ' ' || last`, case-sensitive), the PIN and `active = 1`
    /// must all match. Every mismatch gives the same error, so a caller
    /// cannot tell an unknown name from a wrong PIN.
    pub fn authenticate_user(
        conn: &Connection,
        full_name: &str,
        pin: &str,
        break_glass: &BreakGlass,
    ) -> AppResult<User> {
        if break_glass.matches(full_name, pin) {
            return Ok(break_glass.identity());
        }

        let sql = format!(
            "SELECT {USER_COLUMNS}, pin FROM users
             WHERE (first_name || ' ' || last_name) = ?1 AND pin = ?2 AND active = 1"
        );
        let user = conn
            .query_row(&sql, params![full_name, pin], map_user_row_with_pin)
            .optional()?;

        user.ok_or_else(|| AppError::NotFound("invalid name or PIN".to_string()))
    }

    /// True when the enabled break-glass credential also matches a stored,
    /// active member. That member can then never log in as themselves.
    pub fn break_glass_shadows_user(
        conn: &Connection,
        break_glass: &BreakGlass,
    ) -> AppResult<bool> {
        if !break_glass.enabled {
            return Ok(false);
        }
        match Self::authenticate_user(
            conn,
            &break_glass.name,
            &break_glass.pin,
            &BreakGlass::disabled(),
        ) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn find_user_by_id(conn: &Connection, id: i64) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS}, pin FROM users WHERE id = ?1");
        let user = conn
            .query_row(&sql, [id], map_user_row_with_pin)
            .optional()?;
        Ok(user)
    }

    /// Stored user by id, PIN included. The break-glass id is never stored,
    /// so it is not found here.
    pub fn get_user_by_id(conn: &Connection, id: i64) -> AppResult<User> {
        Self::find_user_by_id(conn, id)?.ok_or_else(|| not_found(id))
    }

    fn list(conn: &Connection, filter: &str) -> AppResult<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users {filter} ORDER BY last_name, first_name"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], map_user_row)?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    /// Active members, e.g. for a login picker. PINs are not loaded.
    pub fn active_users(conn: &Connection) -> AppResult<Vec<User>> {
        Self::list(conn, "WHERE active = 1")
    }

    /// Everyone, including deactivated members.
    pub fn all_users(conn: &Connection) -> AppResult<Vec<User>> {
        Self::list(conn, "")
    }

    pub fn admin_users(conn: &Connection) -> AppResult<Vec<User>> {
        Self::list(conn, "WHERE is_admin = 1 AND active = 1")
    }

    pub fn create_user(conn: &Connection, new_user: &NewUser) -> AppResult<User> {
        conn.execute(
            "INSERT INTO users (first_name, last_name, position, ems_level, is_admin, pin, active, created)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)",
            params![
                new_user.first_name,
                new_user.last_name,
                new_user.position,
                new_user.ems_level,
                new_user.is_admin,
                new_user.pin,
                utc_to_db(&now_utc()),
            ],
        )?;

        Self::get_user_by_id(conn, conn.last_insert_rowid())
    }

    /// Overwrite the profile fields of a member. The PIN is left alone;
    /// `change_pin` is the only way to set it.
    pub fn update_user(conn: &Connection, user: &User) -> AppResult<()> {
        let changed = conn.execute(
            "UPDATE users
             SET first_name = ?1, last_name = ?2, position = ?3, ems_level = ?4,
                 is_admin = ?5, active = ?6, joined_date = ?7
             WHERE id = ?8",
            params![
                user.first_name,
                user.last_name,
                user.position,
                user.ems_level,
                user.is_admin,
                user.active,
                user.joined_date.map(|d| d.format("%Y-%m-%d").to_string()),
                user.id,
            ],
        )?;
        expect_one(changed, user.id)
    }

    /// Soft delete. Historical calls keep referencing the row.
    pub fn deactivate_user(conn: &Connection, id: i64) -> AppResult<()> {
        let changed = conn.execute("UPDATE users SET active = 0 WHERE id = ?1", [id])?;
        expect_one(changed, id)
    }

    /// Overwrite a PIN. The caller has already checked who is asking.
    pub fn change_pin(conn: &Connection, id: i64, new_pin: &str) -> AppResult<()> {
        if id == BREAK_GLASS_USER_ID {
            return Err(AppError::Unauthorized(
                "the break-glass PIN cannot be changed".to_string(),
            ));
        }

        let changed = conn.execute(
            "UPDATE users SET pin = ?1 WHERE id = ?2",
            params![new_pin, id],
        )?;
        expect_one(changed, id)
    }

    pub fn update_position(conn: &Connection, id: i64, position: &str) -> AppResult<()> {
        let changed = conn.execute(
            "UPDATE users SET position = ?1 WHERE id = ?2",
            params![position, id],
        )?;
        expect_one(changed, id)
    }

    pub fn update_admin_status(conn: &Connection, id: i64, is_admin: bool) -> AppResult<()> {
        let changed = conn.execute(
            "UPDATE users SET is_admin = ?1 WHERE id = ?2",
            params![is_admin, id],
        )?;
        expect_one(changed, id)
    }

    pub fn update_join_date(
        conn: &Connection,
        id: i64,
        joined: Option<NaiveDate>,
    ) -> AppResult<()> {
        let changed = conn.execute(
            "UPDATE users SET joined_date = ?1 WHERE id = ?2",
            params![joined.map(|d| d.format("%Y-%m-%d").to_string()), id],
        )?;
        expect_one(changed, id)
    }

    /// True if some active administrator uses this PIN.
    pub fn validate_admin_pin(conn: &Connection, pin: &str) -> AppResult<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE is_admin = 1 AND pin = ?1 AND active = 1",
            [pin],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
