use crate::errors::{AppError, AppResult};
use crate::models::audit::{AuditAction, AuditEntry};
use crate::utils::time::{now_utc, utc_from_db, utc_to_db};
use rusqlite::{Connection, Row, params};
use serde::Serialize;

/// Write an internal log line into the `log` table.
pub fn ttlog(conn: &Connection, operation: &str, target: &str, message: &str) -> AppResult<()> {
    let now = utc_to_db(&now_utc());

    let mut stmt = conn.prepare_cached(
        "INSERT INTO log (date, operation, target, message)
         VALUES (?1, ?2, ?3, ?4)",
    )?;

    stmt.execute(params![now, operation, target, message])?;

    Ok(())
}

/// Internal log rows, oldest first: (id, date, operation, target, message).
pub fn load_log(conn: &Connection) -> AppResult<Vec<(i64, String, String, String, String)>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, date, operation, COALESCE(target, ''), message FROM log ORDER BY id ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Append one `audit_log` row. `changes` is stored as a JSON snapshot.
///
/// Takes a plain connection so callers can pass a transaction and keep the
/// audit row inside the same unit of work as the change it describes.
pub fn record_audit<T: Serialize>(
    conn: &Connection,
    user_id: i64,
    action: AuditAction,
    table_name: &str,
    record_id: Option<i64>,
    changes: &T,
) -> rusqlite::Result<()> {
    let json = serde_json::to_string(changes)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    let mut stmt = conn.prepare_cached(
        "INSERT INTO audit_log (user_id, action, table_name, record_id, changes, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    stmt.execute(params![
        user_id,
        action.to_db_str(),
        table_name,
        record_id,
        json,
        utc_to_db(&now_utc()),
    ])?;
    Ok(())
}

fn map_audit_row(row: &Row) -> rusqlite::Result<AuditEntry> {
    let raw_ts: String = row.get("timestamp")?;
    let timestamp = utc_from_db(&raw_ts).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(AppError::InvalidDate(raw_ts.clone())),
        )
    })?;

    Ok(AuditEntry {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        action: row.get("action")?,
        table_name: row.get("table_name")?,
        record_id: row.get("record_id")?,
        changes: row.get("changes")?,
        timestamp,
    })
}

/// Audit trail, oldest first. Optionally narrowed to one table, or to one
/// record of that table.
pub fn load_audit(
    conn: &Connection,
    table_name: Option<&str>,
    record_id: Option<i64>,
) -> AppResult<Vec<AuditEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, action, table_name, record_id, changes, timestamp
         FROM audit_log
         WHERE (?1 IS NULL OR table_name = ?1)
           AND (?2 IS NULL OR record_id = ?2)
         ORDER BY id ASC",
    )?;

    let rows = stmt.query_map(params![table_name, record_id], map_audit_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
