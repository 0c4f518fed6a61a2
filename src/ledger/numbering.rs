//! Per-year incident numbers: `YYYY-NNN`.
//!
//! Numbers are derived from what is already stored: the highest 3-digit
//! suffix for the year plus one. The read is only race-free when it runs
//! inside a write-locked (`BEGIN IMMEDIATE`) transaction together with the
//! insert that uses it, which is how `CallLedger::create_call` calls it.

use rusqlite::Connection;

/// Length of a canonical number such as `2026-001`.
pub const INCIDENT_NUMBER_LEN: i64 = 8;

pub fn incident_prefix(year: i32) -> String {
    format!("{:04}-", year)
}

pub fn format_incident_number(year: i32, seq: i64) -> String {
    format!("{}{:03}", incident_prefix(year), seq)
}

/// Highest canonical sequence already used in `year`, or 0.
///
/// Only 8-character numbers count, so `2026-1000` and hand-typed oddities
/// like `2026-7b` never move the sequence.
pub fn max_sequence(conn: &Connection, year: i32) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(CAST(SUBSTR(incident_number, 6) AS INTEGER)), 0)
         FROM calls
         WHERE SUBSTR(incident_number, 1, 5) = ?1
           AND LENGTH(incident_number) = ?2",
        rusqlite::params![incident_prefix(year), INCIDENT_NUMBER_LEN],
        |row| row.get(0),
    )
}

pub fn next_incident_number(conn: &Connection, year: i32) -> rusqlite::Result<String> {
    Ok(format_incident_number(year, max_sequence(conn, year)? + 1))
}
