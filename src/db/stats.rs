use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ledger::CallLedger;
use crate::ui::messages::field;
use rusqlite::OptionalExtension;
use std::fs;

const LABEL_W: usize = 16;

fn count(pool: &DbPool, sql: &str) -> rusqlite::Result<i64> {
    pool.conn.query_row(sql, [], |row| row.get(0))
}

pub fn print_db_info(pool: &DbPool, db_path: &str) -> AppResult<()> {
    println!();

    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_mb = (file_size as f64) / (1024.0 * 1024.0);

    field("File", db_path, LABEL_W);
    field("Size", format!("{:.2} MB", file_mb), LABEL_W);
    field("Calls", count(pool, "SELECT COUNT(*) FROM calls")?, LABEL_W);
    field(
        "Active members",
        count(pool, "SELECT COUNT(*) FROM users WHERE active = 1")?,
        LABEL_W,
    );
    field("Audit entries", count(pool, "SELECT COUNT(*) FROM audit_log")?, LABEL_W);

    let last_number: Option<String> = pool
        .conn
        .query_row(
            "SELECT incident_number FROM calls ORDER BY created_at DESC, id DESC LIMIT 1",
            [],
            |row| row.get::<_, Option<String>>(0),
        )
        .optional()?
        .flatten();
    field("Last incident", last_number.unwrap_or_else(|| "--".to_string()), LABEL_W);

    let years = CallLedger::call_years(&pool.conn)?;
    if let (Some(last), Some(first)) = (years.first(), years.last()) {
        field("Years", format!("{} – {}", first, last), LABEL_W);
    }

    println!();
    Ok(())
}
