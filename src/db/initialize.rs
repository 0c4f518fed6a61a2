use crate::db::log;
use crate::db::migrate::run_pending_migrations;
use crate::db::seed::seed_defaults;
use crate::errors::AppResult;
use rusqlite::Connection;

/// Initialize the database.
/// Schema comes from the migration engine; defaults (admin member,
/// picklists, settings) are seeded afterwards and never overwrite edits.
pub fn init_db(conn: &Connection) -> AppResult<()> {
    run_pending_migrations(conn)?;
    seed_defaults(conn)?;
    Ok(())
}

/// Like `init_db`, but also records the bootstrap in the internal log.
/// A failing log write is reported, not fatal.
pub fn init_db_logged(conn: &Connection, db_path: &str) -> AppResult<()> {
    init_db(conn)?;

    if let Err(e) = log::ttlog(
        conn,
        "init",
        "Database initialized",
        &format!("Database initialized at {}", db_path),
    ) {
        crate::ui::messages::warning(format!("Failed to write internal log: {}", e));
    }

    Ok(())
}
