//! Subcommand handlers plus the plumbing they share: opening the database
//! with the configured lock timeout, logging in from `--user`/`--pin`, and
//! JSON output.

pub mod audit;
pub mod call;
pub mod config;
pub mod db;
pub mod init;
pub mod log;
pub mod picklist;
pub mod settings;
pub mod user;

use crate::cli::parser::Cli;
use crate::config::Config;
use crate::core::session::Session;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use rusqlite::Connection;
use serde::Serialize;

/// Open the configured database. Refuses a file that `init` never touched,
/// so a typo in `--db` does not silently create an empty database.
pub fn open_pool(cfg: &Config) -> AppResult<DbPool> {
    if !std::path::Path::new(&cfg.database).exists() {
        return Err(AppError::Config(format!(
            "database {} not found, run `fdcalllog init` first",
            cfg.database
        )));
    }

    let pool = DbPool::with_busy_timeout(&cfg.database, cfg.busy_timeout_ms)?;

    let initialized: bool = pool.conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'calls')",
        [],
        |row| row.get(0),
    )?;
    if !initialized {
        return Err(AppError::Config(format!(
            "database {} is not initialized, run `fdcalllog init` first",
            cfg.database
        )));
    }

    Ok(pool)
}

/// Log in with the global `--user` / `--pin` flags.
pub fn login(cli: &Cli, cfg: &Config, conn: &Connection) -> AppResult<Session> {
    let (Some(name), Some(pin)) = (cli.user.as_deref(), cli.pin.as_deref()) else {
        return Err(AppError::Unauthorized(
            "login required: pass --user \"First Last\" and --pin".to_string(),
        ));
    };

    let mut session = Session::new();
    session
        .login(conn, name, pin, &cfg.break_glass)
        .map_err(|e| {
            if e.is_not_found() {
                AppError::Unauthorized("invalid name or PIN".to_string())
            } else {
                e
            }
        })?;
    Ok(session)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> AppResult<()> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Other(format!("JSON encoding failed: {}", e)))?;
    println!("{}", out);
    Ok(())
}

/// 1-based page number to a row offset.
pub fn page_offset(page: i64, limit: i64) -> AppResult<i64> {
    if page < 1 || limit < 1 {
        return Err(AppError::InvalidInput(
            "--page and --limit must be at least 1".to_string(),
        ));
    }
    Ok((page - 1) * limit)
}
