use crate::cli::parser::Cli;
use crate::config::Config;
use crate::db::initialize::init_db_logged;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::identity::IdentityDirectory;
use crate::ui::messages::{info, success, warning};

/// Handle the `init` command
///
/// This initializes:
///  - the config directory and file (skipped in test mode)
///  - the SQLite database with all pending migrations
///  - the default administrator, picklists and settings
pub fn handle(cli: &Cli) -> AppResult<()> {
    let cfg = Config::init_all(cli.db.clone(), cli.test)?;
    let db_path = cfg.database.clone();

    info(format!("Config file : {}", Config::config_file().display()));
    info(format!("Database    : {}", db_path));

    let pool = DbPool::with_busy_timeout(&db_path, cfg.busy_timeout_ms)?;
    init_db_logged(&pool.conn, &db_path)?;

    success(format!("Database initialized at {}", db_path));

    if IdentityDirectory::break_glass_shadows_user(&pool.conn, &cfg.break_glass)? {
        warning(format!(
            "'{}' logs in as the break-glass admin (id 0), which cannot file calls: \
             set break_glass.enabled: false in the config or change that member's PIN",
            cfg.break_glass.name
        ));
    }
    Ok(())
}
