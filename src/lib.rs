//! fdcalllog library root.
//! Exposes the call ledger, the identity directory, the CLI parser and the
//! high-level run() function.

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod identity;
pub mod ledger;
pub mod models;
pub mod picklists;
pub mod settings;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Init => cli::commands::init::handle(cli),
        Commands::Config { .. } => cli::commands::config::handle(&cli.command, cfg),
        Commands::Db { .. } => cli::commands::db::handle(&cli.command, cfg),
        Commands::Call { action } => cli::commands::call::handle(action, cli, cfg),
        Commands::User { action } => cli::commands::user::handle(action, cli, cfg),
        Commands::Picklist { action } => cli::commands::picklist::handle(action, cli, cfg),
        Commands::Settings { action } => cli::commands::settings::handle(action, cli, cfg),
        Commands::Log => cli::commands::log::handle(cli, cfg),
        Commands::Audit { .. } => cli::commands::audit::handle(cli, cfg),
    }
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();

    // test mode never reads the user's configuration file
    let mut cfg = if cli.test {
        Config::default()
    } else {
        Config::load()?
    };

    if let Some(custom_db) = &cli.db {
        cfg.database = utils::path::expand_tilde(custom_db)
            .to_string_lossy()
            .to_string();
    }

    dispatch(&cli, &cfg)
}
