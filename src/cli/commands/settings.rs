use crate::cli::commands::{login, open_pool, print_json};
use crate::cli::parser::{Cli, SettingsCmd};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::settings::{all_settings, get_setting};
use crate::ui::messages::success;
use crate::utils::table::{Column, Table};

pub fn handle(cmd: &SettingsCmd, cli: &Cli, cfg: &Config) -> AppResult<()> {
    let pool = open_pool(cfg)?;
    let conn = &pool.conn;

    match cmd {
        SettingsCmd::List => {
            let rows = all_settings(conn)?;
            if cli.json {
                let map: serde_json::Map<String, serde_json::Value> = rows
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::String(v)))
                    .collect();
                return print_json(&map);
            }

            let mut table = Table::new(vec![Column::new("Key", 32), Column::new("Value", 40)]);
            for (k, v) in rows {
                table.add_row(vec![k, v]);
            }
            print!("{}", table.render());
        }

        SettingsCmd::Get { key } => {
            let value = get_setting(conn, key)?
                .ok_or_else(|| AppError::NotFound(format!("setting '{}'", key)))?;
            println!("{}", value);
        }

        SettingsCmd::Set { key, value } => {
            login(cli, cfg, conn)?.set_setting(conn, key, value)?;
            success(format!("{} = {}", key, value));
        }
    }

    Ok(())
}
