use crate::cli::commands::{open_pool, print_json};
use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::db::log::load_audit;
use crate::errors::AppResult;
use crate::ui::messages::info;
use crate::utils::table::{Column, Table};

pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    if let Commands::Audit { table, record } = &cli.command {
        let pool = open_pool(cfg)?;
        let entries = load_audit(&pool.conn, table.as_deref(), *record)?;

        if cli.json {
            return print_json(&entries);
        }
        if entries.is_empty() {
            info("No audit entries");
            return Ok(());
        }

        let mut out = Table::new(vec![
            Column::new("ID", 6),
            Column::new("When (UTC)", 19),
            Column::new("User", 6),
            Column::new("Action", 6),
            Column::new("Table", 10),
            Column::new("Record", 6),
            Column::new("Changes", 60),
        ]);
        for e in entries {
            out.add_row(vec![
                e.id.to_string(),
                e.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                e.user_id.to_string(),
                e.action,
                e.table_name,
                e.record_id.map(|r| r.to_string()).unwrap_or_default(),
                e.changes,
            ]);
        }
        print!("{}", out.render());
    }

    Ok(())
}
