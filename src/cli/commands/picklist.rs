use crate::cli::commands::{login, open_pool, print_json};
use crate::cli::parser::{Cli, PicklistCmd};
use crate::config::Config;
use crate::errors::AppResult;
use crate::picklists::Picklists;
use crate::ui::messages::{info, success};
use crate::utils::table::{Column, Table};

pub fn handle(cmd: &PicklistCmd, cli: &Cli, cfg: &Config) -> AppResult<()> {
    let pool = open_pool(cfg)?;
    let conn = &pool.conn;

    match cmd {
        PicklistCmd::List { category: None, .. } => {
            let categories = Picklists::categories(conn)?;
            if cli.json {
                return print_json(&categories);
            }
            for c in categories {
                println!("{}", c);
            }
        }

        PicklistCmd::List {
            category: Some(category),
            all,
        } => {
            let entries = if *all {
                Picklists::by_category_for_admin(conn, category)?
            } else {
                Picklists::by_category(conn, category)?
            };
            if cli.json {
                return print_json(&entries);
            }
            if entries.is_empty() {
                info(format!("No values in '{}'", category));
                return Ok(());
            }

            let mut table = Table::new(vec![
                Column::new("ID", 6),
                Column::new("Value", 32),
                Column::new("Order", 5),
                Column::new("Active", 6),
            ]);
            for e in entries {
                table.add_row(vec![
                    e.id.to_string(),
                    e.value,
                    e.sort_order.to_string(),
                    if e.active { "yes" } else { "no" }.to_string(),
                ]);
            }
            print!("{}", table.render());
        }

        PicklistCmd::Add {
            category,
            value,
            sort_order,
        } => {
            let entry = login(cli, cfg, conn)?.create_picklist(conn, category, value, *sort_order)?;
            if cli.json {
                return print_json(&entry);
            }
            success(format!("Added '{}' to {} (id {})", entry.value, entry.category, entry.id));
        }

        PicklistCmd::Disable { id } => {
            login(cli, cfg, conn)?.deactivate_picklist(conn, *id)?;
            success(format!("Picklist entry {} disabled", id));
        }
    }

    Ok(())
}
