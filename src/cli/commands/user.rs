use crate::cli::commands::{login, open_pool, print_json};
use crate::cli::parser::{Cli, UserCmd};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::identity::IdentityDirectory;
use crate::models::user::{NewUser, User};
use crate::ui::messages::{info, success};
use crate::utils::table::{Column, Table};
use crate::utils::time::parse_date;

pub fn handle(cmd: &UserCmd, cli: &Cli, cfg: &Config) -> AppResult<()> {
    let pool = open_pool(cfg)?;
    let conn = &pool.conn;

    match cmd {
        UserCmd::List { all, admins } => {
            let users = if *admins {
                IdentityDirectory::admin_users(conn)?
            } else if *all {
                IdentityDirectory::all_users(conn)?
            } else {
                IdentityDirectory::active_users(conn)?
            };
            print_users(&users, cli.json)?;
        }

        UserCmd::Add {
            first,
            last,
            position,
            ems_level,
            new_pin,
            admin,
        } => {
            let session = login(cli, cfg, conn)?;
            let user = session.create_user(
                conn,
                &NewUser {
                    first_name: first.clone(),
                    last_name: last.clone(),
                    position: position.clone(),
                    ems_level: ems_level.clone(),
                    pin: new_pin.clone(),
                    is_admin: *admin,
                },
            )?;
            if cli.json {
                return print_json(&user.redacted());
            }
            success(format!("Member {} added (id {})", user.full_name(), user.id));
        }

        UserCmd::Pin { new_pin } => {
            let session = login(cli, cfg, conn)?;
            // --pin already carries the current PIN
            let current = cli.pin.as_deref().unwrap_or_default();
            session.change_own_pin(conn, current, new_pin)?;
            success("PIN changed");
        }

        UserCmd::SetPin { id, new_pin } => {
            login(cli, cfg, conn)?.change_user_pin(conn, *id, new_pin)?;
            success(format!("PIN for member {} changed", id));
        }

        UserCmd::Position { id, position } => {
            login(cli, cfg, conn)?.update_user_position(conn, *id, position)?;
            success(format!("Member {} is now {}", id, position));
        }

        UserCmd::Admin { id, revoke } => {
            login(cli, cfg, conn)?.update_user_admin_status(conn, *id, !*revoke)?;
            if *revoke {
                success(format!("Admin rights removed from member {}", id));
            } else {
                success(format!("Member {} is now an administrator", id));
            }
        }

        UserCmd::Joined { id, date } => {
            let joined = match date.as_deref() {
                Some(d) => Some(parse_date(d).ok_or_else(|| AppError::InvalidDate(d.to_string()))?),
                None => None,
            };
            login(cli, cfg, conn)?.update_user_join_date(conn, *id, joined)?;
            success(format!("Join date for member {} updated", id));
        }

        UserCmd::Deactivate { id } => {
            login(cli, cfg, conn)?.deactivate_user(conn, *id)?;
            success(format!("Member {} deactivated", id));
        }
    }

    Ok(())
}

fn print_users(users: &[User], json: bool) -> AppResult<()> {
    if json {
        return print_json(users);
    }
    if users.is_empty() {
        info("No members found");
        return Ok(());
    }

    let mut table = Table::new(vec![
        Column::new("ID", 6),
        Column::new("Name", 28),
        Column::new("Position", 16),
        Column::new("EMS", 10),
        Column::new("Admin", 5),
        Column::new("Active", 6),
        Column::new("Joined", 10),
    ]);
    for u in users {
        table.add_row(vec![
            u.id.to_string(),
            u.full_name(),
            u.position.clone(),
            u.ems_level.clone(),
            if u.is_admin { "yes" } else { "" }.to_string(),
            if u.active { "yes" } else { "no" }.to_string(),
            u.joined_date.map(|d| d.to_string()).unwrap_or_default(),
        ]);
    }
    print!("{}", table.render());
    Ok(())
}
