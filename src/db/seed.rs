//! Default rows for a fresh database. Every insert is `OR IGNORE`, so
//! re-running never clobbers what an administrator changed.

use crate::db::log::ttlog;
use crate::errors::AppResult;
use crate::utils::time::{now_utc, utc_to_db};
use rusqlite::{Connection, params};

pub const DEFAULT_ADMIN_FIRST: &str = "Admin";
pub const DEFAULT_ADMIN_LAST: &str = "User";
pub const DEFAULT_ADMIN_PIN: &str = "1234";

const PICKLISTS: &[(&str, &[&str])] = &[
    (
        "call_type",
        &[
            "Structure Fire",
            "Vehicle Fire",
            "Grass Fire",
            "Medical Emergency",
            "Motor Vehicle Accident",
            "Hazmat",
            "Rescue",
            "Alarm Investigation",
            "Mutual Aid",
            "Training",
        ],
    ),
    ("mutual_aid", &["No", "Yes"]),
    (
        "mutual_aid_agencies",
        &[
            "Readsboro Fire Dept",
            "Bennington Fire Dept",
            "Pownal Fire Dept",
            "Wilmington Fire Dept",
            "Searsburg Fire Dept",
        ],
    ),
    (
        "apparatus",
        &[
            "Engine 1",
            "Engine 2",
            "Truck 1",
            "Rescue 1",
            "Ambulance 1",
            "Chief",
            "Tanker 1",
        ],
    ),
    ("town", &["Stamford", "Readsboro", "Whitingham"]),
    (
        "responder_role",
        &["Driver", "Officer", "Firefighter", "EMT", "Medic", "Chief"],
    ),
    (
        "position",
        &["Chief", "Deputy Chief", "Captain", "Member", "Probationary"],
    ),
    (
        "ems_level",
        &["None", "VEFR", "EMR", "EMT", "AEMT", "Paramedic"],
    ),
];

const SETTINGS: &[(&str, &str)] = &[
    ("report_dir", "reports"),
    ("auto_print_after_save", "false"),
    ("edit_time_limit_minutes", "30"),
    ("admin_can_always_edit", "true"),
    ("default_date_range_days", "30"),
];

pub fn seed_defaults(conn: &Connection) -> AppResult<()> {
    let tx = conn.unchecked_transaction()?;

    let admin_created = ensure_admin_exists(&tx)?;
    let picklists_seeded = seed_picklists(&tx)?;
    seed_settings(&tx)?;

    tx.commit()?;

    if admin_created {
        ttlog(
            conn,
            "seed",
            "users",
            "Created default administrator 'Admin User'",
        )?;
    }
    if picklists_seeded {
        ttlog(conn, "seed", "picklists", "Seeded default picklists")?;
    }

    Ok(())
}

/// Make sure at least one administrator can log in. Returns true when the
/// default admin row had to be created.
fn ensure_admin_exists(conn: &Connection) -> AppResult<bool> {
    let admin_exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE is_admin = 1)",
        [],
        |row| row.get(0),
    )?;

    if !admin_exists {
        conn.execute(
            "INSERT INTO users (first_name, last_name, position, ems_level, is_admin, pin, active, created)
             VALUES (?1, ?2, 'administrator', 'None', 1, ?3, 1, ?4)",
            params![
                DEFAULT_ADMIN_FIRST,
                DEFAULT_ADMIN_LAST,
                DEFAULT_ADMIN_PIN,
                utc_to_db(&now_utc())
            ],
        )?;
        return Ok(true);
    }

    // A default admin left without a PIN could never log in again.
    conn.execute(
        "UPDATE users SET pin = ?1
         WHERE first_name = ?2 AND last_name = ?3 AND is_admin = 1
           AND (pin IS NULL OR pin = '')",
        params![DEFAULT_ADMIN_PIN, DEFAULT_ADMIN_FIRST, DEFAULT_ADMIN_LAST],
    )?;

    Ok(false)
}

/// Seed picklists only into an empty table; returns true if it did.
fn seed_picklists(conn: &Connection) -> AppResult<bool> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM picklists", [], |row| row.get(0))?;
    if count > 0 {
        return Ok(false);
    }

    let mut stmt = conn.prepare_cached(
        "INSERT OR IGNORE INTO picklists (category, value, sort_order, active)
         VALUES (?1, ?2, ?3, 1)",
    )?;

    for (category, values) in PICKLISTS {
        for (i, value) in values.iter().enumerate() {
            stmt.execute(params![category, value, (i + 1) as i64])?;
        }
    }

    Ok(true)
}

fn seed_settings(conn: &Connection) -> AppResult<()> {
    let mut stmt =
        conn.prepare_cached("INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)")?;

    for (key, value) in SETTINGS {
        stmt.execute(params![key, value])?;
    }
    Ok(())
}
