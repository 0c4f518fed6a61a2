use crate::errors::{AppError, AppResult};
use crate::ui::messages::success;
use rusqlite::{Connection, OptionalExtension, Result};

/// A schema step, identified by a sortable version string.
struct Migration {
    version: &'static str,
    description: &'static str,
    apply: fn(&Connection) -> Result<()>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "20250105_0001_core_schema",
        description: "Created users, picklists, calls, associations, settings and audit_log",
        apply: create_core_schema,
    },
    Migration {
        version: "20250212_0002_unique_incident_number",
        description: "Added unique index on calls.incident_number",
        apply: add_unique_incident_number,
    },
    Migration {
        version: "20250306_0003_legacy_role_to_admin_flag",
        description: "Copied legacy users.role = 'admin' into is_admin",
        apply: migrate_legacy_role_column,
    },
];

/// Ensure that the internal `log` table exists. Applied migrations are
/// recorded there, so it has to exist before anything else.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn create_core_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name  TEXT NOT NULL,
            last_name   TEXT NOT NULL,
            position    TEXT NOT NULL DEFAULT 'Member',
            ems_level   TEXT,
            is_admin    INTEGER NOT NULL DEFAULT 0,
            pin         TEXT,
            active      INTEGER NOT NULL DEFAULT 1,
            joined_date TEXT,                       -- YYYY-MM-DD
            created     TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS picklists (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            category   TEXT NOT NULL,
            value      TEXT NOT NULL,
            sort_order INTEGER NOT NULL DEFAULT 0,
            active     INTEGER NOT NULL DEFAULT 1,
            UNIQUE(category, value)
        );

        CREATE TABLE IF NOT EXISTS calls (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            incident_number TEXT,
            call_type       TEXT NOT NULL,
            mutual_aid      TEXT NOT NULL DEFAULT '',
            address         TEXT NOT NULL,
            town            TEXT NOT NULL DEFAULT '',
            location_notes  TEXT NOT NULL DEFAULT '',
            dispatched      TEXT NOT NULL,          -- local wall clock
            enroute         TEXT,
            on_scene        TEXT,
            clear           TEXT,
            narrative       TEXT NOT NULL,
            created_by      INTEGER NOT NULL,
            created_at      TEXT NOT NULL,          -- UTC, fixed width
            updated_at      TEXT NOT NULL,
            FOREIGN KEY(created_by) REFERENCES users(id)
        );

        CREATE TABLE IF NOT EXISTS call_apparatus (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            call_id      INTEGER NOT NULL,
            apparatus_id INTEGER NOT NULL,
            FOREIGN KEY(call_id) REFERENCES calls(id) ON DELETE CASCADE,
            FOREIGN KEY(apparatus_id) REFERENCES picklists(id),
            UNIQUE(call_id, apparatus_id)
        );

        CREATE TABLE IF NOT EXISTS call_responders (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            call_id        INTEGER NOT NULL,
            responder_id   INTEGER NOT NULL,
            responder_role TEXT NOT NULL DEFAULT '',
            FOREIGN KEY(call_id) REFERENCES calls(id) ON DELETE CASCADE,
            FOREIGN KEY(responder_id) REFERENCES users(id),
            UNIQUE(call_id, responder_id)
        );

        CREATE TABLE IF NOT EXISTS settings (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- no FK on user_id: break-glass actions (id 0) are logged too
        CREATE TABLE IF NOT EXISTS audit_log (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id    INTEGER NOT NULL,
            action     TEXT NOT NULL,
            table_name TEXT NOT NULL,
            record_id  INTEGER,
            changes    TEXT NOT NULL DEFAULT '',
            timestamp  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_calls_created_at ON calls(created_at);
        CREATE INDEX IF NOT EXISTS idx_calls_call_type ON calls(call_type);
        CREATE INDEX IF NOT EXISTS idx_calls_town ON calls(town);
        CREATE INDEX IF NOT EXISTS idx_picklists_category ON picklists(category);
        CREATE INDEX IF NOT EXISTS idx_picklists_active ON picklists(active);
        CREATE INDEX IF NOT EXISTS idx_audit_log_record ON audit_log(table_name, record_id);
        "#,
    )
}

fn add_unique_incident_number(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_calls_incident_number
            ON calls(incident_number)
            WHERE incident_number IS NOT NULL AND incident_number <> '';
        "#,
    )
}

/// Check if `table` has a column named `column`.
fn table_has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info('{}')", table))?;
    let cols = stmt.query_map([], |row| row.get::<_, String>(1))?;

    for c in cols {
        if c? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Add `column` to `table` unless it is already there.
fn ensure_column(conn: &Connection, table: &str, column: &str, decl: &str) -> Result<()> {
    if !table_has_column(conn, table, column)? {
        conn.execute_batch(&format!("ALTER TABLE {} ADD COLUMN {} {};", table, column, decl))?;
    }
    Ok(())
}

/// Databases created before the admin flag existed carried `role = 'admin'`.
/// Their `users` table survives the core schema step untouched, so the
/// columns it lacks are added here first.
fn migrate_legacy_role_column(conn: &Connection) -> Result<()> {
    ensure_column(conn, "users", "ems_level", "TEXT")?;
    ensure_column(conn, "users", "is_admin", "INTEGER NOT NULL DEFAULT 0")?;
    ensure_column(conn, "users", "joined_date", "TEXT")?;

    if !table_has_column(conn, "users", "role")? {
        return Ok(());
    }

    conn.execute(
        "UPDATE users SET is_admin = 1 WHERE role = 'admin' AND is_admin = 0",
        [],
    )?;
    Ok(())
}

fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

/// Versions already recorded in the internal log, oldest first.
pub fn applied_versions(conn: &Connection) -> AppResult<Vec<String>> {
    ensure_log_table(conn)?;

    let mut stmt = conn.prepare(
        "SELECT target FROM log WHERE operation = 'migration_applied' ORDER BY target ASC",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Public entry point: run all pending migrations, each in its own
/// transaction together with its bookkeeping row.
///
/// Invoked by db::initialize::init_db().
pub fn run_pending_migrations(conn: &Connection) -> AppResult<()> {
    ensure_log_table(conn)?;

    for m in MIGRATIONS {
        if is_applied(conn, m.version)? {
            continue;
        }

        let tx = conn.unchecked_transaction()?;

        (m.apply)(&tx).map_err(|e| AppError::Migration(format!("{}: {}", m.version, e)))?;

        tx.execute(
            "INSERT INTO log (date, operation, target, message)
             VALUES (?1, 'migration_applied', ?2, ?3)",
            rusqlite::params![
                crate::utils::time::utc_to_db(&crate::utils::time::now_utc()),
                m.version,
                m.description
            ],
        )?;

        tx.commit()?;

        success(format!("Migration applied: {} → {}", m.version, m.description));
    }

    Ok(())
}
