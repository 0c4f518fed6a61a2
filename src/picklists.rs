//! Dropdown values grouped by category (call types, towns, apparatus, ...).

use crate::errors::{AppError, AppResult};
use crate::ledger::rows::map_picklist_row;
use crate::models::picklist::Picklist;
use rusqlite::{Connection, OptionalExtension, params};

const PICKLIST_COLUMNS: &str = "id, category, value, sort_order, active";

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("picklist entry {}", id))
}

pub struct Picklists;

impl Picklists {
    fn query(conn: &Connection, sql: &str, category: &str) -> AppResult<Vec<Picklist>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([category], map_picklist_row)?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    /// Active values of a category, in display order.
    pub fn by_category(conn: &Connection, category: &str) -> AppResult<Vec<Picklist>> {
        let sql = format!(
            "SELECT {PICKLIST_COLUMNS} FROM picklists
             WHERE category = ?1 AND active = 1
             ORDER BY sort_order, value"
        );
        Self::query(conn, &sql, category)
    }

    /// All values of a category, retired ones included.
    pub fn by_category_for_admin(conn: &Connection, category: &str) -> AppResult<Vec<Picklist>> {
        let sql = format!(
            "SELECT {PICKLIST_COLUMNS} FROM picklists
             WHERE category = ?1
             ORDER BY sort_order, value"
        );
        Self::query(conn, &sql, category)
    }

    pub fn categories(conn: &Connection) -> AppResult<Vec<String>> {
        let mut stmt =
            conn.prepare("SELECT DISTINCT category FROM picklists ORDER BY category ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    pub fn get(conn: &Connection, id: i64) -> AppResult<Picklist> {
        let sql = format!("SELECT {PICKLIST_COLUMNS} FROM picklists WHERE id = ?1");
        conn.query_row(&sql, [id], map_picklist_row)
            .optional()?
            .ok_or_else(|| not_found(id))
    }

    /// Add a value. Without an explicit sort order it goes to the end of
    /// its category. A duplicate (category, value) is rejected by the store.
    pub fn create(
        conn: &Connection,
        category: &str,
        value: &str,
        sort_order: Option<i64>,
    ) -> AppResult<Picklist> {
        if category.trim().is_empty() || value.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "picklist category and value must not be empty".to_string(),
            ));
        }

        let order = match sort_order {
            Some(o) => o,
            None => conn.query_row(
                "SELECT COALESCE(MAX(sort_order), 0) + 1 FROM picklists WHERE category = ?1",
                [category],
                |row| row.get(0),
            )?,
        };

        conn.execute(
            "INSERT INTO picklists (category, value, sort_order, active) VALUES (?1, ?2, ?3, 1)",
            params![category, value, order],
        )?;

        Self::get(conn, conn.last_insert_rowid())
    }

    pub fn update(conn: &Connection, entry: &Picklist) -> AppResult<()> {
        let changed = conn.execute(
            "UPDATE picklists SET value = ?1, sort_order = ?2, active = ?3 WHERE id = ?4",
            params![entry.value, entry.sort_order, entry.active, entry.id],
        )?;
        if changed == 0 {
            return Err(not_found(entry.id));
        }
        Ok(())
    }

    /// Retire a value. Calls that reference it keep doing so.
    pub fn deactivate(conn: &Connection, id: i64) -> AppResult<()> {
        let changed = conn.execute("UPDATE picklists SET active = 0 WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}
