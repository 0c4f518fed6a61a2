//! Row ↔ struct mapping for `calls` and the association joins.

use crate::errors::AppError;
use crate::models::call::Call;
use crate::models::picklist::Picklist;
use crate::utils::time::{utc_from_db, wall_from_db};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::Row;

pub(crate) const CALL_COLUMNS: &str = "id, incident_number, call_type, mutual_aid, address, town, \
     location_notes, dispatched, enroute, on_scene, clear, narrative, created_by, created_at, updated_at";

fn conversion_error(col: usize, raw: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        col,
        rusqlite::types::Type::Text,
        Box::new(AppError::InvalidDate(raw.to_string())),
    )
}

fn wall(row: &Row, name: &str) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(name)?;
    wall_from_db(&raw).ok_or_else(|| conversion_error(0, &raw))
}

fn optional_wall(row: &Row, name: &str) -> rusqlite::Result<Option<NaiveDateTime>> {
    match row.get::<_, Option<String>>(name)? {
        Some(raw) if !raw.is_empty() => wall_from_db(&raw)
            .map(Some)
            .ok_or_else(|| conversion_error(0, &raw)),
        _ => Ok(None),
    }
}

fn utc(row: &Row, name: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(name)?;
    utc_from_db(&raw).ok_or_else(|| conversion_error(0, &raw))
}

pub(crate) fn map_call_row(row: &Row) -> rusqlite::Result<Call> {
    Ok(Call {
        id: row.get("id")?,
        incident_number: row
            .get::<_, Option<String>>("incident_number")?
            .unwrap_or_default(),
        call_type: row.get("call_type")?,
        mutual_aid: row.get("mutual_aid")?,
        address: row.get("address")?,
        town: row.get("town")?,
        location_notes: row.get("location_notes")?,
        dispatched: wall(row, "dispatched")?,
        enroute: optional_wall(row, "enroute")?,
        on_scene: optional_wall(row, "on_scene")?,
        clear: optional_wall(row, "clear")?,
        narrative: row.get("narrative")?,
        created_by: row.get("created_by")?,
        created_at: utc(row, "created_at")?,
        updated_at: utc(row, "updated_at")?,
    })
}

pub(crate) fn map_picklist_row(row: &Row) -> rusqlite::Result<Picklist> {
    Ok(Picklist {
        id: row.get("id")?,
        category: row.get("category")?,
        value: row.get("value")?,
        sort_order: row.get("sort_order")?,
        active: row.get("active")?,
    })
}
