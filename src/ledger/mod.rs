//! Call ledger: incident reports and their apparatus/responder sets.
//!
//! Every write runs in one `BEGIN IMMEDIATE` transaction. The write lock is
//! taken before the incident-number read, so two writers on separate
//! connections can never compute the same "next" number; the loser waits
//! for the busy timeout instead. Nothing here checks *who* is writing:
//! `can_user_edit_call` is the gate and `core::session` applies it.

pub mod numbering;
pub(crate) mod rows;
pub mod search;

use crate::db::log::record_audit;
use crate::errors::{AppError, AppResult};
use crate::identity::{IdentityDirectory, map_user_row};
use crate::models::audit::AuditAction;
use crate::models::call::{Associations, Call, CallDetail, Responder};
use crate::models::picklist::Picklist;
use crate::settings::EditPolicy;
use crate::utils::time::{now_utc, utc_to_db, wall_to_db};
use chrono::{DateTime, Datelike, Utc};
use rows::{CALL_COLUMNS, map_call_row, map_picklist_row};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use search::SearchFilters;
use serde::Serialize;

/// What goes into `audit_log.changes` for a call write.
#[derive(Serialize)]
struct CallSnapshot<'a> {
    call: &'a Call,
    associations: &'a Associations,
}

fn call_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("call {}", id))
}

fn begin_write(conn: &mut Connection) -> AppResult<Transaction<'_>> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(AppError::LedgerWrite)
}

/// Apparatus ids must name `apparatus` picklist entries. Ids with no row at
/// all are left to the foreign key.
fn check_apparatus(tx: &Transaction, assoc: &Associations) -> AppResult<()> {
    let mut stmt = tx
        .prepare_cached("SELECT category FROM picklists WHERE id = ?1")
        .map_err(AppError::LedgerWrite)?;
    for apparatus_id in &assoc.apparatus_ids {
        let category: Option<String> = stmt
            .query_row([apparatus_id], |row| row.get(0))
            .optional()
            .map_err(AppError::LedgerWrite)?;
        if let Some(category) = category
            && category != "apparatus"
        {
            return Err(AppError::InvalidInput(format!(
                "picklist entry {} is a {} value, not apparatus",
                apparatus_id, category
            )));
        }
    }
    Ok(())
}

/// Insert the full association sets for a call that currently has none.
fn insert_associations(
    tx: &Transaction,
    call_id: i64,
    assoc: &Associations,
) -> rusqlite::Result<()> {
    let mut app_stmt = tx.prepare_cached(
        "INSERT INTO call_apparatus (call_id, apparatus_id) VALUES (?1, ?2)",
    )?;
    for apparatus_id in &assoc.apparatus_ids {
        app_stmt.execute(params![call_id, apparatus_id])?;
    }

    let mut resp_stmt = tx.prepare_cached(
        "INSERT INTO call_responders (call_id, responder_id, responder_role) VALUES (?1, ?2, ?3)",
    )?;
    for (responder_id, role) in &assoc.responders {
        resp_stmt.execute(params![call_id, responder_id, role])?;
    }

    Ok(())
}

fn insert_call(tx: &Transaction, call: &mut Call, assoc: &Associations) -> rusqlite::Result<()> {
    if call.incident_number.trim().is_empty() {
        call.incident_number = numbering::next_incident_number(tx, call.dispatched.year())?;
    }

    let now = now_utc();
    call.created_at = now;
    call.updated_at = now;

    tx.execute(
        "INSERT INTO calls (
            incident_number, call_type, mutual_aid, address,
            town, location_notes, dispatched, enroute,
            on_scene, clear, narrative, created_by, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            call.incident_number,
            call.call_type,
            call.mutual_aid,
            call.address,
            call.town,
            call.location_notes,
            wall_to_db(&call.dispatched),
            call.enroute.as_ref().map(wall_to_db),
            call.on_scene.as_ref().map(wall_to_db),
            call.clear.as_ref().map(wall_to_db),
            call.narrative,
            call.created_by,
            utc_to_db(&call.created_at),
            utc_to_db(&call.updated_at),
        ],
    )?;
    call.id = tx.last_insert_rowid();

    insert_associations(tx, call.id, assoc)?;

    record_audit(
        tx,
        call.created_by,
        AuditAction::Create,
        "calls",
        Some(call.id),
        &CallSnapshot {
            call,
            associations: assoc,
        },
    )
}

/// Rewrite the mutable fields and replace both association sets.
/// Returns Ok(false) when the call does not exist.
fn rewrite_call(
    tx: &Transaction,
    call: &Call,
    assoc: &Associations,
    acting_user: i64,
    action: AuditAction,
) -> rusqlite::Result<bool> {
    let changed = tx.execute(
        "UPDATE calls SET
            incident_number = ?1, call_type = ?2, mutual_aid = ?3,
            address = ?4, town = ?5, location_notes = ?6,
            dispatched = ?7, enroute = ?8, on_scene = ?9, clear = ?10,
            narrative = ?11, updated_at = ?12
         WHERE id = ?13",
        params![
            call.incident_number,
            call.call_type,
            call.mutual_aid,
            call.address,
            call.town,
            call.location_notes,
            wall_to_db(&call.dispatched),
            call.enroute.as_ref().map(wall_to_db),
            call.on_scene.as_ref().map(wall_to_db),
            call.clear.as_ref().map(wall_to_db),
            call.narrative,
            utc_to_db(&now_utc()),
            call.id,
        ],
    )?;
    if changed == 0 {
        return Ok(false);
    }

    tx.execute("DELETE FROM call_apparatus WHERE call_id = ?1", [call.id])?;
    tx.execute("DELETE FROM call_responders WHERE call_id = ?1", [call.id])?;
    insert_associations(tx, call.id, assoc)?;

    record_audit(
        tx,
        acting_user,
        action,
        "calls",
        Some(call.id),
        &CallSnapshot {
            call,
            associations: assoc,
        },
    )?;

    Ok(true)
}

pub struct CallLedger;

impl CallLedger {
    /// Store a new call with its apparatus and responders, all or nothing.
    ///
    /// An empty `incident_number` is replaced by the next number for the
    /// year of `dispatched`. Returns the stored call with id, number and
    /// timestamps filled in. An apparatus id naming another picklist
    /// category is `InvalidInput`. Any other failure after the creator check
    /// is a `LedgerWrite` error and leaves nothing behind; a duplicate
    /// incident number is not retried.
    pub fn create_call(
        conn: &mut Connection,
        call: &Call,
        assoc: &Associations,
    ) -> AppResult<Call> {
        if IdentityDirectory::find_user_by_id(conn, call.created_by)?.is_none() {
            return Err(AppError::NotFound(format!(
                "creator {} is not a stored user",
                call.created_by
            )));
        }

        let mut saved = call.clone();
        let tx = begin_write(conn)?;
        check_apparatus(&tx, assoc)?;
        insert_call(&tx, &mut saved, assoc).map_err(AppError::LedgerWrite)?;
        tx.commit().map_err(AppError::LedgerWrite)?;

        Ok(saved)
    }

    /// Overwrite a call's mutable fields and replace its apparatus and
    /// responder sets wholesale: callers send the complete desired sets.
    ///
    /// `created_by` and `created_at` are never touched. `acting_user` is
    /// recorded in the audit trail only.
    pub fn update_call(
        conn: &mut Connection,
        call: &Call,
        assoc: &Associations,
        acting_user: i64,
    ) -> AppResult<()> {
        let tx = begin_write(conn)?;
        check_apparatus(&tx, assoc)?;
        let found = rewrite_call(&tx, call, assoc, acting_user, AuditAction::Update)
            .map_err(AppError::LedgerWrite)?;
        if !found {
            return Err(call_not_found(call.id));
        }
        tx.commit().map_err(AppError::LedgerWrite)
    }

    /// "Delete" keeps the row: the call is re-saved unchanged with empty
    /// apparatus and responder sets.
    pub fn delete_call(conn: &mut Connection, id: i64, acting_user: i64) -> AppResult<()> {
        let call = Self::find_call(conn, id)?.ok_or_else(|| call_not_found(id))?;

        let tx = begin_write(conn)?;
        let found = rewrite_call(
            &tx,
            &call,
            &Associations::default(),
            acting_user,
            AuditAction::Delete,
        )
        .map_err(AppError::LedgerWrite)?;
        if !found {
            return Err(call_not_found(id));
        }
        tx.commit().map_err(AppError::LedgerWrite)
    }

    fn find_call(conn: &Connection, id: i64) -> AppResult<Option<Call>> {
        let sql = format!("SELECT {CALL_COLUMNS} FROM calls WHERE id = ?1");
        Ok(conn.query_row(&sql, [id], map_call_row).optional()?)
    }

    /// A call with apparatus ordered by (sort order, value) and responders
    /// by (last name, first name). Missing associations are empty vectors.
    pub fn get_call_by_id(conn: &Connection, id: i64) -> AppResult<CallDetail> {
        let call = Self::find_call(conn, id)?.ok_or_else(|| call_not_found(id))?;

        let mut stmt = conn.prepare(
            "SELECT p.id, p.category, p.value, p.sort_order, p.active
             FROM call_apparatus ca
             JOIN picklists p ON ca.apparatus_id = p.id
             WHERE ca.call_id = ?1
             ORDER BY p.sort_order, p.value",
        )?;
        let rows = stmt.query_map([id], map_picklist_row)?;
        let mut apparatus: Vec<Picklist> = Vec::new();
        for r in rows {
            apparatus.push(r?);
        }

        let mut stmt = conn.prepare(
            "SELECT u.id, u.first_name, u.last_name, u.position, u.ems_level, u.is_admin,
                    u.active, u.joined_date, u.created, cr.responder_role
             FROM call_responders cr
             JOIN users u ON cr.responder_id = u.id
             WHERE cr.call_id = ?1
             ORDER BY u.last_name, u.first_name",
        )?;
        let rows = stmt.query_map([id], |row| {
            Ok(Responder {
                user: map_user_row(row)?,
                role: row.get("responder_role")?,
            })
        })?;
        let mut responders = Vec::new();
        for r in rows {
            responders.push(r?);
        }

        Ok(CallDetail {
            call,
            apparatus,
            responders,
        })
    }

    /// May `user_id` edit `call_id` right now?
    pub fn can_user_edit_call(conn: &Connection, call_id: i64, user_id: i64) -> AppResult<bool> {
        Self::can_user_edit_call_at(conn, call_id, user_id, now_utc())
    }

    /// Edit decision as of `now`.
    ///
    /// Admins may always edit while `admin_can_always_edit` is "true".
    /// Everyone else (admins included, when that setting is off) may edit
    /// only their own calls, up to and including exactly
    /// `edit_time_limit_minutes` after creation.
    pub fn can_user_edit_call_at(
        conn: &Connection,
        call_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let call = Self::find_call(conn, call_id)?.ok_or_else(|| call_not_found(call_id))?;
        let user = IdentityDirectory::get_user_by_id(conn, user_id)?;
        let policy = EditPolicy::load(conn)?;

        if user.is_admin && policy.admin_can_always_edit {
            return Ok(true);
        }

        if call.created_by != user_id {
            return Ok(false);
        }

        Ok(now - call.created_at <= policy.edit_time_limit)
    }

    /// Newest first by creation time, ties by id; then paginated.
    pub fn search(
        conn: &Connection,
        filters: &SearchFilters,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Call>> {
        let (where_clause, args) = filters.to_where();
        let sql = format!(
            "SELECT {CALL_COLUMNS} FROM calls{where_clause}
             ORDER BY created_at DESC, id DESC
             LIMIT {limit} OFFSET {offset}"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), map_call_row)?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    pub fn recent_calls(conn: &Connection, limit: i64, offset: i64) -> AppResult<Vec<Call>> {
        Self::search(conn, &SearchFilters::default(), limit, offset)
    }

    /// Calls dispatched in `year`, latest dispatch first.
    pub fn calls_by_year(conn: &Connection, year: i32) -> AppResult<Vec<Call>> {
        let sql = format!(
            "SELECT {CALL_COLUMNS} FROM calls
             WHERE strftime('%Y', dispatched) = ?1
             ORDER BY dispatched DESC, id DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([format!("{:04}", year)], map_call_row)?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    /// Distinct dispatch years, most recent first.
    pub fn call_years(conn: &Connection) -> AppResult<Vec<i32>> {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT CAST(strftime('%Y', dispatched) AS INTEGER) AS year
             FROM calls
             WHERE dispatched IS NOT NULL
             ORDER BY year DESC",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, i32>(0))?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    /// Preview of the number the next call dispatched in `year` would get.
    /// Only `create_call` reserves a number.
    pub fn next_incident_number(conn: &Connection, year: i32) -> AppResult<String> {
        Ok(numbering::next_incident_number(conn, year)?)
    }
}
