//! Caller-side gates: who is logged in and what they may change.
//!
//! The ledger and the identity directory trust their callers. A `Session`
//! is that caller for the CLI: every mutation goes through here, is checked
//! against the logged-in identity, and leaves an audit row behind.

use crate::db::log::record_audit;
use crate::errors::{AppError, AppResult};
use crate::identity::IdentityDirectory;
use crate::identity::break_glass::BreakGlass;
use crate::ledger::CallLedger;
use crate::models::audit::AuditAction;
use crate::models::call::{Associations, Call};
use crate::models::picklist::Picklist;
use crate::models::user::{NewUser, User};
use crate::picklists::Picklists;
use crate::settings;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;

fn unauthorized(msg: &str) -> AppError {
    AppError::Unauthorized(msg.to_string())
}

#[derive(Debug, Default)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authenticate and remember the identity. A failed login leaves any
    /// previous identity logged out.
    pub fn login(
        &mut self,
        conn: &Connection,
        full_name: &str,
        pin: &str,
        break_glass: &BreakGlass,
    ) -> AppResult<&User> {
        self.user = None;
        let user = IdentityDirectory::authenticate_user(conn, full_name, pin, break_glass)?;
        Ok(&*self.user.insert(user.redacted()))
    }

    pub fn logout(&mut self) {
        self.user = None;
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn require_login(&self) -> AppResult<&User> {
        self.user
            .as_ref()
            .ok_or_else(|| unauthorized("login required"))
    }

    pub fn require_admin(&self) -> AppResult<&User> {
        let user = self.require_login()?;
        if !user.is_admin {
            return Err(unauthorized("administrator privileges required"));
        }
        Ok(user)
    }

    fn audit<T: Serialize>(
        &self,
        conn: &Connection,
        action: AuditAction,
        table: &str,
        record_id: Option<i64>,
        changes: &T,
    ) -> AppResult<()> {
        let user_id = self.require_login()?.id;
        record_audit(conn, user_id, action, table, record_id, changes)?;
        Ok(())
    }

    // ---------------------------
    // Calls
    // ---------------------------

    /// File a new call as the logged-in member.
    pub fn create_call(
        &self,
        conn: &mut Connection,
        call: &Call,
        assoc: &Associations,
    ) -> AppResult<Call> {
        let user = self.require_login()?;
        let call = Call {
            created_by: user.id,
            ..call.clone()
        };
        CallLedger::create_call(conn, &call, assoc)
    }

    fn require_edit(&self, conn: &Connection, call_id: i64) -> AppResult<i64> {
        let user = self.require_login()?;
        if user.is_break_glass() {
            // id 0 has no row for the policy lookup; it may edit while admins may
            if !settings::EditPolicy::load(conn)?.admin_can_always_edit {
                return Err(unauthorized("edit window closed for this call"));
            }
            return Ok(user.id);
        }
        if !CallLedger::can_user_edit_call(conn, call_id, user.id)? {
            return Err(unauthorized("edit window closed for this call"));
        }
        Ok(user.id)
    }

    pub fn update_call(
        &self,
        conn: &mut Connection,
        call: &Call,
        assoc: &Associations,
    ) -> AppResult<()> {
        let acting = self.require_edit(conn, call.id)?;
        CallLedger::update_call(conn, call, assoc, acting)
    }

    pub fn delete_call(&self, conn: &mut Connection, call_id: i64) -> AppResult<()> {
        let acting = self.require_edit(conn, call_id)?;
        CallLedger::delete_call(conn, call_id, acting)
    }

    // ---------------------------
    // Users
    // ---------------------------

    /// Change the logged-in member's own PIN after re-checking the old one.
    pub fn change_own_pin(
        &self,
        conn: &Connection,
        old_pin: &str,
        new_pin: &str,
    ) -> AppResult<()> {
        let user = self.require_login()?;
        if user.is_break_glass() {
            return Err(unauthorized("the break-glass PIN cannot be changed"));
        }

        // break-glass is disabled here so the legacy credential cannot stand in
        IdentityDirectory::authenticate_user(
            conn,
            &user.full_name(),
            old_pin,
            &BreakGlass::disabled(),
        )
        .map_err(|e| {
            if e.is_not_found() {
                unauthorized("incorrect current PIN")
            } else {
                e
            }
        })?;

        IdentityDirectory::change_pin(conn, user.id, new_pin)?;
        let changes = json!({ "pin": "changed" });
        self.audit(conn, AuditAction::Update, "users", Some(user.id), &changes)
    }

    pub fn change_user_pin(
        &self,
        conn: &Connection,
        user_id: i64,
        new_pin: &str,
    ) -> AppResult<()> {
        self.require_admin()?;
        IdentityDirectory::change_pin(conn, user_id, new_pin)?;
        let changes = json!({ "pin": "changed" });
        self.audit(conn, AuditAction::Update, "users", Some(user_id), &changes)
    }

    pub fn create_user(&self, conn: &Connection, new_user: &NewUser) -> AppResult<User> {
        self.require_admin()?;
        let user = IdentityDirectory::create_user(conn, new_user)?;
        self.audit(conn, AuditAction::Create, "users", Some(user.id), &user.redacted())?;
        Ok(user)
    }

    pub fn update_user_position(
        &self,
        conn: &Connection,
        user_id: i64,
        position: &str,
    ) -> AppResult<()> {
        self.require_admin()?;
        IdentityDirectory::update_position(conn, user_id, position)?;
        let changes = json!({ "position": position });
        self.audit(conn, AuditAction::Update, "users", Some(user_id), &changes)
    }

    pub fn update_user_admin_status(
        &self,
        conn: &Connection,
        user_id: i64,
        is_admin: bool,
    ) -> AppResult<()> {
        self.require_admin()?;
        IdentityDirectory::update_admin_status(conn, user_id, is_admin)?;
        let changes = json!({ "is_admin": is_admin });
        self.audit(conn, AuditAction::Update, "users", Some(user_id), &changes)
    }

    pub fn update_user_join_date(
        &self,
        conn: &Connection,
        user_id: i64,
        joined: Option<NaiveDate>,
    ) -> AppResult<()> {
        self.require_admin()?;
        IdentityDirectory::update_join_date(conn, user_id, joined)?;
        let changes = json!({ "joined_date": joined });
        self.audit(conn, AuditAction::Update, "users", Some(user_id), &changes)
    }

    pub fn deactivate_user(&self, conn: &Connection, user_id: i64) -> AppResult<()> {
        self.require_admin()?;
        IdentityDirectory::deactivate_user(conn, user_id)?;
        let changes = json!({ "active": false });
        self.audit(conn, AuditAction::Delete, "users", Some(user_id), &changes)
    }

    // ---------------------------
    // Picklists and settings
    // ---------------------------

    pub fn create_picklist(
        &self,
        conn: &Connection,
        category: &str,
        value: &str,
        sort_order: Option<i64>,
    ) -> AppResult<Picklist> {
        self.require_admin()?;
        let entry = Picklists::create(conn, category, value, sort_order)?;
        self.audit(conn, AuditAction::Create, "picklists", Some(entry.id), &entry)?;
        Ok(entry)
    }

    pub fn update_picklist(&self, conn: &Connection, entry: &Picklist) -> AppResult<()> {
        self.require_admin()?;
        Picklists::update(conn, entry)?;
        self.audit(conn, AuditAction::Update, "picklists", Some(entry.id), entry)
    }

    pub fn deactivate_picklist(&self, conn: &Connection, id: i64) -> AppResult<()> {
        self.require_admin()?;
        Picklists::deactivate(conn, id)?;
        let changes = json!({ "active": false });
        self.audit(conn, AuditAction::Delete, "picklists", Some(id), &changes)
    }

    pub fn set_setting(&self, conn: &Connection, key: &str, value: &str) -> AppResult<()> {
        self.require_admin()?;
        settings::set_setting(conn, key, value)?;
        self.audit(conn, AuditAction::Update, "settings", None, &json!({ key: value }))
    }
}
