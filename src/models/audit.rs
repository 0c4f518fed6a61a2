use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
        }
    }
}

/// One row of `audit_log`.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub user_id: i64,
    pub action: String,
    pub table_name: String,
    pub record_id: Option<i64>,
    pub changes: String, // JSON snapshot
    pub timestamp: DateTime<Utc>,
}
