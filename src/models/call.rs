use super::{picklist::Picklist, user::User};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// An incident report as stored in `calls`.
///
/// Timeline fields are local wall-clock times as reported by dispatch. They
/// are independent: no ordering between enroute, on-scene and clear is
/// enforced. `created_at` is fixed at insert, `updated_at` moves on every
/// update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub id: i64,
    /// `YYYY-NNN`. Leave empty on create to have one assigned.
    pub incident_number: String,
    pub call_type: String,
    pub mutual_aid: String,
    pub address: String,
    pub town: String,
    pub location_notes: String,
    pub dispatched: NaiveDateTime,
    pub enroute: Option<NaiveDateTime>,
    pub on_scene: Option<NaiveDateTime>,
    pub clear: Option<NaiveDateTime>,
    pub narrative: String,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Complete apparatus and responder sets for one call.
///
/// Updates replace the stored sets with exactly these; there is no merge
/// with what was there before.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Associations {
    pub apparatus_ids: Vec<i64>,
    /// (user id, role label). The label is free text.
    pub responders: Vec<(i64, String)>,
}

impl Associations {
    pub fn new(apparatus_ids: Vec<i64>, responders: Vec<(i64, String)>) -> Self {
        Self {
            apparatus_ids,
            responders,
        }
    }

    /// Build from the parallel-array shape used by form front ends.
    /// Responders without a matching role get an empty label; surplus roles
    /// are ignored.
    pub fn from_parallel(
        apparatus_ids: &[i64],
        responder_ids: &[i64],
        responder_roles: &[String],
    ) -> Self {
        let responders = responder_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, responder_roles.get(i).cloned().unwrap_or_default()))
            .collect();

        Self {
            apparatus_ids: apparatus_ids.to_vec(),
            responders,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.apparatus_ids.is_empty() && self.responders.is_empty()
    }
}

/// A responder row joined with its user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Responder {
    pub user: User,
    pub role: String,
}

/// A call with its resolved associations, as returned by lookups by id.
#[derive(Debug, Clone, Serialize)]
pub struct CallDetail {
    pub call: Call,
    pub apparatus: Vec<Picklist>,
    pub responders: Vec<Responder>,
}
