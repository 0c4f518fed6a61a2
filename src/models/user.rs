use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// ID reserved for the break-glass identity. Never stored.
pub const BREAK_GLASS_USER_ID: i64 = 0;

/// A department member as stored in `users`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub position: String,  // free text: "Chief", "Captain", "Member", ...
    pub ems_level: String, // "None", "EMR", "EMT", "Paramedic", ...
    pub is_admin: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pin: String,
    pub active: bool,
    pub joined_date: Option<NaiveDate>,
    pub created: DateTime<Utc>,
}

impl User {
    /// Name as typed at login: `first || ' ' || last`.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_break_glass(&self) -> bool {
        self.id == BREAK_GLASS_USER_ID
    }

    /// Copy without the PIN, for anything leaving the engine.
    pub fn redacted(&self) -> Self {
        Self {
            pin: String::new(),
            ..self.clone()
        }
    }
}

/// Fields accepted when an administrator adds a member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub ems_level: String,
    pub pin: String,
    pub is_admin: bool,
}
