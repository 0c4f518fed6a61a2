//! The fixed emergency credential.
//!
//! Older installs shipped a hardcoded "Admin User" / "1234" login that
//! always succeeds and yields an admin identity (id 0) that does not exist
//! in `users`. It is kept for compatibility, but it is explicit and can be
//! switched off or re-keyed from the configuration file.

use crate::models::user::{BREAK_GLASS_USER_ID, User};
use serde::{Deserialize, Serialize};

pub const LEGACY_NAME: &str = "Admin User";
pub const LEGACY_PIN: &str = "1234";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakGlass {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_pin")]
    pub pin: String,
}

fn default_enabled() -> bool {
    true
}
fn default_name() -> String {
    LEGACY_NAME.to_string()
}
fn default_pin() -> String {
    LEGACY_PIN.to_string()
}

impl Default for BreakGlass {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            name: default_name(),
            pin: default_pin(),
        }
    }
}

impl BreakGlass {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn matches(&self, full_name: &str, pin: &str) -> bool {
        self.enabled && full_name == self.name && pin == self.pin
    }

    /// The virtual administrator handed out on a successful match.
    pub fn identity(&self) -> User {
        let (first, last) = self
            .name
            .split_once(' ')
            .unwrap_or((self.name.as_str(), ""));

        User {
            id: BREAK_GLASS_USER_ID,
            first_name: first.to_string(),
            last_name: last.to_string(),
            position: "administrator".to_string(),
            is_admin: true,
            active: true,
            ..User::default()
        }
    }
}
