//! Typed call search filters.
//!
//! Every recognized filter is a field; there is no open-ended options map.
//! String input (CLI flags, form posts) goes through `from_pairs`, which
//! rejects keys it does not know.

use crate::errors::{AppError, AppResult};
use crate::utils::time::{parse_bound, utc_to_db};
use chrono::{DateTime, Utc};

pub const KEY_START_DATE: &str = "start_date";
pub const KEY_END_DATE: &str = "end_date";
pub const KEY_CALL_TYPE: &str = "call_type";
pub const KEY_TOWN: &str = "town";
pub const KEY_SEARCH_TEXT: &str = "search_text";

pub const RECOGNIZED_KEYS: [&str; 5] = [
    KEY_START_DATE,
    KEY_END_DATE,
    KEY_CALL_TYPE,
    KEY_TOWN,
    KEY_SEARCH_TEXT,
];

/// Conjunctive filters over `calls`. `None` and empty strings mean "no
/// constraint", never "match nothing".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    /// Inclusive lower bound on creation time.
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on creation time.
    pub created_to: Option<DateTime<Utc>>,
    /// Exact call type.
    pub call_type: Option<String>,
    /// Exact town.
    pub town: Option<String>,
    /// Case-sensitive literal substring of the address or incident number.
    pub text: Option<String>,
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created_from(mut self, ts: DateTime<Utc>) -> Self {
        self.created_from = Some(ts);
        self
    }

    pub fn created_to(mut self, ts: DateTime<Utc>) -> Self {
        self.created_to = Some(ts);
        self
    }

    pub fn call_type(mut self, v: impl Into<String>) -> Self {
        self.call_type = Some(v.into());
        self
    }

    pub fn town(mut self, v: impl Into<String>) -> Self {
        self.town = Some(v.into());
        self
    }

    pub fn text(mut self, v: impl Into<String>) -> Self {
        self.text = Some(v.into());
        self
    }

    /// Build filters from string pairs. Unknown keys and unparsable dates
    /// are errors; empty values are skipped.
    pub fn from_pairs<I, K, V>(pairs: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut f = Self::default();

        for (k, v) in pairs {
            let key = k.as_ref();
            let value = v.as_ref();

            if !RECOGNIZED_KEYS.contains(&key) {
                return Err(AppError::InvalidFilter(format!(
                    "unknown key '{}' (expected one of: {})",
                    key,
                    RECOGNIZED_KEYS.join(", ")
                )));
            }
            if value.is_empty() {
                continue;
            }

            match key {
                KEY_START_DATE => {
                    f.created_from = Some(
                        parse_bound(value, false)
                            .ok_or_else(|| AppError::InvalidDate(value.to_string()))?,
                    )
                }
                KEY_END_DATE => {
                    f.created_to = Some(
                        parse_bound(value, true)
                            .ok_or_else(|| AppError::InvalidDate(value.to_string()))?,
                    )
                }
                KEY_CALL_TYPE => f.call_type = Some(value.to_string()),
                KEY_TOWN => f.town = Some(value.to_string()),
                _ => f.text = Some(value.to_string()),
            }
        }

        Ok(f)
    }

    /// WHERE clause (possibly empty) and its positional parameters.
    pub(crate) fn to_where(&self) -> (String, Vec<String>) {
        let mut conditions: Vec<&str> = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(from) = &self.created_from {
            conditions.push("created_at >= ?");
            params.push(utc_to_db(from));
        }
        if let Some(to) = &self.created_to {
            conditions.push("created_at <= ?");
            params.push(utc_to_db(to));
        }
        if let Some(ct) = non_empty(&self.call_type) {
            conditions.push("call_type = ?");
            params.push(ct.to_string());
        }
        if let Some(town) = non_empty(&self.town) {
            conditions.push("town = ?");
            params.push(town.to_string());
        }
        if let Some(text) = non_empty(&self.text) {
            // instr() is case-sensitive and treats % and _ literally.
            conditions.push(
                "(instr(address, ?) > 0 OR instr(COALESCE(incident_number, ''), ?) > 0)",
            );
            params.push(text.to_string());
            params.push(text.to_string());
        }

        if conditions.is_empty() {
            return (String::new(), params);
        }
        (format!(" WHERE {}", conditions.join(" AND ")), params)
    }
}
