//! Time utilities: storage formats for wall-clock and UTC timestamps, and
//! lenient parsing of user input.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, Utc};

/// Storage format for audit/creation timestamps. Fixed width, so text
/// ordering in SQL matches chronological ordering.
const UTC_FMT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Storage format for incident timeline timestamps (local wall clock).
const WALL_FMT: &str = "%Y-%m-%dT%H:%M:%S";

/// Current UTC time truncated to what the store can represent.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub fn utc_to_db(ts: &DateTime<Utc>) -> String {
    ts.format(UTC_FMT).to_string()
}

/// Parse a stored UTC timestamp. Also accepts SQLite's `CURRENT_TIMESTAMP`
/// shape (`YYYY-MM-DD HH:MM:SS`) for rows written by SQL defaults.
pub fn utc_from_db(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|n| n.and_utc())
}

pub fn wall_to_db(ts: &NaiveDateTime) -> String {
    ts.format(WALL_FMT).to_string()
}

pub fn wall_from_db(s: &str) -> Option<NaiveDateTime> {
    parse_wall(s)
}

/// Accepts `YYYY-MM-DDTHH:MM[:SS]` or the same with a space separator.
pub fn parse_wall(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    let s = s.trim();
    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Parse a search bound. A bare date expands to the first (or, with
/// `end_of_day`, the last) representable instant of that UTC day.
pub fn parse_bound(s: &str, end_of_day: bool) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s.trim()) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(n) = parse_wall(s) {
        return Some(n.and_utc());
    }
    let d = parse_date(s)?;
    let t = if end_of_day {
        NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)?
    } else {
        NaiveTime::MIN
    };
    Some(d.and_time(t).and_utc())
}

pub fn format_wall(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

pub fn format_optional_wall(ts: Option<&NaiveDateTime>) -> String {
    ts.map(format_wall).unwrap_or_else(|| "--".to_string())
}
