//! Second-precision UTC timestamps for the persisted documents.
//!
//! Written as `YYYY-MM-DDTHH:MM:SSZ`. Reading also accepts fractional
//! seconds, explicit offsets (`+00:00`, `+02:00`) and offset-less values,
//! which are taken as UTC. Sub-second parts are dropped on read.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Output format for every persisted timestamp.
pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Format a timestamp the way it is persisted.
#[must_use]
pub fn format(ts: &DateTime<Utc>) -> String {
    ts.format(FORMAT).to_string()
}

/// Parse a persisted timestamp, tolerating the variants older writers produced.
///
/// # Errors
///
/// Returns the parse error message when no accepted layout matches.
pub fn parse(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc).trunc_subsecs(0));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc().trunc_subsecs(0))
        .map_err(|e| format!("invalid timestamp {raw:?}: {e}"))
}

/// Current time truncated to whole seconds.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Serde `serialize_with` hook.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(ts))
}

/// Serde `deserialize_with` hook.
///
/// # Errors
///
/// Fails when the string is not an accepted timestamp layout.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}
