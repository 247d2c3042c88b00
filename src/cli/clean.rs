//! `branchtime clean` command implementation.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::{FileBackend, SessionStore};
use chrono::{DateTime, Duration, Utc};

/// Upper bound on session files considered in one run.
const MAX_SESSIONS: usize = 10_000;

/// Run the clean command.
///
/// Removes session files of shells that exited without running their
/// session-end hook. Recorded durations are never touched.
///
/// # Errors
///
/// Returns an error if the duration is invalid or the storage backend fails.
pub fn run(config: &Config, before: Option<&str>, all: bool) -> Result<()> {
    let store = FileBackend::open(config.storage.path.clone());

    let age = if all {
        Duration::zero()
    } else {
        match before {
            Some(s) => parse_duration(s)?,
            None => Duration::days(i64::from(config.sessions.retention_days)),
        }
    };

    let removed = clean_sessions(&store, age, Utc::now())?;

    if removed == 0 {
        println!("No sessions to clean.");
    } else {
        println!("Cleaned {removed} session(s).");
    }

    Ok(())
}

/// Parse a duration string like "7d", "30d", "24h".
///
/// # Errors
///
/// Returns an error if the duration format is invalid.
fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    if s.is_empty() {
        return Ok(Duration::days(7));
    }

    let invalid = || Error::InvalidArgument(format!("Invalid duration: {s}"));

    let (number, unit): (&str, fn(i64) -> Option<Duration>) =
        if let Some(stripped) = s.strip_suffix('d') {
            (stripped, Duration::try_days)
        } else if let Some(stripped) = s.strip_suffix('h') {
            (stripped, Duration::try_hours)
        } else if let Some(stripped) = s.strip_suffix('m') {
            (stripped, Duration::try_minutes)
        } else {
            // No unit means days
            (s, Duration::try_days)
        };

    let num: i64 = number.parse().map_err(|_| invalid())?;
    if num < 0 {
        return Err(invalid());
    }
    unit(num).ok_or_else(invalid)
}

/// Delete sessions not seen within `age` of `now`.
fn clean_sessions(store: &dyn SessionStore, age: Duration, now: DateTime<Utc>) -> Result<usize> {
    // An age reaching past the earliest representable time keeps everything
    let Some(cutoff) = now.checked_sub_signed(age) else {
        return Ok(0);
    };
    let mut removed = 0;

    for summary in store.list_sessions(MAX_SESSIONS)? {
        if summary.last_seen >= cutoff && !age.is_zero() {
            continue;
        }
        store.delete_session(&summary.session_id)?;
        tracing::debug!(session = %summary.session_id, "removed session");
        removed += 1;
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SessionState;
    use crate::storage::MemoryBackend;

    #[test]
    fn parse_duration_days() {
        assert_eq!(parse_duration("7d").unwrap(), Duration::days(7));
    }

    #[test]
    fn parse_duration_hours() {
        assert_eq!(parse_duration("24h").unwrap(), Duration::hours(24));
    }

    #[test]
    fn parse_duration_minutes() {
        assert_eq!(parse_duration("30m").unwrap(), Duration::minutes(30));
    }

    #[test]
    fn parse_duration_no_unit_defaults_to_days() {
        assert_eq!(parse_duration("14").unwrap(), Duration::days(14));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert!(matches!(parse_duration("soon"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn parse_duration_rejects_out_of_range() {
        assert!(matches!(
            parse_duration("999999999999999d"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(parse_duration("9999999999999999h").is_err());
        assert!(parse_duration("-3d").is_err());
    }

    #[test]
    fn huge_age_keeps_everything() {
        let store = MemoryBackend::new();
        let now = Utc::now();
        store.put_session(&SessionState::new("a", now)).unwrap();

        let age = Duration::try_days(100_000_000_000).unwrap();
        assert_eq!(clean_sessions(&store, age, now).unwrap(), 0);
        assert!(store.get_session("a").unwrap().is_some());
    }

    #[test]
    fn clean_removes_stale_sessions() {
        let store = MemoryBackend::new();
        let now = Utc::now();

        store
            .put_session(&SessionState::new("old", now - Duration::days(10)))
            .unwrap();
        store.put_session(&SessionState::new("recent", now)).unwrap();

        let removed = clean_sessions(&store, Duration::days(7), now).unwrap();

        assert_eq!(removed, 1);
        assert!(store.get_session("old").unwrap().is_none());
        assert!(store.get_session("recent").unwrap().is_some());
    }

    #[test]
    fn recent_activity_keeps_old_session() {
        let store = MemoryBackend::new();
        let now = Utc::now();

        let mut state = SessionState::new("long-lived", now - Duration::days(30));
        state.record_activity(now - Duration::hours(1));
        store.put_session(&state).unwrap();

        assert_eq!(clean_sessions(&store, Duration::days(7), now).unwrap(), 0);
    }

    #[test]
    fn zero_age_removes_everything() {
        let store = MemoryBackend::new();
        let now = Utc::now();
        store.put_session(&SessionState::new("a", now)).unwrap();
        store.put_session(&SessionState::new("b", now)).unwrap();

        assert_eq!(clean_sessions(&store, Duration::zero(), now).unwrap(), 2);
    }
}
