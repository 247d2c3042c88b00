//! Per-shell session state and idle detection.

use crate::core::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session state for one running shell, persisted between hook invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Session identifier (the shell's PID, as passed by the snippet).
    pub session_id: String,

    /// When the last sampling pass ran, recorded or suppressed.
    #[serde(with = "timestamp")]
    pub last_sample_at: DateTime<Utc>,

    /// When the user last issued a command.
    #[serde(with = "timestamp")]
    pub last_activity_at: DateTime<Utc>,

    /// When the session was created.
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl SessionState {
    /// Create a session that starts sampling and counting activity from `now`.
    #[must_use]
    pub fn new(session_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.to_string(),
            last_sample_at: now,
            last_activity_at: now,
            created_at: now,
        }
    }

    /// The user just ran a command.
    pub fn record_activity(&mut self, now: DateTime<Utc>) {
        self.last_activity_at = now;
    }

    /// Whether more than `idle_threshold` seconds passed since the last command.
    #[must_use]
    pub fn is_idle(&self, now: DateTime<Utc>, idle_threshold: i64) -> bool {
        (now - self.last_activity_at).num_seconds() > idle_threshold
    }

    /// Seconds elapsed since the last sampling pass.
    #[must_use]
    pub fn seconds_since_sample(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_sample_at).num_seconds()
    }

    /// Most recent of the two timestamps, used to age out abandoned sessions.
    #[must_use]
    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_sample_at.max(self.last_activity_at)
    }
}
