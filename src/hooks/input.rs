//! Hook input parsing.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Session ids become file names, so keep them to a safe alphabet.
static SESSION_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._-]{1,64}$").unwrap_or_else(|e| panic!("bad session id pattern: {e}"))
});

/// Input received from a shell hook invocation.
#[derive(Debug, Clone)]
pub struct HookInput {
    /// Session identifier (normally the shell PID).
    pub session_id: String,

    /// Shell working directory at the time of the hook.
    pub cwd: PathBuf,

    /// When the hook fired.
    pub now: DateTime<Utc>,
}

impl HookInput {
    /// Build hook input, rejecting session ids that are unsafe as file names.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSessionId` for empty, overlong or path-like ids.
    pub fn new(session_id: &str, cwd: PathBuf, now: DateTime<Utc>) -> Result<Self> {
        if !SESSION_ID.is_match(session_id) || session_id.chars().all(|c| c == '.') {
            return Err(Error::InvalidSessionId(session_id.to_string()));
        }
        Ok(Self {
            session_id: session_id.to_string(),
            cwd,
            now,
        })
    }
}
