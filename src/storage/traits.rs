//! Storage trait definitions.

use crate::core::{Ledger, MergeOutcome, SessionState};
use crate::error::Result;
use chrono::{DateTime, Utc};

/// Durable store of duration records shared by every shell.
pub trait DurationStore: Send + Sync {
    /// Read the current document. A missing document is an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or is malformed.
    fn load(&self) -> Result<Ledger>;

    /// Read-modify-write the document as one atomic step.
    ///
    /// Concurrent `update` calls are serialised; readers observe either the
    /// old or the new document, never a mix.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or cannot be published.
    /// The previous document is left untouched in that case.
    fn update(&self, apply: &mut dyn FnMut(&mut Ledger)) -> Result<()>;

    /// Replace the document with an empty ledger without reading it.
    ///
    /// Only for explicit, user-confirmed resets of a malformed document.
    ///
    /// # Errors
    ///
    /// Returns an error if the empty document cannot be published.
    fn reset(&self) -> Result<()>;

    /// Record one sample for `branch` in `repository`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    fn record(
        &self,
        repository: &str,
        branch: &str,
        sample_start: DateTime<Utc>,
        seconds: i64,
        merge_threshold: i64,
    ) -> Result<MergeOutcome> {
        let mut outcome = MergeOutcome::Appended;
        self.update(&mut |ledger: &mut Ledger| {
            outcome = ledger.record(repository, branch, sample_start, seconds, merge_threshold);
        })?;
        Ok(outcome)
    }

    /// Remove one repository's records. Returns whether the entry existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    fn clear_repository(&self, repository: &str) -> Result<bool> {
        let mut removed = false;
        self.update(&mut |ledger: &mut Ledger| removed = ledger.clear_repository(repository))?;
        Ok(removed)
    }

    /// Remove every repository entry. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    fn clear_all(&self) -> Result<usize> {
        let mut removed = 0;
        self.update(&mut |ledger: &mut Ledger| removed = ledger.clear_all())?;
        Ok(removed)
    }
}

/// Storage backend for per-shell session state.
pub trait SessionStore: Send + Sync {
    /// Get session state by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_session(&self, session_id: &str) -> Result<Option<SessionState>>;

    /// Save session state.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn put_session(&self, state: &SessionState) -> Result<()>;

    /// List sessions, most recently seen first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn list_sessions(&self, limit: usize) -> Result<Vec<SessionSummary>>;

    /// Delete a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn delete_session(&self, session_id: &str) -> Result<()>;
}

/// Summary information for a session.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    /// Session identifier.
    pub session_id: String,

    /// When the session was created.
    pub created_at: DateTime<Utc>,

    /// Latest sample or activity.
    pub last_seen: DateTime<Utc>,
}
