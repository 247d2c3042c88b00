//! In-memory storage backend for testing.

use crate::core::{Ledger, SessionState};
use crate::error::Result;
use crate::storage::traits::{DurationStore, SessionStore, SessionSummary};
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

/// In-memory storage backend for testing.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    ledger: Mutex<Ledger>,
    sessions: RwLock<HashMap<String, SessionState>>,
    fail_writes: Mutex<bool>,
}

impl MemoryBackend {
    /// Create a new in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent ledger write fail, as an unwritable disk would.
    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }
}

impl DurationStore for MemoryBackend {
    fn load(&self) -> Result<Ledger> {
        Ok(self.ledger.lock().unwrap().clone())
    }

    fn update(&self, apply: &mut dyn FnMut(&mut Ledger)) -> Result<()> {
        let mut ledger = self.ledger.lock().unwrap();
        let mut staged = ledger.clone();
        apply(&mut staged);
        if *self.fail_writes.lock().unwrap() {
            return Err(std::io::Error::new(std::io::ErrorKind::StorageFull, "disk full").into());
        }
        *ledger = staged;
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        *self.ledger.lock().unwrap() = Ledger::default();
        Ok(())
    }
}

impl SessionStore for MemoryBackend {
    fn get_session(&self, session_id: &str) -> Result<Option<SessionState>> {
        let sessions = self.sessions.read().unwrap();
        Ok(sessions.get(session_id).cloned())
    }

    fn put_session(&self, state: &SessionState) -> Result<()> {
        let mut sessions = self.sessions.write().unwrap();
        sessions.insert(state.session_id.clone(), state.clone());
        Ok(())
    }

    fn list_sessions(&self, limit: usize) -> Result<Vec<SessionSummary>> {
        let sessions = self.sessions.read().unwrap();
        let mut summaries: Vec<SessionSummary> = sessions
            .values()
            .map(|state| SessionSummary {
                session_id: state.session_id.clone(),
                created_at: state.created_at,
                last_seen: state.last_seen(),
            })
            .collect();

        summaries.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        summaries.truncate(limit);
        Ok(summaries)
    }

    fn delete_session(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().unwrap();
        sessions.remove(session_id);
        Ok(())
    }
}
