//! File-based storage backend.

use crate::core::{Ledger, SessionState};
use crate::error::{Error, Result};
use crate::storage::traits::{DurationStore, SessionStore, SessionSummary};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Name of the duration document inside the home directory.
const DURATIONS_FILE: &str = "durations.json";

/// How many times to try for the store lock before giving up.
const LOCK_ATTEMPTS: u32 = 100;

/// Pause between lock attempts.
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(20);

/// How many times to retry publishing a staged document.
const PUBLISH_ATTEMPTS: u32 = 3;

/// File-based storage backend with locked, atomic writes.
#[derive(Debug)]
pub struct FileBackend {
    base_dir: PathBuf,
}

impl FileBackend {
    /// Create a new file backend.
    ///
    /// Creates the home and sessions directories if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created.
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(base_dir.join("sessions"))?;
        Ok(Self { base_dir })
    }

    /// Open an existing home for reading without creating anything.
    ///
    /// A missing home reads as an empty store; writes through this handle
    /// fail until the home exists.
    #[must_use]
    pub fn open(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Path of the duration document.
    #[must_use]
    pub fn durations_path(&self) -> PathBuf {
        self.base_dir.join(DURATIONS_FILE)
    }

    /// Home directory this backend lives in.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Make sure the store can be locked and written.
    ///
    /// Used once per shell so an unusable store disables tracking up front
    /// rather than failing on every prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock cannot be taken or the home is read-only.
    pub fn probe(&self) -> Result<()> {
        let lock = self.acquire_lock()?;
        let probe = self.base_dir.join(format!(".probe.{}", std::process::id()));
        fs::write(&probe, b"")?;
        fs::remove_file(&probe)?;
        drop(lock);
        Ok(())
    }

    fn lock_path(&self) -> PathBuf {
        self.base_dir.join(format!("{DURATIONS_FILE}.lock"))
    }

    /// Get the path to a session file.
    fn session_path(&self, session_id: &str) -> PathBuf {
        self.base_dir
            .join("sessions")
            .join(format!("{session_id}.json"))
    }

    /// Take the exclusive store lock, retrying while another writer holds it.
    fn acquire_lock(&self) -> Result<StoreLock> {
        let path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        let contended = fs2::lock_contended_error().raw_os_error();

        for attempt in 1..=LOCK_ATTEMPTS {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(StoreLock { file }),
                Err(e) if e.raw_os_error() == contended => {
                    tracing::trace!(attempt, "store lock busy");
                    thread::sleep(LOCK_RETRY_DELAY);
                }
                Err(e) => return Err(Error::Storage(e)),
            }
        }

        Err(Error::LockTimeout {
            path,
            attempts: LOCK_ATTEMPTS,
        })
    }

    /// Read and validate the duration document. Caller decides about locking.
    fn read_ledger(&self) -> Result<Ledger> {
        let path = self.durations_path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Ledger::default()),
            Err(e) => return Err(Error::Storage(e)),
        };

        let ledger: Ledger =
            serde_json::from_str(&contents).map_err(|e| Error::MalformedStore {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        ledger
            .validate()
            .map_err(|reason| Error::MalformedStore { path, reason })?;
        Ok(ledger)
    }

    /// Stage the ledger next to the document and rename it into place.
    fn publish(&self, ledger: &Ledger) -> Result<()> {
        let contents = serde_json::to_string_pretty(ledger)?;
        write_atomic(&self.durations_path(), contents.as_bytes())
    }
}

/// Holds the store lock until dropped.
struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(error = %e, "failed to release store lock");
        }
    }
}

/// Write `contents` to `path` through a staging file and an atomic rename.
///
/// The rename is retried a bounded number of times. On failure the staging
/// file is removed and whatever was at `path` stays as it was.
///
/// # Errors
///
/// Returns an error if staging fails or every rename attempt fails.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staging = path.with_file_name(format!(".{file_name}.{}.tmp", std::process::id()));

    let staged = (|| -> std::io::Result<()> {
        let mut file = File::create(&staging)?;
        file.write_all(contents)?;
        file.sync_all()
    })();
    if let Err(e) = staged {
        let _ = fs::remove_file(&staging);
        return Err(Error::Storage(e));
    }

    let mut last_err = None;
    for attempt in 1..=PUBLISH_ATTEMPTS {
        match fs::rename(&staging, path) {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::debug!(attempt, error = %e, path = %path.display(), "rename failed");
                last_err = Some(e);
                thread::sleep(LOCK_RETRY_DELAY);
            }
        }
    }

    let _ = fs::remove_file(&staging);
    Err(Error::WriteFailed {
        path: path.to_path_buf(),
        attempts: PUBLISH_ATTEMPTS,
        source: last_err.unwrap_or_else(|| std::io::Error::other("rename never attempted")),
    })
}

impl DurationStore for FileBackend {
    fn load(&self) -> Result<Ledger> {
        self.read_ledger()
    }

    fn update(&self, apply: &mut dyn FnMut(&mut Ledger)) -> Result<()> {
        let _lock = self.acquire_lock()?;
        let mut ledger = self.read_ledger()?;
        apply(&mut ledger);
        self.publish(&ledger)
    }

    fn reset(&self) -> Result<()> {
        let _lock = self.acquire_lock()?;
        tracing::info!(path = %self.durations_path().display(), "resetting duration store");
        self.publish(&Ledger::default())
    }
}

impl SessionStore for FileBackend {
    fn get_session(&self, session_id: &str) -> Result<Option<SessionState>> {
        let path = self.session_path(session_id);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        let state: SessionState = serde_json::from_str(&contents)?;
        Ok(Some(state))
    }

    fn put_session(&self, state: &SessionState) -> Result<()> {
        let contents = serde_json::to_string_pretty(state)?;
        write_atomic(&self.session_path(&state.session_id), contents.as_bytes())
    }

    fn list_sessions(&self, limit: usize) -> Result<Vec<SessionSummary>> {
        let sessions_dir = self.base_dir.join("sessions");
        let mut sessions = Vec::new();

        if !sessions_dir.exists() {
            return Ok(sessions);
        }

        for entry in fs::read_dir(&sessions_dir)? {
            let entry = entry?;
            let path = entry.path();

            // Only .json files; staging files are dot-prefixed .tmp
            if path.extension().is_some_and(|e| e == "json") {
                if let Ok(contents) = fs::read_to_string(&path) {
                    if let Ok(state) = serde_json::from_str::<SessionState>(&contents) {
                        sessions.push(SessionSummary {
                            last_seen: state.last_seen(),
                            session_id: state.session_id,
                            created_at: state.created_at,
                        });
                    } else {
                        tracing::debug!(path = %path.display(), "skipping unreadable session file");
                    }
                }
            }
        }

        sessions.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        sessions.truncate(limit);
        Ok(sessions)
    }

    fn delete_session(&self, session_id: &str) -> Result<()> {
        let path = self.session_path(session_id);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_test_backend() -> (FileBackend, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path().to_path_buf()).unwrap();
        (backend, temp_dir)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap() + chrono::Duration::seconds(secs)
    }

    #[test]
    fn creates_sessions_directory() {
        let temp_dir = TempDir::new().unwrap();
        let _backend = FileBackend::new(temp_dir.path().to_path_buf()).unwrap();
        assert!(temp_dir.path().join("sessions").exists());
    }

    #[test]
    fn open_reads_without_creating_home() {
        let temp_dir = TempDir::new().unwrap();
        let home = temp_dir.path().join("home");
        let store = FileBackend::open(home.clone());

        assert_eq!(store.load().unwrap(), Ledger::default());
        assert!(store.get_session("1").unwrap().is_none());
        assert!(!home.exists());
    }

    #[test]
    fn missing_document_is_empty_ledger() {
        let (store, _temp) = create_test_backend();
        assert_eq!(store.load().unwrap(), Ledger::default());
    }

    #[test]
    fn record_persists_and_merges() {
        let (store, _temp) = create_test_backend();

        store.record("/repo", "main", at(0), 300, 1800).unwrap();
        store.record("/repo", "main", at(300), 300, 1800).unwrap();

        let ledger = store.load().unwrap();
        let records = &ledger.repositories["/repo"].durations;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].seconds(), 600);
    }

    #[test]
    fn document_uses_second_precision_utc() {
        let (store, _temp) = create_test_backend();
        store.record("/repo", "main", at(0), 61, 1800).unwrap();

        let contents = fs::read_to_string(store.durations_path()).unwrap();
        assert!(contents.contains("\"start\": \"2024-05-01T08:00:00Z\""));
        assert!(contents.contains("\"end\": \"2024-05-01T08:01:01Z\""));
    }

    #[test]
    fn reads_fractional_and_offset_timestamps() {
        let (store, _temp) = create_test_backend();
        fs::write(
            store.durations_path(),
            r#"{"repositories":{"/repo":{"durations":[
                {"branch":"main","start":"2024-05-01T08:00:00.250+00:00","end":"2024-05-01T08:10:00.900Z"}
            ]}}}"#,
        )
        .unwrap();

        let ledger = store.load().unwrap();
        let record = &ledger.repositories["/repo"].durations[0];
        assert_eq!(record.start, at(0));
        assert_eq!(record.end, at(600));
    }

    #[test]
    fn atomic_write_leaves_no_staging_file() {
        let (store, temp_dir) = create_test_backend();
        store.record("/repo", "main", at(0), 10, 1800).unwrap();

        let leftovers: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
        assert!(store.durations_path().exists());
    }

    #[test]
    fn malformed_document_fails_loudly_and_is_kept() {
        let (store, _temp) = create_test_backend();
        let garbage = "{ this is not json";
        fs::write(store.durations_path(), garbage).unwrap();

        assert!(matches!(store.load(), Err(Error::MalformedStore { .. })));
        let result = store.record("/repo", "main", at(0), 10, 1800);
        assert!(matches!(result, Err(Error::MalformedStore { .. })));
        assert!(matches!(store.clear_all(), Err(Error::MalformedStore { .. })));

        assert_eq!(fs::read_to_string(store.durations_path()).unwrap(), garbage);
    }

    #[test]
    fn inverted_record_is_malformed() {
        let (store, _temp) = create_test_backend();
        fs::write(
            store.durations_path(),
            r#"{"repositories":{"/repo":{"durations":[
                {"branch":"main","start":"2024-05-01T09:00:00Z","end":"2024-05-01T08:00:00Z"}
            ]}}}"#,
        )
        .unwrap();

        assert!(matches!(store.load(), Err(Error::MalformedStore { .. })));
    }

    #[test]
    fn reset_replaces_malformed_document() {
        let (store, _temp) = create_test_backend();
        fs::write(store.durations_path(), "not json").unwrap();

        store.reset().unwrap();
        assert_eq!(store.load().unwrap(), Ledger::default());
    }

    #[test]
    fn clear_repository_keeps_other_entries_byte_for_byte() {
        let (store, _temp) = create_test_backend();
        store.record("/a", "main", at(0), 100, 1800).unwrap();
        store.record("/b", "dev", at(7), 100, 1800).unwrap();
        store.record("/c", "main", at(9), 100, 1800).unwrap();

        let before = store.load().unwrap();
        let b_before = serde_json::to_string(&before.repositories["/b"]).unwrap();
        let c_before = serde_json::to_string(&before.repositories["/c"]).unwrap();

        assert!(store.clear_repository("/a").unwrap());

        let after = store.load().unwrap();
        assert!(!after.repositories.contains_key("/a"));
        assert_eq!(serde_json::to_string(&after.repositories["/b"]).unwrap(), b_before);
        assert_eq!(serde_json::to_string(&after.repositories["/c"]).unwrap(), c_before);
    }

    #[test]
    fn clear_all_empties_store() {
        let (store, _temp) = create_test_backend();
        store.record("/a", "main", at(0), 100, 1800).unwrap();
        store.record("/b", "main", at(0), 100, 1800).unwrap();

        assert_eq!(store.clear_all().unwrap(), 2);
        assert!(store.load().unwrap().repositories.is_empty());
    }

    #[test]
    fn concurrent_records_lose_no_updates() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().to_path_buf();

        let handles: Vec<_> = (0..4_i64)
            .map(|worker| {
                let base = base.clone();
                thread::spawn(move || {
                    let store = FileBackend::new(base).unwrap();
                    for i in 0..10_i64 {
                        // Gaps past the threshold so every call appends
                        store
                            .record("/shared", "main", at(i * 10_000 + worker), 1, 60)
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("Thread panicked");
        }

        let store = FileBackend::new(base).unwrap();
        assert_eq!(store.load().unwrap().record_count(), 40);
    }

    #[test]
    fn shared_backend_serialises_updates() {
        let (store, _temp) = create_test_backend();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..4)
            .map(|worker: i64| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let repo = format!("/repo-{worker}");
                    for i in 0..10 {
                        store.record(&repo, "main", at(i * 10), 10, 1800).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("Thread panicked");
        }

        let ledger = store.load().unwrap();
        assert_eq!(ledger.repositories.len(), 4);
        for entry in ledger.repositories.values() {
            assert_eq!(entry.durations.len(), 1);
            assert_eq!(entry.durations[0].seconds(), 100);
        }
    }

    #[test]
    fn probe_succeeds_on_writable_home() {
        let (store, _temp) = create_test_backend();
        store.probe().unwrap();
        assert!(store.lock_path().exists());
    }

    #[test]
    fn put_and_get_session() {
        let (store, _temp) = create_test_backend();
        let state = SessionState::new("1234", at(0));

        store.put_session(&state).unwrap();

        let retrieved = store.get_session("1234").unwrap().unwrap();
        assert_eq!(retrieved, state);
    }

    #[test]
    fn get_missing_session() {
        let (store, _temp) = create_test_backend();
        assert!(store.get_session("nonexistent").unwrap().is_none());
    }

    #[test]
    fn get_session_corrupted_returns_error() {
        let (store, temp_dir) = create_test_backend();
        let corrupted = temp_dir.path().join("sessions").join("corrupted.json");
        fs::write(&corrupted, "{ invalid }").unwrap();

        assert!(store.get_session("corrupted").is_err());
    }

    #[test]
    fn list_sessions_skips_corrupted_and_tmp_files() {
        let (store, temp_dir) = create_test_backend();
        store.put_session(&SessionState::new("1", at(0))).unwrap();
        store.put_session(&SessionState::new("2", at(60))).unwrap();

        let sessions_dir = temp_dir.path().join("sessions");
        fs::write(sessions_dir.join("broken.json"), "not json").unwrap();
        fs::write(sessions_dir.join("empty.json"), "").unwrap();
        fs::write(sessions_dir.join(".3.json.99.tmp"), "{}").unwrap();

        let sessions = store.list_sessions(10).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].session_id, "2"); // Most recent first
    }

    #[test]
    fn delete_session_removes_file() {
        let (store, temp_dir) = create_test_backend();
        store.put_session(&SessionState::new("77", at(0))).unwrap();

        let path = temp_dir.path().join("sessions").join("77.json");
        assert!(path.exists());

        store.delete_session("77").unwrap();
        assert!(!path.exists());
        store.delete_session("77").unwrap(); // Idempotent
    }

    /// Put a non-empty directory where `path`'s staging file would go.
    fn block_staging(path: &Path) -> PathBuf {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let staging = path.with_file_name(format!(".{name}.{}.tmp", std::process::id()));
        fs::create_dir(&staging).unwrap();
        fs::write(staging.join("inner"), "x").unwrap();
        staging
    }

    #[test]
    fn write_atomic_failure_keeps_previous_file() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("doc.json");
        fs::write(&target, "previous").unwrap();
        block_staging(&target);

        let result = write_atomic(&target, b"new");

        assert!(matches!(result, Err(Error::Storage(_))));
        assert_eq!(fs::read_to_string(&target).unwrap(), "previous");
    }

    #[test]
    fn write_atomic_reports_failed_rename() {
        let temp_dir = TempDir::new().unwrap();

        // Renaming a file over a non-empty directory fails
        let blocked = temp_dir.path().join("blocked");
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("inner"), "x").unwrap();
        let result = write_atomic(&blocked, b"new");

        assert!(matches!(result, Err(Error::WriteFailed { attempts: 3, .. })));
        assert!(blocked.join("inner").exists());
        assert!(
            !temp_dir
                .path()
                .join(format!(".blocked.{}.tmp", std::process::id()))
                .exists()
        );
    }

    #[test]
    fn failed_publish_keeps_durations_document() {
        let (store, _temp) = create_test_backend();
        store.record("/repo", "main", at(0), 600, 1800).unwrap();
        let before = fs::read(store.durations_path()).unwrap();

        let staging = block_staging(&store.durations_path());
        let result = store.record("/repo", "topic", at(600), 600, 1800);

        assert!(result.is_err());
        assert_eq!(fs::read(store.durations_path()).unwrap(), before);
        assert_eq!(store.load().unwrap().record_count(), 1);

        // The store recovers once the obstruction is gone
        fs::remove_dir_all(&staging).unwrap();
        store.record("/repo", "topic", at(600), 600, 1800).unwrap();
        assert_eq!(store.load().unwrap().record_count(), 2);
    }
}
