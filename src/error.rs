//! Error types for branchtime.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for branchtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in branchtime operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage I/O error.
    #[error("Storage error: {0}")]
    Storage(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The durations document exists but cannot be trusted.
    #[error("Malformed store at {}: {reason}", path.display())]
    MalformedStore {
        /// Path of the offending document.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// Another writer held the store lock for too long.
    #[error("Store is locked by another writer ({attempts} attempts): {}", path.display())]
    LockTimeout {
        /// Path of the lock file.
        path: PathBuf,
        /// How many lock attempts were made.
        attempts: u32,
    },

    /// Publishing the staged document failed on every attempt.
    #[error("Failed to publish {} after {attempts} attempts: {source}", path.display())]
    WriteFailed {
        /// Destination path.
        path: PathBuf,
        /// How many publish attempts were made.
        attempts: u32,
        /// Last underlying error.
        source: io::Error,
    },

    /// Session identifier unusable as a file name.
    #[error("Invalid session id: {0:?}")]
    InvalidSessionId(String),

    /// Session not found.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// The working directory is not inside a git repository.
    #[error("Not inside a git repository")]
    NotInRepository,

    /// Invalid command-line argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
