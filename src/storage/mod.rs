//! Storage backends for duration records and session state.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::{FileBackend, write_atomic};
pub use memory::MemoryBackend;
pub use traits::{DurationStore, SessionStore, SessionSummary};
