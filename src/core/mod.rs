//! Time-accounting engine and hook logic.

pub mod export;
pub mod hooks;
pub mod ledger;
pub mod report;
pub mod sampler;
pub mod session;
pub mod timestamp;

pub use export::{ExportDocument, export};
pub use hooks::{handle_activity, handle_sample, handle_session_end, handle_session_start};
pub use ledger::{DurationRecord, Ledger, MergeOutcome, RepositoryEntry};
pub use report::{BranchTotal, Scope, aggregate, format_seconds};
pub use sampler::{SampleOutcome, Sampler, SamplingPolicy};
pub use session::SessionState;
