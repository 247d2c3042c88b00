//! branchtime - passive per-branch time tracking.
//!
//! Shell hooks report activity and periodically sample elapsed time. Each
//! sample is attributed to the current git branch and merged into a compact
//! list of intervals per repository, stored in a single locked JSON document.

pub mod cli;
pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod hooks;
pub mod logging;
pub mod storage;
pub mod template;

pub use config::Config;
pub use error::{Error, Result};
