//! CLI command implementations.

pub mod clean;
pub mod clear;
pub mod export;
pub mod hook;
pub mod init;
pub mod stats;
pub mod status;
