//! Hook input types and dispatch.

pub mod input;
pub mod runner;

pub use input::HookInput;
pub use runner::{HookName, dispatch_hook};
