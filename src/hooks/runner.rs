//! Hook dispatch logic.

use crate::core::hooks::{
    HookContext, handle_activity, handle_sample, handle_session_end, handle_session_start,
};
use crate::error::{Error, Result};
use crate::hooks::HookInput;
use std::str::FromStr;

/// Hooks the shell integration installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookName {
    /// Shell startup.
    SessionStart,
    /// Before each command (preexec / DEBUG trap).
    Activity,
    /// Before each prompt (precmd / `PROMPT_COMMAND`).
    Sample,
    /// Shell exit.
    SessionEnd,
}

impl FromStr for HookName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "session-start" => Ok(Self::SessionStart),
            "activity" => Ok(Self::Activity),
            "sample" => Ok(Self::Sample),
            "session-end" => Ok(Self::SessionEnd),
            other => Err(Error::InvalidArgument(format!("unknown hook: {other}"))),
        }
    }
}

/// Dispatch a hook by name.
///
/// Only `session-start` reports failure to the caller, so the shell can
/// disable tracking once. Every other hook fails open: errors are logged and
/// the shell carries on.
///
/// # Errors
///
/// Returns an error only when `session-start` fails.
pub fn dispatch_hook(name: &str, input: &HookInput, ctx: &HookContext<'_>) -> Result<()> {
    let hook = match name.parse::<HookName>() {
        Ok(hook) => hook,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring hook");
            return Ok(());
        }
    };

    let result = match hook {
        HookName::SessionStart => return handle_session_start(input, ctx).map(|_| ()),
        HookName::Activity => handle_activity(input, ctx),
        HookName::Sample => handle_sample(input, ctx).map(|_| ()),
        HookName::SessionEnd => handle_session_end(input, ctx),
    };

    if let Err(e) = result {
        tracing::warn!(hook = name, session = %input.session_id, error = %e, "hook failed");
    }
    Ok(())
}
