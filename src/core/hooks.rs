//! Hook handler implementations.

use crate::context::ContextResolver;
use crate::core::sampler::{SampleOutcome, Sampler, SamplingPolicy};
use crate::core::session::SessionState;
use crate::error::Result;
use crate::hooks::HookInput;
use crate::storage::{DurationStore, SessionStore};

/// Everything a hook handler needs besides its input.
pub struct HookContext<'a> {
    /// Sampling thresholds.
    pub policy: SamplingPolicy,
    /// Shared duration store.
    pub durations: &'a dyn DurationStore,
    /// Per-shell session state.
    pub sessions: &'a dyn SessionStore,
    /// Repository/branch lookup for the shell's working directory.
    pub resolver: &'a dyn ContextResolver,
}

/// Load the session, or start a fresh one at `input.now`.
fn load_or_create(input: &HookInput, sessions: &dyn SessionStore) -> Result<SessionState> {
    Ok(sessions
        .get_session(&input.session_id)?
        .unwrap_or_else(|| SessionState::new(&input.session_id, input.now)))
}

/// Handle the session-start hook.
///
/// Starts a fresh session, discarding state left behind by an earlier shell
/// that happened to have the same PID.
///
/// # Errors
///
/// Returns an error if the session cannot be saved.
pub fn handle_session_start(input: &HookInput, ctx: &HookContext<'_>) -> Result<SessionState> {
    if ctx.sessions.get_session(&input.session_id).ok().flatten().is_some() {
        tracing::debug!(session = %input.session_id, "replacing stale session state");
    }
    let state = SessionState::new(&input.session_id, input.now);
    ctx.sessions.put_session(&state)?;
    tracing::debug!(session = %input.session_id, "session started");
    Ok(state)
}

/// Handle the activity hook: the user just ran a command.
///
/// A due sample is taken first, so time spent idle at the prompt is judged
/// against the previous command rather than this one.
///
/// # Errors
///
/// Returns an error if the session cannot be loaded or saved.
pub fn handle_activity(input: &HookInput, ctx: &HookContext<'_>) -> Result<()> {
    let mut state = load_or_create(input, ctx.sessions)?;

    let sampler = Sampler::new(ctx.policy, ctx.resolver, ctx.durations);
    let outcome = sampler.maybe_sample(&mut state, input.now);
    tracing::debug!(session = %input.session_id, ?outcome, "sample pass before activity");

    state.record_activity(input.now);
    ctx.sessions.put_session(&state)
}

/// Handle the sample hook: sample if the check interval has elapsed.
///
/// The session is only written back when the pass changed it.
///
/// # Errors
///
/// Returns an error if the session cannot be loaded or saved. Duration
/// store failures are reported through [`SampleOutcome::Dropped`] instead.
pub fn handle_sample(input: &HookInput, ctx: &HookContext<'_>) -> Result<SampleOutcome> {
    let mut state = load_or_create(input, ctx.sessions)?;
    let before = state.clone();

    let sampler = Sampler::new(ctx.policy, ctx.resolver, ctx.durations);
    let outcome = sampler.maybe_sample(&mut state, input.now);
    tracing::debug!(session = %input.session_id, ?outcome, "sample pass");

    if state != before {
        ctx.sessions.put_session(&state)?;
    }
    Ok(outcome)
}

/// Handle the session-end hook: forget the shell's session state.
///
/// # Errors
///
/// Returns an error if the session file cannot be removed.
pub fn handle_session_end(input: &HookInput, ctx: &HookContext<'_>) -> Result<()> {
    ctx.sessions.delete_session(&input.session_id)?;
    tracing::debug!(session = %input.session_id, "session ended");
    Ok(())
}
