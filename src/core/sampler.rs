//! Periodic sampling: turn elapsed time into recorded durations.
//!
//! A sample is taken at most once per check interval. Each sample either
//! records the time since the previous one, or discards it because the user
//! was idle or because the gap is too large to be anything but a suspended
//! machine.

use crate::config::{SLEEP_SUSPEND_BOUND_SECS, TrackingConfig};
use crate::context::{ContextResolver, repository_key};
use crate::core::ledger::MergeOutcome;
use crate::core::session::SessionState;
use crate::storage::DurationStore;
use chrono::{DateTime, Duration, Utc};

/// Thresholds the sampler works with, in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPolicy {
    /// Minimum spacing between samples.
    pub check_interval: i64,
    /// Inactivity cutoff.
    pub idle_threshold: i64,
    /// Largest gap merged into a branch's previous interval.
    pub merge_threshold: i64,
    /// Deltas at or above this are dropped as suspend/resume gaps.
    pub sleep_suspend_bound: i64,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self::from(&TrackingConfig::default())
    }
}

impl From<&TrackingConfig> for SamplingPolicy {
    fn from(config: &TrackingConfig) -> Self {
        Self {
            check_interval: saturating_secs(config.check_interval_seconds),
            idle_threshold: saturating_secs(config.idle_threshold_seconds),
            merge_threshold: saturating_secs(config.merge_threshold_seconds),
            sleep_suspend_bound: saturating_secs(SLEEP_SUSPEND_BOUND_SECS),
        }
    }
}

fn saturating_secs(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

/// What a sampling pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleOutcome {
    /// The check interval has not elapsed yet.
    NotDue,
    /// Not inside a repository, or no branch name. Nothing advanced.
    NoContext,
    /// The user was idle; the elapsed time was discarded.
    Idle,
    /// The delta looked like a suspend/resume or clock jump and was discarded.
    Discontinuity {
        /// The discarded delta.
        seconds: i64,
    },
    /// The delta was attributed to a branch.
    Recorded {
        /// Repository key.
        repository: String,
        /// Branch name.
        branch: String,
        /// Seconds recorded.
        seconds: i64,
        /// Whether an interval was appended or extended.
        merge: MergeOutcome,
    },
    /// The store rejected the write; the sample is lost.
    Dropped {
        /// Why the write failed.
        reason: String,
    },
}

/// Drives samples for one shell session.
pub struct Sampler<'a> {
    policy: SamplingPolicy,
    resolver: &'a dyn ContextResolver,
    store: &'a dyn DurationStore,
}

impl<'a> Sampler<'a> {
    /// Build a sampler over a resolver and a store.
    #[must_use]
    pub fn new(
        policy: SamplingPolicy,
        resolver: &'a dyn ContextResolver,
        store: &'a dyn DurationStore,
    ) -> Self {
        Self {
            policy,
            resolver,
            store,
        }
    }

    /// Sample if at least one check interval passed since the last sample.
    pub fn maybe_sample(&self, session: &mut SessionState, now: DateTime<Utc>) -> SampleOutcome {
        if session.seconds_since_sample(now) < self.policy.check_interval {
            return SampleOutcome::NotDue;
        }
        self.sample(session, now)
    }

    /// Take one sample unconditionally.
    ///
    /// Store failures never propagate: they are logged and reported as
    /// [`SampleOutcome::Dropped`], and the session still moves forward.
    pub fn sample(&self, session: &mut SessionState, now: DateTime<Utc>) -> SampleOutcome {
        let Some(root) = self.resolver.repository_root() else {
            return SampleOutcome::NoContext;
        };
        let Some(branch) = self.resolver.current_branch() else {
            return SampleOutcome::NoContext;
        };

        if session.is_idle(now, self.policy.idle_threshold) {
            session.last_activity_at = now;
            session.last_sample_at = now;
            return SampleOutcome::Idle;
        }

        let delta = session.seconds_since_sample(now);
        let outcome = if delta >= self.policy.sleep_suspend_bound || delta < 0 {
            SampleOutcome::Discontinuity { seconds: delta }
        } else {
            let repository = repository_key(&root);
            let sample_start = now - Duration::seconds(delta);
            match self.store.record(
                &repository,
                &branch,
                sample_start,
                delta,
                self.policy.merge_threshold,
            ) {
                Ok(merge) => SampleOutcome::Recorded {
                    repository,
                    branch,
                    seconds: delta,
                    merge,
                },
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        repository = %repository,
                        branch = %branch,
                        seconds = delta,
                        "sample dropped"
                    );
                    SampleOutcome::Dropped {
                        reason: e.to_string(),
                    }
                }
            }
        };

        session.last_sample_at = now;
        outcome
    }
}
