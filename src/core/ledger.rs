//! Duration records and the merge-or-append algorithm.

use crate::core::timestamp;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A contiguous interval of time spent on one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationRecord {
    /// Branch the interval is attributed to.
    pub branch: String,

    /// Interval start.
    #[serde(with = "timestamp")]
    pub start: DateTime<Utc>,

    /// Interval end, never before `start`.
    #[serde(with = "timestamp")]
    pub end: DateTime<Utc>,
}

impl DurationRecord {
    /// Length of the interval in whole seconds.
    #[must_use]
    pub fn seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

/// All intervals recorded for one repository, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryEntry {
    /// Intervals, oldest insertion first.
    #[serde(default)]
    pub durations: Vec<DurationRecord>,
}

/// What `Ledger::record` did with a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// A new interval was appended.
    Appended,
    /// The branch's last interval was extended in place.
    Extended,
}

/// The whole persisted store: repository root path → entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    /// Entries keyed by canonical repository root.
    #[serde(default)]
    pub repositories: BTreeMap<String, RepositoryEntry>,
}

impl Ledger {
    /// Attribute `seconds` starting at `sample_start` to `branch` in `repository`.
    ///
    /// The most recently inserted interval of the same branch is extended when
    /// the sample starts no more than `merge_threshold` seconds after that
    /// interval's end. The extended end is always `sample_start + seconds`,
    /// so a gap inside the threshold becomes part of the interval. Intervals
    /// of other branches appended in between are skipped by the lookup.
    pub fn record(
        &mut self,
        repository: &str,
        branch: &str,
        sample_start: DateTime<Utc>,
        seconds: i64,
        merge_threshold: i64,
    ) -> MergeOutcome {
        let new_end = sample_start + Duration::seconds(seconds);
        let entry = self.repositories.entry(repository.to_string()).or_default();

        let last = entry.durations.iter_mut().rev().find(|d| d.branch == branch);
        if let Some(last) = last {
            let gap = (sample_start - last.end).num_seconds();
            if gap <= merge_threshold {
                // An out-of-order sample may land before the interval started.
                last.end = new_end.max(last.start);
                return MergeOutcome::Extended;
            }
        }

        entry.durations.push(DurationRecord {
            branch: branch.to_string(),
            start: sample_start,
            end: new_end,
        });
        MergeOutcome::Appended
    }

    /// Drop one repository entry. Returns whether it existed.
    pub fn clear_repository(&mut self, repository: &str) -> bool {
        self.repositories.remove(repository).is_some()
    }

    /// Drop every repository entry. Returns how many were removed.
    pub fn clear_all(&mut self) -> usize {
        let removed = self.repositories.len();
        self.repositories.clear();
        removed
    }

    /// Check invariants a hand-edited document could violate.
    ///
    /// # Errors
    ///
    /// Returns a description of the first offending record.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (repository, entry) in &self.repositories {
            for (index, record) in entry.durations.iter().enumerate() {
                if record.end < record.start {
                    return Err(format!(
                        "{repository}: record {index} on branch {:?} ends before it starts",
                        record.branch
                    ));
                }
            }
        }
        Ok(())
    }

    /// Total number of duration records across all repositories.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.repositories.values().map(|e| e.durations.len()).sum()
    }
}
