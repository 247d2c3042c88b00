//! Per-branch aggregation of recorded durations.

use crate::core::ledger::{DurationRecord, Ledger};
use std::collections::HashMap;

/// Which part of the store to aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    /// A single repository, by key.
    Repository(&'a str),
    /// Every repository, totals grouped by branch name alone.
    All,
}

/// Total time spent on one branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchTotal {
    /// Branch name.
    pub branch: String,
    /// Sum of interval lengths in whole seconds.
    pub seconds: i64,
}

/// Sum interval lengths per branch.
///
/// Results are ordered by total descending, then branch name ascending.
/// An unknown or empty repository yields an empty list.
#[must_use]
pub fn aggregate(ledger: &Ledger, scope: Scope<'_>, branch_filter: Option<&str>) -> Vec<BranchTotal> {
    let records: Box<dyn Iterator<Item = &DurationRecord>> = match scope {
        Scope::Repository(repository) => match ledger.repositories.get(repository) {
            Some(entry) => Box::new(entry.durations.iter()),
            None => return Vec::new(),
        },
        Scope::All => Box::new(ledger.repositories.values().flat_map(|e| e.durations.iter())),
    };

    let mut totals: HashMap<&str, i64> = HashMap::new();
    for record in records.filter(|r| branch_filter.is_none_or(|b| r.branch == b)) {
        *totals.entry(record.branch.as_str()).or_default() += record.seconds();
    }

    let mut result: Vec<BranchTotal> = totals
        .into_iter()
        .map(|(branch, seconds)| BranchTotal {
            branch: branch.to_string(),
            seconds,
        })
        .collect();
    result.sort_by(|a, b| b.seconds.cmp(&a.seconds).then_with(|| a.branch.cmp(&b.branch)));
    result
}

/// Render whole seconds as `Xh YYm` (or `Ym Zs` under an hour).
#[must_use]
pub fn format_seconds(seconds: i64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else {
        format!("{minutes}m {:02}s", seconds % 60)
    }
}
