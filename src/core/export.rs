//! Self-contained snapshot of the whole store.

use crate::core::ledger::{Ledger, RepositoryEntry};
use crate::core::timestamp;
use crate::error::Result;
use crate::storage::DurationStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every stored record, verbatim, plus when the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    /// Generation time.
    #[serde(with = "timestamp")]
    pub exported: DateTime<Utc>,

    /// Repository key → its intervals, in key order.
    pub repositories: BTreeMap<String, RepositoryEntry>,
}

impl ExportDocument {
    /// Wrap a ledger as it is at `exported`.
    #[must_use]
    pub fn from_ledger(ledger: Ledger, exported: DateTime<Utc>) -> Self {
        Self {
            exported,
            repositories: ledger.repositories,
        }
    }

    /// The ledger this snapshot describes.
    #[must_use]
    pub fn into_ledger(self) -> Ledger {
        Ledger {
            repositories: self.repositories,
        }
    }
}

/// Read the current store and wrap it for export.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn export(store: &dyn DurationStore, now: DateTime<Utc>) -> Result<ExportDocument> {
    Ok(ExportDocument::from_ledger(store.load()?, now))
}
