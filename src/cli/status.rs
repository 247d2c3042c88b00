//! `branchtime status` command implementation.

use crate::config::Config;
use crate::context::{ContextResolver, GitResolver, repository_key};
use crate::core::{Ledger, Scope, aggregate, format_seconds};
use crate::error::{Error, Result};
use crate::storage::{DurationStore, FileBackend, SessionStore};
use std::env;
use std::fmt::Write;

/// Run the status command.
///
/// Shows where data lives, the active thresholds, what the current
/// directory resolves to and, for `--session`, that shell's raw state.
///
/// # Errors
///
/// Returns an error if the store is unreadable or the session is unknown.
pub fn run(config: &Config, session_id: Option<&str>) -> Result<()> {
    let store = FileBackend::open(config.storage.path.clone());
    let resolver = GitResolver::new(&env::current_dir()?);
    let ledger = store.load()?;

    print!("{}", render_status(config, &store, &resolver, &ledger));

    if let Some(session_id) = session_id {
        let state = store
            .get_session(session_id)?
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        println!("\nSession {session_id}:");
        println!("{}", serde_json::to_string_pretty(&state)?);
    }

    Ok(())
}

fn render_status(
    config: &Config,
    store: &FileBackend,
    resolver: &dyn ContextResolver,
    ledger: &Ledger,
) -> String {
    let tracking = &config.tracking;
    let mut out = String::new();

    let _ = writeln!(out, "Store:           {}", store.durations_path().display());
    let _ = writeln!(out, "Repositories:    {}", ledger.repositories.len());
    let _ = writeln!(out, "Records:         {}", ledger.record_count());
    let _ = writeln!(out, "Check interval:  {}s", tracking.check_interval_seconds);
    let _ = writeln!(out, "Idle threshold:  {}s", tracking.idle_threshold_seconds);
    let _ = writeln!(out, "Merge threshold: {}s", tracking.merge_threshold_seconds);

    match (resolver.repository_root(), resolver.current_branch()) {
        (Some(root), branch) => {
            let key = repository_key(&root);
            let _ = writeln!(out, "Repository:      {key}");
            match branch {
                Some(branch) => {
                    let spent = aggregate(ledger, Scope::Repository(&key), Some(&branch))
                        .first()
                        .map_or(0, |t| t.seconds);
                    let _ = writeln!(
                        out,
                        "Branch:          {branch} ({})",
                        format_seconds(spent)
                    );
                }
                None => {
                    let _ = writeln!(out, "Branch:          (detached, not tracked)");
                }
            }
        }
        (None, _) => {
            let _ = writeln!(out, "Repository:      (none, not tracked)");
        }
    }
    out
}
