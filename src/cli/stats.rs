//! `branchtime stats` command implementation.

use crate::config::Config;
use crate::context::{ContextResolver, GitResolver, repository_key};
use crate::core::{BranchTotal, Ledger, Scope, aggregate, format_seconds};
use crate::error::{Error, Result};
use crate::storage::{DurationStore, FileBackend};
use std::env;
use std::fmt::Write;
use std::fs;
use std::path::Path;

/// Width of the table rule.
const RULE_WIDTH: usize = 50;

/// Run the stats command.
///
/// Without `--repo` or `--all`, reports on the repository containing the
/// current directory.
///
/// # Errors
///
/// Returns an error if the store cannot be read, or no repository applies.
pub fn run(config: &Config, repo: Option<&Path>, all: bool, branch: Option<&str>) -> Result<()> {
    let store = FileBackend::open(config.storage.path.clone());
    let ledger = store.load()?;

    if all {
        print!("{}", render_all(&ledger, branch));
        return Ok(());
    }

    let root = match repo {
        Some(path) => fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()),
        None => GitResolver::new(&env::current_dir()?)
            .repository_root()
            .ok_or(Error::NotInRepository)?,
    };
    let key = repository_key(&root);
    let totals = aggregate(&ledger, Scope::Repository(&key), branch);
    print!("{}", render_table(&key, &totals));

    Ok(())
}

/// Cross-repository totals followed by one table per repository.
fn render_all(ledger: &Ledger, branch: Option<&str>) -> String {
    let totals = aggregate(ledger, Scope::All, branch);
    let mut out = render_table("All repositories", &totals);

    for repository in ledger.repositories.keys() {
        let totals = aggregate(ledger, Scope::Repository(repository), branch);
        if totals.is_empty() {
            continue;
        }
        out.push('\n');
        out.push_str(&render_table(repository, &totals));
    }
    out
}

/// Render one titled table of branch totals.
fn render_table(title: &str, totals: &[BranchTotal]) -> String {
    let mut out = String::new();
    if totals.is_empty() {
        let _ = writeln!(out, "{title}: no time recorded.");
        return out;
    }

    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "─".repeat(RULE_WIDTH));
    let _ = writeln!(out, "{:<36} {:>13}", "Branch", "Time");
    let _ = writeln!(out, "{}", "─".repeat(RULE_WIDTH));
    for total in totals {
        let _ = writeln!(out, "{:<36} {:>13}", total.branch, format_seconds(total.seconds));
    }
    let _ = writeln!(out, "{}", "─".repeat(RULE_WIDTH));
    let sum: i64 = totals.iter().map(|t| t.seconds).sum();
    let _ = writeln!(out, "{:<36} {:>13}", "Total", format_seconds(sum));
    out
}
