//! `branchtime clear` command implementation.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::{DurationStore, FileBackend};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Run the clear command.
///
/// Asks for confirmation unless `yes` is set. A malformed store is only
/// replaced after a second, interactive confirmation.
///
/// # Errors
///
/// Returns an error if the store cannot be updated.
pub fn run(config: &Config, repo: Option<&Path>, all: bool, yes: bool) -> Result<()> {
    let store = FileBackend::new(config.storage.path.clone())?;
    let stdin = io::stdin();
    let mut input = stdin.lock();

    let message = match (repo, all) {
        (None, true) => clear_everything(&store, yes, &mut input)?,
        (Some(path), false) => {
            let key = fs::canonicalize(path)
                .unwrap_or_else(|_| path.to_path_buf())
                .to_string_lossy()
                .into_owned();
            clear_one(&store, &key, yes, &mut input)?
        }
        _ => {
            return Err(Error::InvalidArgument(
                "pass exactly one of --repo or --all".to_string(),
            ));
        }
    };
    println!("{message}");
    Ok(())
}

/// Clear one repository entry, after confirmation.
fn clear_one(
    store: &dyn DurationStore,
    key: &str,
    yes: bool,
    input: &mut dyn BufRead,
) -> Result<String> {
    if !yes && !confirm(&format!("Delete all recorded time for {key}?"), input)? {
        return Ok("Aborted.".to_string());
    }
    Ok(if store.clear_repository(key)? {
        format!("Cleared {key}.")
    } else {
        format!("No recorded time for {key}.")
    })
}

/// Clear every repository, after confirmation.
fn clear_everything(store: &dyn DurationStore, yes: bool, input: &mut dyn BufRead) -> Result<String> {
    if !yes && !confirm("Delete all recorded time for every repository?", input)? {
        return Ok("Aborted.".to_string());
    }

    match store.clear_all() {
        Ok(removed) => Ok(format!("Cleared {removed} repositories.")),
        Err(Error::MalformedStore { path, reason }) => {
            eprintln!("branchtime: store at {} is malformed: {reason}", path.display());
            if confirm("Discard the malformed store and start empty?", input)? {
                store.reset()?;
                Ok("Store reset.".to_string())
            } else {
                Ok("Aborted; malformed store left in place.".to_string())
            }
        }
        Err(e) => Err(e),
    }
}

/// Ask a yes/no question on stderr; anything but `y`/`yes` is a no.
fn confirm(question: &str, input: &mut dyn BufRead) -> Result<bool> {
    eprint!("{question} [y/N] ");
    io::stderr().flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
