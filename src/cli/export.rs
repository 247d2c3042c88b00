//! `branchtime export` command implementation.

use crate::config::Config;
use crate::core::{export, timestamp};
use crate::error::Result;
use crate::storage::{FileBackend, write_atomic};
use std::path::Path;

/// Run the export command.
///
/// Writes the whole store as pretty JSON to `output`, or stdout.
///
/// # Errors
///
/// Returns an error if the store cannot be read or the output written.
pub fn run(config: &Config, output: Option<&Path>) -> Result<()> {
    let store = FileBackend::open(config.storage.path.clone());
    let document = export(&store, timestamp::now())?;
    let json = serde_json::to_string_pretty(&document)?;

    match output {
        Some(path) => {
            write_atomic(path, format!("{json}\n").as_bytes())?;
            eprintln!(
                "Exported {} repositories to {}",
                document.repositories.len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}
