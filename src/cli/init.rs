//! `branchtime init` command implementation.

use crate::config::Config;
use crate::error::Result;
use crate::template::{Shell, load_template_from, render};
use std::env;

/// Print the shell integration snippet for `shell`.
///
/// Intended for `eval "$(branchtime init zsh)"` in the shell's rc file.
///
/// # Errors
///
/// Returns an error if the path of the running executable is unknown.
pub fn run(config: &Config, shell: Shell) -> Result<()> {
    let binary = env::current_exe()?;
    let template = load_template_from(shell, &config.storage.path);
    print!("{}", render(&template, &binary));
    Ok(())
}
