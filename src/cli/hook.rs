//! `branchtime hook` command implementation.

use crate::config::Config;
use crate::context::GitResolver;
use crate::core::hooks::HookContext;
use crate::core::{SamplingPolicy, timestamp};
use crate::error::Result;
use crate::hooks::{HookInput, HookName, dispatch_hook};
use crate::storage::FileBackend;
use std::env;
use std::path::PathBuf;

/// Run a hook command.
///
/// Hooks run before every command and prompt, so apart from
/// `session-start` they never fail: problems are logged and the command
/// exits successfully.
///
/// # Errors
///
/// Returns an error only for `session-start`, when the store is unusable.
pub fn run(config: &Config, hook_name: &str, session_id: &str, cwd: Option<PathBuf>) -> Result<()> {
    let strict = hook_name.parse::<HookName>().ok() == Some(HookName::SessionStart);

    let cwd = cwd
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let prepared = HookInput::new(session_id, cwd, timestamp::now()).and_then(|input| {
        let store = FileBackend::new(config.storage.path.clone())?;
        if strict {
            store.probe()?;
        }
        Ok((input, store))
    });

    let (input, store) = match prepared {
        Ok(prepared) => prepared,
        Err(e) if strict => return Err(e),
        Err(e) => {
            tracing::warn!(hook = hook_name, error = %e, "hook skipped");
            return Ok(());
        }
    };

    let resolver = GitResolver::new(&input.cwd);
    let ctx = HookContext {
        policy: SamplingPolicy::from(&config.tracking),
        durations: &store,
        sessions: &store,
        resolver: &resolver,
    };
    dispatch_hook(hook_name, &input, &ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SessionStore;
    use tempfile::TempDir;

    fn config_at(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.storage.path = dir.path().join("home");
        config
    }

    #[test]
    fn session_start_creates_store_and_session() {
        let dir = TempDir::new().unwrap();
        let config = config_at(&dir);

        run(&config, "session-start", "321", Some(dir.path().to_path_buf())).unwrap();

        let store = FileBackend::new(config.storage.path.clone()).unwrap();
        assert!(store.get_session("321").unwrap().is_some());
    }

    #[test]
    fn session_start_rejects_bad_session_id() {
        let dir = TempDir::new().unwrap();
        let config = config_at(&dir);

        assert!(run(&config, "session-start", "../x", None).is_err());
    }

    #[test]
    fn other_hooks_fail_open() {
        let dir = TempDir::new().unwrap();
        let config = config_at(&dir);

        run(&config, "activity", "../x", None).unwrap();
        run(&config, "no-such-hook", "1", None).unwrap();
    }

    #[test]
    fn session_start_fails_when_home_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("home");
        std::fs::write(&blocker, "not a directory").unwrap();
        let config = config_at(&dir);

        assert!(run(&config, "session-start", "1", None).is_err());
        run(&config, "sample", "1", None).unwrap();
    }
}
