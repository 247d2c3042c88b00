//! Repository and branch resolution.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Answers "which repository and branch is this shell on".
pub trait ContextResolver {
    /// Canonical top-level directory of the current repository, if any.
    fn repository_root(&self) -> Option<PathBuf>;

    /// Current branch name, or `None` on a detached HEAD.
    fn current_branch(&self) -> Option<String>;
}

/// Resolves context by asking the `git` binary about a working directory.
#[derive(Debug, Clone)]
pub struct GitResolver {
    cwd: PathBuf,
}

impl GitResolver {
    /// Resolve relative to `cwd`.
    #[must_use]
    pub fn new(cwd: &Path) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
        }
    }

    /// Run `git -C <cwd> <args>` and return trimmed stdout on success.
    fn git(&self, args: &[&str]) -> Option<String> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.cwd)
            .args(args)
            .output()
            .ok()
            .filter(|output| output.status.success())?;
        let text = String::from_utf8(output.stdout).ok()?;
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

impl ContextResolver for GitResolver {
    fn repository_root(&self) -> Option<PathBuf> {
        let root = PathBuf::from(self.git(&["rev-parse", "--show-toplevel"])?);
        Some(fs::canonicalize(&root).unwrap_or(root))
    }

    fn current_branch(&self) -> Option<String> {
        self.git(&["symbolic-ref", "--quiet", "--short", "HEAD"])
    }
}

/// A resolver with fixed answers, for tests and scripted callers.
#[derive(Debug, Clone, Default)]
pub struct FixedContext {
    /// Answer for `repository_root`.
    pub root: Option<PathBuf>,
    /// Answer for `current_branch`.
    pub branch: Option<String>,
}

impl FixedContext {
    /// Inside `root` on `branch`.
    #[must_use]
    pub fn new(root: &str, branch: &str) -> Self {
        Self {
            root: Some(PathBuf::from(root)),
            branch: Some(branch.to_string()),
        }
    }

    /// Outside any repository.
    #[must_use]
    pub fn outside() -> Self {
        Self::default()
    }
}

impl ContextResolver for FixedContext {
    fn repository_root(&self) -> Option<PathBuf> {
        self.root.clone()
    }

    fn current_branch(&self) -> Option<String> {
        self.branch.clone()
    }
}

/// Key a repository root is stored under.
#[must_use]
pub fn repository_key(root: &Path) -> String {
    root.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn fixed_context_answers() {
        let ctx = FixedContext::new("/src/app", "main");
        assert_eq!(ctx.repository_root(), Some(PathBuf::from("/src/app")));
        assert_eq!(ctx.current_branch(), Some("main".to_string()));
    }

    #[test]
    fn outside_has_no_answers() {
        let ctx = FixedContext::outside();
        assert!(ctx.repository_root().is_none());
        assert!(ctx.current_branch().is_none());
    }

    #[test]
    fn git_resolver_outside_repository() {
        // A fresh temp dir is not a repository (unless git is missing, which also yields None)
        let dir = TempDir::new().unwrap();
        let ctx = GitResolver::new(&dir.path().join("does-not-exist"));
        assert!(ctx.repository_root().is_none());
        assert!(ctx.current_branch().is_none());
    }

    #[test]
    fn repository_key_is_path_string() {
        assert_eq!(repository_key(Path::new("/src/app")), "/src/app");
    }
}
