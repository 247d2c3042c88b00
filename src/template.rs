//! Shell integration snippets printed by `branchtime init`.

use clap::ValueEnum;
use std::fs;
use std::path::Path;

/// Shells with a built-in integration snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// zsh, via `add-zsh-hook`.
    Zsh,
    /// bash, via a DEBUG trap and `PROMPT_COMMAND`.
    Bash,
}

impl Shell {
    /// File name stem used for user overrides.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Zsh => "zsh",
            Self::Bash => "bash",
        }
    }

    fn default_template(self) -> &'static str {
        match self {
            Self::Zsh => DEFAULT_ZSH_TEMPLATE,
            Self::Bash => DEFAULT_BASH_TEMPLATE,
        }
    }
}

/// Default zsh integration.
pub const DEFAULT_ZSH_TEMPLATE: &str = r#"# branchtime shell integration (zsh)
if {{binary}} hook session-start --session $$ >/dev/null; then
  autoload -Uz add-zsh-hook
  _branchtime_preexec() { {{binary}} hook activity --session $$ >/dev/null }
  _branchtime_precmd() { {{binary}} hook sample --session $$ >/dev/null }
  _branchtime_exit() { {{binary}} hook session-end --session $$ >/dev/null }
  add-zsh-hook preexec _branchtime_preexec
  add-zsh-hook precmd _branchtime_precmd
  add-zsh-hook zshexit _branchtime_exit
else
  print -u2 "branchtime: store unavailable, time tracking disabled for this shell"
fi
"#;

/// Default bash integration.
pub const DEFAULT_BASH_TEMPLATE: &str = r#"# branchtime shell integration (bash)
if {{binary}} hook session-start --session $$ >/dev/null; then
  _branchtime_preexec() {
    [[ "$BASH_COMMAND" == _branchtime_* ]] && return
    {{binary}} hook activity --session $$ >/dev/null
  }
  _branchtime_precmd() { {{binary}} hook sample --session $$ >/dev/null; }
  trap '_branchtime_preexec' DEBUG
  trap '{{binary}} hook session-end --session $$ >/dev/null' EXIT
  PROMPT_COMMAND="_branchtime_precmd${PROMPT_COMMAND:+;$PROMPT_COMMAND}"
else
  echo "branchtime: store unavailable, time tracking disabled for this shell" >&2
fi
"#;

/// Load the snippet for `shell`.
///
/// `<base_dir>/shell/<shell>.sh` overrides the built-in snippet.
#[must_use]
pub fn load_template_from(shell: Shell, base_dir: &Path) -> String {
    let path = base_dir.join("shell").join(format!("{}.sh", shell.name()));

    match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => shell.default_template().to_string(),
    }
}

/// Substitute `{{binary}}` with the quoted path of the executable.
#[must_use]
pub fn render(template: &str, binary: &Path) -> String {
    template.replace("{{binary}}", &shell_quote(&binary.to_string_lossy()))
}

/// Single-quote a word for POSIX shells.
fn shell_quote(word: &str) -> String {
    if !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+".contains(c))
    {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', r"'\''"))
}
