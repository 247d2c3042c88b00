//! branchtime CLI - passive per-branch time tracking for git repositories.

use branchtime::cli;
use branchtime::config::{Config, load_config};
use branchtime::logging;
use branchtime::template::Shell;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Get the version string.
///
/// - Release builds (on a git tag): "0.1.0"
/// - Development builds: "0.1.0-dev (abc1234)"
/// - Dirty working directory: "0.1.0-dev (abc1234-dirty)"
fn version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("BRANCHTIME_GIT_HASH");
    const IS_RELEASE: &str = env!("BRANCHTIME_IS_RELEASE");

    static VERSION_STRING: std::sync::OnceLock<String> = std::sync::OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" {
            VERSION.to_string()
        } else {
            format!("{VERSION}-dev ({GIT_HASH})")
        }
    })
}

#[derive(Parser)]
#[command(name = "branchtime")]
#[command(author, version = version(), about = "Passive per-branch time tracking for git", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// [Internal] Run a shell hook. Called by the snippet from `init`.
    Hook {
        /// Hook name (session-start, activity, sample, session-end).
        name: String,

        /// Session ID, normally the shell PID.
        #[arg(long)]
        session: String,

        /// Working directory of the shell. Defaults to the current directory.
        #[arg(long)]
        cwd: Option<PathBuf>,
    },

    /// [User] Print the shell integration snippet.
    Init {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },

    /// [User] Show time per branch.
    Stats {
        /// Repository to report on. Defaults to the current one.
        #[arg(long, conflicts_with = "all")]
        repo: Option<PathBuf>,

        /// Report on every repository.
        #[arg(long)]
        all: bool,

        /// Only show this branch.
        #[arg(long)]
        branch: Option<String>,
    },

    /// [User] Export every recorded duration as JSON.
    Export {
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// [User] Delete recorded durations.
    Clear {
        /// Repository whose durations to delete.
        #[arg(long, conflicts_with = "all", required_unless_present = "all")]
        repo: Option<PathBuf>,

        /// Delete durations for every repository.
        #[arg(long)]
        all: bool,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// [User] Remove state left behind by shells that did not exit cleanly.
    Clean {
        /// Duration (e.g., "7d", "30d", "24h"). Defaults to the configured retention.
        #[arg(long)]
        before: Option<String>,

        /// Remove all sessions.
        #[arg(long)]
        all: bool,
    },

    /// [User] Show storage location, thresholds and the current context.
    Status {
        /// Also dump this session's state.
        #[arg(long)]
        session: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config() {
        Ok(config) => {
            logging::init(&config.logging.level);
            config
        }
        // Hooks keep tracking with defaults rather than break every prompt
        Err(e) if matches!(cli.command, Commands::Hook { .. }) => {
            logging::init("warn");
            tracing::warn!(error = %e, "ignoring unreadable config");
            Config::default()
        }
        Err(e) => {
            eprintln!("branchtime: error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Hook { name, session, cwd } => cli::hook::run(&config, &name, &session, cwd),
        Commands::Init { shell } => cli::init::run(&config, shell),
        Commands::Stats { repo, all, branch } => {
            cli::stats::run(&config, repo.as_deref(), all, branch.as_deref())
        }
        Commands::Export { output } => cli::export::run(&config, output.as_deref()),
        Commands::Clear { repo, all, yes } => cli::clear::run(&config, repo.as_deref(), all, yes),
        Commands::Clean { before, all } => cli::clean::run(&config, before.as_deref(), all),
        Commands::Status { session } => cli::status::run(&config, session.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("branchtime: error: {e}");
            ExitCode::FAILURE
        }
    }
}
