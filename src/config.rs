//! Configuration loading and management.
//!
//! Configuration is loaded with the following precedence:
//! 1. Environment variables (`BRANCHTIME_*`)
//! 2. Config file (`~/.branchtime/config.toml`)
//! 3. Defaults

use crate::error::{Error, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Deltas at or above this many seconds are treated as a suspend/resume gap.
pub const SLEEP_SUSPEND_BOUND_SECS: u64 = 3600;

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,

    /// Sampling and merging thresholds.
    pub tracking: TrackingConfig,

    /// Session file housekeeping.
    pub sessions: SessionsConfig,

    /// Log output.
    pub logging: LoggingConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the branchtime home directory.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_branchtime_home(),
        }
    }
}

/// Tracking configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TrackingConfig {
    /// Minimum spacing between two samples.
    pub check_interval_seconds: u64,

    /// Inactivity cutoff after which a sample is discarded as idle.
    pub idle_threshold_seconds: u64,

    /// Largest gap that still extends the previous interval of a branch.
    pub merge_threshold_seconds: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            check_interval_seconds: 600,
            idle_threshold_seconds: 1800,
            merge_threshold_seconds: 1800,
        }
    }
}

/// Session housekeeping configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// `clean` removes session files untouched for this many days.
    pub retention_days: u32,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self { retention_days: 7 }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `BRANCHTIME_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Get the default branchtime home directory.
fn default_branchtime_home() -> PathBuf {
    dirs::home_dir().map_or_else(|| PathBuf::from(".branchtime"), |h| h.join(".branchtime"))
}

/// Load configuration with precedence: env vars → file → defaults.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
pub fn load_config() -> Result<Config> {
    let mut config = Config::default();

    let config_path = get_config_path();
    if config_path.exists() {
        let contents = fs::read_to_string(&config_path).map_err(Error::Storage)?;
        config = toml::from_str(&contents).map_err(|e| Error::Config(e.to_string()))?;
    }

    apply_env_overrides(&mut config);

    Ok(config)
}

/// Get the path to the config file.
fn get_config_path() -> PathBuf {
    if let Ok(path) = env::var("BRANCHTIME_CONFIG") {
        return PathBuf::from(path);
    }

    if let Ok(home) = env::var("BRANCHTIME_HOME") {
        return PathBuf::from(home).join("config.toml");
    }

    default_branchtime_home().join("config.toml")
}

/// Apply environment variable overrides to config.
fn apply_env_overrides(config: &mut Config) {
    if let Ok(path) = env::var("BRANCHTIME_STORAGE_PATH") {
        config.storage.path = PathBuf::from(path);
    } else if let Ok(home) = env::var("BRANCHTIME_HOME") {
        config.storage.path = PathBuf::from(home);
    }

    override_seconds(
        "BRANCHTIME_CHECK_INTERVAL",
        &mut config.tracking.check_interval_seconds,
    );
    override_seconds(
        "BRANCHTIME_IDLE_THRESHOLD",
        &mut config.tracking.idle_threshold_seconds,
    );
    override_seconds(
        "BRANCHTIME_MERGE_THRESHOLD",
        &mut config.tracking.merge_threshold_seconds,
    );

    if let Ok(val) = env::var("BRANCHTIME_RETENTION_DAYS") {
        if let Ok(days) = val.parse() {
            config.sessions.retention_days = days;
        }
    }
}

fn override_seconds(var: &str, target: &mut u64) {
    if let Ok(val) = env::var(var) {
        match val.parse() {
            Ok(secs) => *target = secs,
            Err(_) => tracing::warn!(var, value = %val, "ignoring non-numeric override"),
        }
    }
}
