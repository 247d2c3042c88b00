//! Log output setup.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive, e.g. `debug` or `branchtime=trace`.
pub const LOG_ENV: &str = "BRANCHTIME_LOG";

/// Install the stderr subscriber.
///
/// `BRANCHTIME_LOG` wins over `default_level`. Safe to call more than once;
/// later calls are ignored.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // try_init: tests and embedders may have installed a subscriber already
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
