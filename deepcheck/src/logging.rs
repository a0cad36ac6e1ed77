//! Structured logging bootstrap

use tracing_subscriber::EnvFilter;

/// Environment variable consulted before `RUST_LOG`
pub const LOG_ENV: &str = "DEEPCHECK_LOG";

/// Install a global fmt subscriber
///
/// Filter precedence: `DEEPCHECK_LOG`, then `RUST_LOG`, then `debug` or
/// `info` depending on `debug`. Returns `false` if a global subscriber was
/// already installed.
pub fn init_logging(debug: bool) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
