//! Tracing subscriber bootstrap
//!
//! One `EnvFilter`, plain or JSON formatting chosen by the caller.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `log_level` is a directive string
/// (`"info"`, `"spread_strategy=debug,info"`, ...); `json_logs` switches the
/// output formatter for machine-readable deployments.
pub fn init_logger(log_level: &str, json_logs: bool) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
