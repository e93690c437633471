//! Tracing subscriber set-up for host processes.

use tracing_subscriber::EnvFilter;

/// Installs a formatted tracing subscriber for the current process.
///
/// `RUST_LOG` takes precedence; `default_filter` applies when it is unset or
/// unparsable. Returns `false` when a global subscriber was already
/// installed, which is harmless in tests that initialize tracing repeatedly.
#[must_use]
pub fn init_tracing(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
