//! Logging initialization for dashboard hosts.
//!
//! Configures the `tracing` subscriber with level filtering via the
//! `OPS_DASHBOARD_LOG` environment variable. Falls back to `info` level when
//! the variable is unset.
//!
//! The crate itself only emits `tracing` events; calling this is optional
//! and a host with its own subscriber should skip it.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// Reads the `OPS_DASHBOARD_LOG` environment variable for filter directives
/// and falls back to `info` when it is unset or invalid. Output goes to
/// stderr.
///
/// # Panics
///
/// Panics if a global subscriber has already been set (call once, at host
/// startup).
pub fn init() {
    let filter =
        EnvFilter::try_from_env("OPS_DASHBOARD_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
