//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Default filter: the client core at debug, everything else at info.
const DEFAULT_FILTER: &str = "info,integrador=debug";

/// Initialize tracing/logging for the process.
///
/// Reads `RUST_LOG` when set; otherwise logs the integrador crates at
/// debug. Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // Compact console output; this core runs inside a client shell, not a
    // log-aggregated server fleet.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .with_target(false)
        .try_init();
}
