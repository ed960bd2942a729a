// Diagnostic logging setup.
// Installs a tracing subscriber that writes to stderr, filtered by RUST_LOG.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{GatewayError, Result};

/// Filter used when RUST_LOG is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber with the default filter.
pub fn init() -> Result<()> {
    init_with_default(DEFAULT_FILTER)
}

/// Install the global subscriber, falling back to `default_filter` when RUST_LOG is unset.
///
/// Fails if a global subscriber is already installed.
pub fn init_with_default(default_filter: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| GatewayError::Other(e.to_string()))
}
