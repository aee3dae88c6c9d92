//! Tracing subscriber setup for hosts and tests.

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Installs a global stdout subscriber at `level`.
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init_subscriber(level: Level) -> anyhow::Result<()> {
    Registry::default()
        .with(EnvFilter::new(level.as_str().to_lowercase()))
        .with(fmt::layer().with_target(true).with_line_number(true))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

/// Installs a subscriber that writes through the test harness, honouring
/// `RUST_LOG`. Repeated calls are no-ops.
pub fn init_test_subscriber() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = Registry::default()
        .with(filter)
        .with(fmt::layer().with_test_writer())
        .try_init();
}
