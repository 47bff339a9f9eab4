//! Tracing subscriber setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Overrides the default filter when set.
pub const LOG_ENV: &str = "METADATA_PROXY_LOG";

const DEFAULT_FILTER: &str = "metadata_proxy=info";

/// Install the global subscriber: `EnvFilter` + fmt layer.
///
/// Returns `false` when a global subscriber was already installed, so it is
/// safe to call from every test and every binary entry point.
pub fn init() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
