//! Tracing subscriber setup shared by every binary embedding the engine.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Filter used when neither config nor `RUST_LOG` provides one.
pub const DEFAULT_FILTER: &str = "tally=info";

/// Install a global fmt subscriber.
///
/// `RUST_LOG` wins over `filter`, which wins over [`DEFAULT_FILTER`].
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(filter: Option<&str>) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// [`init_tracing`] with the `[logging]` section's filter.
pub fn init_from_config(config: &LoggingConfig) -> bool {
    init_tracing(Some(config.effective_filter()))
}
