//! Tracing subscriber setup.

use crate::config::{LogFormat, ServerConfig};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured fallback filter. A subscriber that is
/// already installed (tests, embedding binaries) is left in place.
pub fn init_tracing(config: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));

    let result = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_current_span(true)
            .with_env_filter(filter)
            .try_init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_target(true)
            .with_env_filter(filter)
            .try_init(),
    };

    if let Err(e) = result {
        tracing::debug!("Tracing subscriber already initialized: {}", e);
    }
}
