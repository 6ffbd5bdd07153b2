//! Tracing subscriber setup for the CLI.

use crate::config::LogLevel;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Directive used when `RUST_LOG` is unset.
pub fn default_directive(level: LogLevel, verbose: bool) -> &'static str {
    if verbose {
        LogLevel::Debug.as_str()
    } else {
        level.as_str()
    }
}

/// Install the global subscriber. Logs go to stderr without timestamps.
///
/// `RUST_LOG` wins over the configured level. A second call is a no-op.
pub fn init(level: LogLevel, verbose: bool) {
    let filter = default_directive(level, verbose);
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();
}
