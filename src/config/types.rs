//! Configuration types and defaults for quotedesk.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Verbosity of the tracing subscriber when `RUST_LOG` is unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

pub fn default_currency() -> String {
    "USD".to_string()
}

pub fn default_language() -> String {
    "en-US".to_string()
}

pub fn default_tax_rate() -> Decimal {
    Decimal::ZERO
}

pub fn default_sync_interval_secs() -> u64 {
    300
}

pub fn default_approval_timeout_ms() -> u64 {
    10_000
}

pub fn default_user_agent() -> String {
    format!("quotedesk/{}", env!("CARGO_PKG_VERSION"))
}
