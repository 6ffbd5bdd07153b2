//! Config struct definition and default implementation.

use super::types::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Configuration for a quotedesk home.
///
/// This struct represents the contents of `<home>/config.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Locale and pricing
    // =========================================================================
    /// Currency assigned to new drafts (default: "USD").
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Language used when a stored quote carries none (default: "en-US").
    #[serde(default = "default_language")]
    pub language: String,

    /// Tax on the discounted subtotal, as a fraction in `[0, 1)`.
    #[serde(default = "default_tax_rate")]
    pub tax_rate: Decimal,

    // =========================================================================
    // Concurrency
    // =========================================================================
    /// Give up waiting for a quote lock after this many milliseconds.
    /// Unset waits indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_wait_timeout_ms: Option<u64>,

    // =========================================================================
    // Approval sync
    // =========================================================================
    /// Seconds between passes of `sync --watch`.
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,

    #[serde(default)]
    pub approval: ApprovalConfig,

    // =========================================================================
    // Logging
    // =========================================================================
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Approval system endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalConfig {
    /// Endpoint polled for a quote's status. Unset disables polling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_url: Option<String>,

    /// Endpoint notified on first submit. Unset disables notification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_url: Option<String>,

    #[serde(default = "default_approval_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            language: default_language(),
            tax_rate: default_tax_rate(),
            lock_wait_timeout_ms: None,
            sync_interval_secs: default_sync_interval_secs(),
            approval: ApprovalConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            status_url: None,
            notify_url: None,
            timeout_ms: default_approval_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}
