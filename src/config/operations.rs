//! Config loading, validation, and derived settings.

use super::model::Config;
use crate::error::{QuoteError, Result};
use crate::identity::LocaleContext;
use crate::quote::PricingContext;
use rust_decimal::Decimal;
use std::path::Path;
use std::time::Duration;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(QuoteError::UserError)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            QuoteError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load config, falling back to defaults when the file does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty file is a valid, all-defaults config.
        let config: Config = if yaml.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|e| {
                QuoteError::UserError(format!("failed to parse config YAML: {}", e))
            })?
        };

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            QuoteError::UserError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `currency` and `language` must be non-empty
    /// - `tax_rate` must be in `[0, 1)`
    /// - `lock_wait_timeout_ms`, `sync_interval_secs` and `approval.timeout_ms`
    ///   must be positive
    /// - approval URLs, when set, must be http(s)
    pub fn validate(&self) -> Result<()> {
        if self.currency.trim().is_empty() {
            return Err(invalid("currency must be non-empty"));
        }
        if self.language.trim().is_empty() {
            return Err(invalid("language must be non-empty"));
        }

        if self.tax_rate < Decimal::ZERO || self.tax_rate >= Decimal::ONE {
            return Err(QuoteError::UserError(format!(
                "config validation failed: tax_rate must be at least 0 and below 1 (found {})",
                self.tax_rate
            )));
        }

        if self.lock_wait_timeout_ms == Some(0) {
            return Err(invalid("lock_wait_timeout_ms must be greater than 0"));
        }
        if self.sync_interval_secs == 0 {
            return Err(invalid("sync_interval_secs must be greater than 0"));
        }
        if self.approval.timeout_ms == 0 {
            return Err(invalid("approval.timeout_ms must be greater than 0"));
        }

        for (field, url) in [
            ("approval.status_url", &self.approval.status_url),
            ("approval.notify_url", &self.approval.notify_url),
        ] {
            if let Some(url) = url
                && !(url.starts_with("http://") || url.starts_with("https://"))
            {
                return Err(QuoteError::UserError(format!(
                    "config validation failed: {} must be an http(s) URL (found '{}')",
                    field, url
                )));
            }
        }

        Ok(())
    }

    // =========================================================================
    // Derived settings
    // =========================================================================

    pub fn pricing(&self) -> PricingContext {
        PricingContext {
            currency: self.currency.clone(),
            tax_rate: self.tax_rate,
        }
    }

    pub fn locale(&self) -> LocaleContext {
        LocaleContext {
            language: self.language.clone(),
            currency: self.currency.clone(),
        }
    }

    pub fn lock_wait(&self) -> Option<Duration> {
        self.lock_wait_timeout_ms.map(Duration::from_millis)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    pub fn approval_timeout(&self) -> Duration {
        Duration::from_millis(self.approval.timeout_ms)
    }

    /// Whether any approval endpoint is configured.
    pub fn approval_enabled(&self) -> bool {
        self.approval.status_url.is_some() || self.approval.notify_url.is_some()
    }
}

fn invalid(message: &str) -> QuoteError {
    QuoteError::UserError(format!("config validation failed: {}", message))
}
