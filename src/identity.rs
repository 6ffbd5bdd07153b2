//! Acting principal and locale context supplied by the caller's session.

use serde::{Deserialize, Serialize};

/// Language and currency the caller is working in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleContext {
    /// BCP 47 language tag (e.g., "en-US").
    pub language: String,
    /// ISO 4217 currency code (e.g., "USD").
    pub currency: String,
}

impl Default for LocaleContext {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            currency: "USD".to_string(),
        }
    }
}

/// The principal on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Customer identifier compared against `QuoteRecord::customer_id`.
    pub customer_id: String,
    /// Display name, snapshotted as the quote's employee name on submit.
    pub display_name: String,
    pub locale: LocaleContext,
}

impl Actor {
    pub fn new(customer_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            display_name: display_name.into(),
            locale: LocaleContext::default(),
        }
    }

    pub fn with_locale(mut self, locale: LocaleContext) -> Self {
        self.locale = locale;
        self
    }
}
