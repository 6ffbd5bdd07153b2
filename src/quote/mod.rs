//! Quote record model for quotedesk.
//!
//! A [`QuoteRecord`] is the unit of persistence and of locking. It is stored
//! as YAML by the file store; totals are never stored and are recomputed
//! from the items after every load and every mutation.
//!
//! # Record Format
//!
//! ```text
//! id: 6f1c...
//! number: Q-00001
//! customer_id: cust-1
//! stage: Submitted
//! approval_status: Processing
//! currency: USD
//! items:
//!   - id: Q-00001-L1
//!     product_id: P-100
//!     quantity: 5
//!     list_price: '12.00'
//!     sale_price: '10.00'
//! version: 3
//! ```

use crate::error::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

mod mutations;
mod patch;
mod stage;
mod totals;


pub use patch::{Address, QuoteFieldsPatch};
pub use stage::{QuoteStage, StageChange, Transition};
pub use totals::{PricingContext, Totals};

/// A negotiated price quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    // =========================================================================
    // Identity (immutable after creation)
    // =========================================================================
    /// Opaque stable identifier.
    pub id: String,

    /// Human-facing identifier, also the lock key and the approval-system key.
    pub number: String,

    /// Owner of the quote.
    pub customer_id: String,

    // =========================================================================
    // Workflow
    // =========================================================================
    pub stage: QuoteStage,

    /// Last status reported by the approval system. Free-form.
    #[serde(default)]
    pub approval_status: String,

    /// Snapshot of the acting user's display name at submit time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,

    // =========================================================================
    // Pricing context
    // =========================================================================
    pub currency: String,

    #[serde(default)]
    pub language: String,

    // =========================================================================
    // Lines
    // =========================================================================
    #[serde(default)]
    pub items: Vec<QuoteItem>,

    /// Counter backing line item identifiers; never decremented.
    #[serde(default)]
    pub next_line: u32,

    // =========================================================================
    // Customer-editable fields
    // =========================================================================
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,

    // =========================================================================
    // Lifecycle timestamps
    // =========================================================================
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<DateTime<Utc>>,

    // =========================================================================
    // Persistence
    // =========================================================================
    /// Optimistic version checked by the store on save.
    #[serde(default)]
    pub version: u64,

    /// Derived from `items`; recomputed, never persisted.
    #[serde(skip)]
    pub totals: Totals,
}

/// One line of a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteItem {
    /// Line identifier, `<number>-L<n>`.
    pub id: String,
    pub product_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub quantity: u32,
    pub list_price: Decimal,
    pub sale_price: Decimal,
}

/// Product data resolved from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub list_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Decimal>,
}

impl ProductInfo {
    /// Price actually charged: the sale price when present, else list.
    pub fn effective_price(&self) -> Decimal {
        self.sale_price.unwrap_or(self.list_price)
    }
}

impl QuoteRecord {
    /// Create an empty draft for `customer_id`.
    pub fn new_draft(
        number: impl Into<String>,
        customer_id: impl Into<String>,
        currency: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            number: number.into(),
            customer_id: customer_id.into(),
            stage: QuoteStage::Draft,
            approval_status: String::new(),
            employee_name: None,
            currency: currency.into(),
            language: language.into(),
            items: Vec::new(),
            next_line: 0,
            comment: None,
            tag: None,
            billing_address: None,
            shipping_address: None,
            created_at: Utc::now(),
            modified_at: None,
            submitted_at: None,
            confirmed_at: None,
            rejected_at: None,
            version: 0,
            totals: Totals::default(),
        }
    }

    /// Number of line items.
    pub fn items_count(&self) -> usize {
        self.items.len()
    }

    /// Find a line item by its identifier.
    pub fn item(&self, item_id: &str) -> Option<&QuoteItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Recompute `totals` from the current items. On error `totals` is
    /// left as it was.
    pub fn recalculate(&mut self, pricing: &PricingContext) -> Result<()> {
        self.totals = Totals::compute(&self.currency, &self.items, pricing)?;
        Ok(())
    }
}
