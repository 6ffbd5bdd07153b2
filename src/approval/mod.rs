//! Approval system integration.
//!
//! The approval system owns each quote's approval status. quotedesk talks to
//! it in two ways:
//!
//! - **Poll**: one request per quote number; the status comes back in the
//!   `cpqStatus` response header.
//! - **Notify**: after a quote is first submitted, a snapshot of it is posted;
//!   the response may carry the approval system's own identifier in the
//!   `cpqQuoteNumber` header.
//!
//! [`ApprovalClient`] is the network seam. [`ApprovalSyncBridge`] drives the
//! poll side through the engine so each status write takes the quote's lock.

use crate::error::{QuoteError, Result};
use crate::quote::{QuoteRecord, QuoteStage};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

mod bridge;
mod http;


pub use bridge::{ApprovalSyncBridge, StatusChange, SyncFailure, SyncReport};
pub use http::HttpApprovalClient;

/// Response header carrying the approval status token.
pub const STATUS_HEADER: &str = "cpqStatus";

/// Response header carrying the approval system's identifier for a quote.
pub const CORRELATION_HEADER: &str = "cpqQuoteNumber";

/// Typed view of an approval-system response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalResponse {
    pub status: Option<String>,
    pub correlation_id: Option<String>,
}

impl ApprovalResponse {
    /// Build from a header lookup. Blank values count as absent.
    pub fn from_headers<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Self {
            status: read(STATUS_HEADER),
            correlation_id: read(CORRELATION_HEADER),
        }
    }

    /// The status token, or `ExternalSyncFailure` when the response has none.
    pub fn require_status(self, number: &str) -> Result<String> {
        self.status.ok_or_else(|| {
            QuoteError::ExternalSyncFailure(format!(
                "approval response for quote '{}' has no {} header",
                number, STATUS_HEADER
            ))
        })
    }
}

/// Outbound calls to the approval system.
pub trait ApprovalClient: Send + Sync {
    /// Ask for the current status of one quote.
    fn poll_status(&self, number: &str) -> Result<ApprovalResponse>;

    /// Tell the approval system a quote was submitted.
    fn notify_submitted(&self, quote: &SubmittedQuote) -> Result<ApprovalResponse>;
}

/// Client used when no approval endpoints are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredApprovalClient;

impl ApprovalClient for UnconfiguredApprovalClient {
    fn poll_status(&self, number: &str) -> Result<ApprovalResponse> {
        Err(QuoteError::ExternalSyncFailure(format!(
            "cannot poll quote '{}': approval.status_url is not configured",
            number
        )))
    }

    fn notify_submitted(&self, quote: &SubmittedQuote) -> Result<ApprovalResponse> {
        Err(QuoteError::ExternalSyncFailure(format!(
            "cannot notify submission of '{}': approval.notify_url is not configured",
            quote.number
        )))
    }
}

/// Snapshot of a submitted quote, posted to the approval system.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedQuote {
    pub id: String,
    pub number: String,
    pub customer_id: String,
    pub stage: QuoteStage,
    pub employee_name: Option<String>,
    pub currency: String,
    pub language: String,
    pub comment: Option<String>,
    pub tag: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub items: Vec<SubmittedItem>,
    pub sub_total: Decimal,
    pub discount_total: Decimal,
    pub tax_total: Decimal,
    pub grand_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedItem {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub sku: Option<String>,
    pub quantity: u32,
    pub list_price: Decimal,
    pub sale_price: Decimal,
}

impl SubmittedQuote {
    /// Capture `record` with its current totals.
    pub fn from_record(record: &QuoteRecord) -> Self {
        Self {
            id: record.id.clone(),
            number: record.number.clone(),
            customer_id: record.customer_id.clone(),
            stage: record.stage,
            employee_name: record.employee_name.clone(),
            currency: record.currency.clone(),
            language: record.language.clone(),
            comment: record.comment.clone(),
            tag: record.tag.clone(),
            submitted_at: record.submitted_at,
            items: record
                .items
                .iter()
                .map(|item| SubmittedItem {
                    id: item.id.clone(),
                    product_id: item.product_id.clone(),
                    name: item.name.clone(),
                    sku: item.sku.clone(),
                    quantity: item.quantity,
                    list_price: item.list_price,
                    sale_price: item.sale_price,
                })
                .collect(),
            sub_total: record.totals.sub_total,
            discount_total: record.totals.discount_total,
            tax_total: record.totals.tax_total,
            grand_total: record.totals.grand_total,
        }
    }
}
