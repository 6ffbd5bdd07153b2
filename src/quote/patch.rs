//! Partial updates of customer-editable quote fields.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Postal address attached to a quote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub name: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country_code: String,
}

/// Patch of customer-editable fields.
///
/// `None` leaves a field untouched. Identity, ownership and stage are not
/// representable here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteFieldsPatch {
    pub comment: Option<String>,
    pub tag: Option<String>,
    pub billing_address: Option<Address>,
    pub shipping_address: Option<Address>,
    /// New quantity per line item id.
    pub item_quantities: BTreeMap<String, u32>,
}

impl QuoteFieldsPatch {
    pub fn is_empty(&self) -> bool {
        self.comment.is_none()
            && self.tag.is_none()
            && self.billing_address.is_none()
            && self.shipping_address.is_none()
            && self.item_quantities.is_empty()
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_quantity(mut self, item_id: impl Into<String>, quantity: u32) -> Self {
        self.item_quantities.insert(item_id.into(), quantity);
        self
    }
}
