//! Monetary aggregates derived from quote items.

use super::QuoteItem;
use crate::error::{QuoteError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Pricing inputs that are not part of the record itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingContext {
    /// Currency assigned to newly created drafts.
    pub currency: String,
    /// Tax applied to the discounted subtotal, as a fraction (0.08 = 8%).
    pub tax_rate: Decimal,
}

impl Default for PricingContext {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            tax_rate: Decimal::ZERO,
        }
    }
}

/// Computed totals for a quote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub currency: String,
    /// Sum of list price times quantity.
    pub sub_total: Decimal,
    /// Sum of (list price - sale price) times quantity.
    pub discount_total: Decimal,
    pub tax_total: Decimal,
    pub grand_total: Decimal,
}

impl Totals {
    /// Compute totals for `items`. Deterministic for equal inputs.
    ///
    /// Fails with `InvalidInput` when an amount exceeds what a `Decimal`
    /// can hold.
    pub fn compute(currency: &str, items: &[QuoteItem], pricing: &PricingContext) -> Result<Self> {
        let mut sub_total = Decimal::ZERO;
        let mut discount_total = Decimal::ZERO;

        for item in items {
            let quantity = Decimal::from(item.quantity);
            let line_total = item.list_price.checked_mul(quantity);
            let line_discount = (item.list_price - item.sale_price)
                .max(Decimal::ZERO)
                .checked_mul(quantity);
            sub_total = line_total
                .and_then(|amount| sub_total.checked_add(amount))
                .ok_or_else(|| overflow(&item.id))?;
            discount_total = line_discount
                .and_then(|amount| discount_total.checked_add(amount))
                .ok_or_else(|| overflow(&item.id))?;
        }

        let taxable = sub_total - discount_total;
        let tax_total = taxable
            .checked_mul(pricing.tax_rate)
            .map(money)
            .ok_or_else(|| QuoteError::InvalidInput("tax total is out of range".to_string()))?;
        let sub_total = money(sub_total);
        let discount_total = money(discount_total);
        let grand_total = (sub_total - discount_total)
            .checked_add(tax_total)
            .ok_or_else(|| QuoteError::InvalidInput("grand total is out of range".to_string()))?;

        Ok(Self {
            currency: currency.to_string(),
            sub_total,
            discount_total,
            tax_total,
            grand_total,
        })
    }
}

fn overflow(item_id: &str) -> QuoteError {
    QuoteError::InvalidInput(format!("totals out of range at line '{}'", item_id))
}

fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
