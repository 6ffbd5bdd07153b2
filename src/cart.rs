//! Cart materialization for confirmed quotes.
//!
//! After a confirmation is durably saved, its lines are handed to a
//! [`CartSink`]. The file sink merges them into `<home>/carts/<customer>.yaml`
//! and remembers which quotes it has already absorbed, so materializing the
//! same quote twice leaves the cart unchanged.

use crate::error::{QuoteError, Result};
use crate::fs::atomic_write_file;
use crate::quote::{QuoteRecord, QuoteStage};
use crate::store::is_safe_file_stem;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Receives confirmed quotes and turns them into purchasable carts.
pub trait CartSink: Send + Sync {
    fn materialize_from_quote(&self, quote: &QuoteRecord) -> Result<()>;
}

/// A customer's shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub customer_id: String,
    pub currency: String,
    #[serde(default)]
    pub lines: Vec<CartLine>,
    /// Quote numbers already merged into this cart.
    #[serde(default)]
    pub source_quotes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub quantity: u32,
    pub list_price: Decimal,
    pub sale_price: Decimal,
}

impl Cart {
    /// Merge the quote's lines. Returns false when the quote was merged before.
    pub fn merge_quote(&mut self, quote: &QuoteRecord) -> Result<bool> {
        if self.source_quotes.iter().any(|n| n == &quote.number) {
            return Ok(false);
        }
        if !self.lines.is_empty() && self.currency != quote.currency {
            return Err(QuoteError::InvalidInput(format!(
                "cart for '{}' is in {} but quote '{}' is in {}",
                self.customer_id, self.currency, quote.number, quote.currency
            )));
        }
        self.currency = quote.currency.clone();

        for item in &quote.items {
            match self
                .lines
                .iter_mut()
                .find(|line| line.product_id == item.product_id)
            {
                Some(line) => {
                    line.quantity = line.quantity.checked_add(item.quantity).ok_or_else(|| {
                        QuoteError::InvalidInput(format!(
                            "cart quantity overflow for product '{}'",
                            item.product_id
                        ))
                    })?;
                    // Negotiated price wins over whatever was in the cart.
                    line.list_price = item.list_price;
                    line.sale_price = item.sale_price;
                }
                None => self.lines.push(CartLine {
                    product_id: item.product_id.clone(),
                    name: item.name.clone(),
                    sku: item.sku.clone(),
                    quantity: item.quantity,
                    list_price: item.list_price,
                    sale_price: item.sale_price,
                }),
            }
        }
        self.source_quotes.push(quote.number.clone());
        Ok(true)
    }
}

/// Stores one YAML cart file per customer.
#[derive(Debug)]
pub struct FileCartSink {
    carts_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCartSink {
    pub fn new(carts_dir: impl Into<PathBuf>) -> Self {
        Self {
            carts_dir: carts_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn cart_path(&self, customer_id: &str) -> Result<PathBuf> {
        if !is_safe_file_stem(customer_id) {
            return Err(QuoteError::InvalidInput(format!(
                "customer id '{}' cannot name a cart file",
                customer_id
            )));
        }
        Ok(self.carts_dir.join(format!("{}.yaml", customer_id)))
    }

    /// Load a customer's cart, or an empty one.
    pub fn load(&self, customer_id: &str) -> Result<Cart> {
        let path = self.cart_path(customer_id)?;
        if !path.exists() {
            return Ok(Cart {
                customer_id: customer_id.to_string(),
                ..Cart::default()
            });
        }
        let content = std::fs::read_to_string(&path).map_err(|e| {
            QuoteError::UserError(format!("failed to read cart '{}': {}", path.display(), e))
        })?;
        serde_yaml::from_str(&content).map_err(|e| {
            QuoteError::UserError(format!("failed to parse cart '{}': {}", path.display(), e))
        })
    }
}

impl CartSink for FileCartSink {
    fn materialize_from_quote(&self, quote: &QuoteRecord) -> Result<()> {
        if quote.stage != QuoteStage::Confirmed {
            return Err(QuoteError::InvalidStage(format!(
                "only confirmed quotes become carts, '{}' is {}",
                quote.number, quote.stage
            )));
        }

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut cart = self.load(&quote.customer_id)?;
        if !cart.merge_quote(quote)? {
            debug!(quote = %quote.number, "quote already in cart");
            return Ok(());
        }
        cart.updated_at = Some(Utc::now());

        let yaml = serde_yaml::to_string(&cart)
            .map_err(|e| QuoteError::UserError(format!("failed to serialize cart: {}", e)))?;
        atomic_write_file(self.cart_path(&quote.customer_id)?, &yaml)?;

        debug!(quote = %quote.number, customer = %quote.customer_id, "cart materialized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::ProductInfo;
    use tempfile::TempDir;

    fn confirmed(number: &str, lines: &[(&str, u32)]) -> QuoteRecord {
        let mut quote = QuoteRecord::new_draft(number, "cust-1", "USD", "en-US");
        for (product, quantity) in lines {
            quote
                .add_product(
                    &ProductInfo {
                        id: product.to_string(),
                        name: product.to_string(),
                        sku: None,
                        list_price: "2.00".parse().unwrap(),
                        sale_price: None,
                    },
                    *quantity,
                )
                .unwrap();
        }
        quote.stage = QuoteStage::Confirmed;
        quote
    }

    #[test]
    fn test_materializes_quote_lines_into_cart() {
        let dir = TempDir::new().unwrap();
        let sink = FileCartSink::new(dir.path().join("carts"));

        sink.materialize_from_quote(&confirmed("Q-1", &[("P-100", 5), ("P-200", 1)]))
            .unwrap();

        let cart = sink.load("cust-1").unwrap();
        assert_eq!(cart.currency, "USD");
        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.lines[0].quantity, 5);
        assert_eq!(cart.source_quotes, vec!["Q-1".to_string()]);
        assert!(cart.updated_at.is_some());
    }

    #[test]
    fn test_repeated_materialization_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let sink = FileCartSink::new(dir.path().join("carts"));
        let quote = confirmed("Q-1", &[("P-100", 5)]);

        sink.materialize_from_quote(&quote).unwrap();
        sink.materialize_from_quote(&quote).unwrap();

        let cart = sink.load("cust-1").unwrap();
        assert_eq!(cart.lines[0].quantity, 5);
        assert_eq!(cart.source_quotes.len(), 1);
    }

    #[test]
    fn test_different_quotes_merge_by_product() {
        let dir = TempDir::new().unwrap();
        let sink = FileCartSink::new(dir.path().join("carts"));

        sink.materialize_from_quote(&confirmed("Q-1", &[("P-100", 5)]))
            .unwrap();
        sink.materialize_from_quote(&confirmed("Q-2", &[("P-100", 2)]))
            .unwrap();

        let cart = sink.load("cust-1").unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 7);
    }

    #[test]
    fn test_unconfirmed_quote_is_refused() {
        let dir = TempDir::new().unwrap();
        let sink = FileCartSink::new(dir.path().join("carts"));
        let mut quote = confirmed("Q-1", &[("P-100", 1)]);
        quote.stage = QuoteStage::Submitted;

        let err = sink.materialize_from_quote(&quote).unwrap_err();
        assert!(matches!(err, QuoteError::InvalidStage(_)));
        assert!(!dir.path().join("carts").exists());
    }

    #[test]
    fn test_currency_mismatch_is_rejected() {
        let mut cart = Cart {
            customer_id: "cust-1".into(),
            ..Cart::default()
        };
        cart.merge_quote(&confirmed("Q-1", &[("P-1", 1)])).unwrap();

        let mut euro = confirmed("Q-2", &[("P-2", 1)]);
        euro.currency = "EUR".into();
        assert!(cart.merge_quote(&euro).is_err());
        assert_eq!(cart.source_quotes, vec!["Q-1".to_string()]);
    }
}
