//! Mutation helpers applied to a locked working copy.
//!
//! None of these touch storage. The engine loads the record under its key
//! lock, calls one or more of these, and persists the result.

use super::{ProductInfo, QuoteFieldsPatch, QuoteItem, QuoteRecord, StageChange, Transition};
use crate::error::{QuoteError, Result};
use chrono::{DateTime, Utc};

impl QuoteRecord {
    /// Fail with `InvalidStage` when the quote is terminal.
    pub fn ensure_editable(&self, action: &str) -> Result<()> {
        if self.stage.is_terminal() {
            return Err(QuoteError::InvalidStage(format!(
                "cannot {} quote '{}' in stage {}",
                action, self.number, self.stage
            )));
        }
        Ok(())
    }

    /// Add `quantity` of `product`, merging into an existing line for the
    /// same product. Returns the affected line's id.
    pub fn add_product(&mut self, product: &ProductInfo, quantity: u32) -> Result<String> {
        self.ensure_editable("add items to")?;
        if quantity == 0 {
            return Err(QuoteError::InvalidInput(
                "quantity must be greater than 0".to_string(),
            ));
        }

        if let Some(line) = self
            .items
            .iter_mut()
            .find(|line| line.product_id == product.id)
        {
            line.quantity = line.quantity.checked_add(quantity).ok_or_else(|| {
                QuoteError::InvalidInput(format!("quantity overflow for product '{}'", product.id))
            })?;
            return Ok(line.id.clone());
        }

        self.next_line += 1;
        let id = format!("{}-L{}", self.number, self.next_line);
        self.items.push(QuoteItem {
            id: id.clone(),
            product_id: product.id.clone(),
            name: product.name.clone(),
            sku: product.sku.clone(),
            quantity,
            list_price: product.list_price,
            sale_price: product.effective_price(),
        });
        Ok(id)
    }

    /// Remove a line item.
    pub fn remove_item(&mut self, item_id: &str) -> Result<QuoteItem> {
        self.ensure_editable("remove items from")?;
        let position = self
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or_else(|| {
                QuoteError::NotFound(format!(
                    "item '{}' not found in quote '{}'",
                    item_id, self.number
                ))
            })?;
        Ok(self.items.remove(position))
    }

    /// Apply a field patch. Returns whether anything changed.
    ///
    /// The patch is validated in full before any field is written, so a
    /// rejected patch leaves the record untouched.
    pub fn apply_patch(&mut self, patch: &QuoteFieldsPatch) -> Result<bool> {
        if patch.is_empty() {
            return Ok(false);
        }
        self.ensure_editable("update")?;

        for (item_id, quantity) in &patch.item_quantities {
            if *quantity == 0 {
                return Err(QuoteError::InvalidInput(format!(
                    "quantity for item '{}' must be greater than 0",
                    item_id
                )));
            }
            if self.item(item_id).is_none() {
                return Err(QuoteError::NotFound(format!(
                    "item '{}' not found in quote '{}'",
                    item_id, self.number
                )));
            }
        }

        let before = self.clone();

        if let Some(comment) = &patch.comment {
            self.comment = Some(comment.clone()).filter(|c| !c.is_empty());
        }
        if let Some(tag) = &patch.tag {
            self.tag = Some(tag.clone()).filter(|t| !t.is_empty());
        }
        if let Some(address) = &patch.billing_address {
            self.billing_address = Some(address.clone());
        }
        if let Some(address) = &patch.shipping_address {
            self.shipping_address = Some(address.clone());
        }
        for item in &mut self.items {
            if let Some(quantity) = patch.item_quantities.get(&item.id) {
                item.quantity = *quantity;
            }
        }

        Ok(*self != before)
    }

    /// Move the record through `transition`.
    pub fn apply_transition(
        &mut self,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<StageChange> {
        let change = self.stage.next(transition).ok_or_else(|| {
            QuoteError::InvalidStage(format!(
                "cannot {} quote '{}' in stage {}",
                transition, self.number, self.stage
            ))
        })?;

        if let StageChange::Moved { to, .. } = change {
            self.stage = to;
            match transition {
                Transition::Submit => self.submitted_at = Some(now),
                Transition::Confirm => self.confirmed_at = Some(now),
                Transition::Reject => self.rejected_at = Some(now),
            }
        }
        Ok(change)
    }

    /// Submit the quote, capturing the submitting user's display name.
    pub fn submit(&mut self, employee_name: &str, now: DateTime<Utc>) -> Result<StageChange> {
        if self.items.is_empty() {
            return Err(QuoteError::EmptyQuote(self.number.clone()));
        }
        let change = self.apply_transition(Transition::Submit, now)?;
        if matches!(change, StageChange::Moved { .. }) {
            self.employee_name = Some(employee_name.to_string());
        }
        Ok(change)
    }

    /// Mirror the approval system's status. Returns whether it changed.
    ///
    /// Allowed in every stage.
    pub fn set_approval_status(&mut self, status: &str) -> bool {
        if self.approval_status == status {
            return false;
        }
        self.approval_status = status.to_string();
        true
    }
}
