//! Public engine operations.

use super::{
    CartOutcome, ConfirmOutcome, NotificationOutcome, QuoteEngine, ReconcileOutcome,
    SubmitOutcome,
};
use crate::approval::SubmittedQuote;
use crate::error::{QuoteError, Result};
use crate::identity::Actor;
use crate::locks::draft_lock_key;
use crate::quote::{QuoteFieldsPatch, QuoteRecord, QuoteStage, StageChange, Totals, Transition};
use crate::store::{SearchCriteria, SearchPage};
use chrono::Utc;
use tracing::{debug, info, warn};

/// Page size used when walking every quote of a customer.
const SCAN_PAGE_SIZE: usize = 100;

impl QuoteEngine {
    // =========================================================================
    // Reads
    // =========================================================================

    /// Search the actor's quotes. Each result is reloaded under its own lock.
    pub fn search(&self, actor: &Actor, criteria: &SearchCriteria) -> Result<SearchPage<QuoteRecord>> {
        let criteria = SearchCriteria {
            customer_id: actor.customer_id.clone(),
            ..criteria.clone()
        };
        let page = self.store.search(&criteria)?;

        let mut results = Vec::with_capacity(page.results.len());
        for number in &page.results {
            match self.get(actor, number) {
                Ok(record) => results.push(record),
                Err(QuoteError::NotFound(_)) => {
                    debug!(quote = %number, "quote vanished during search");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(SearchPage {
            results,
            total_count: page.total_count,
        })
    }

    /// Load one quote with fresh totals.
    pub fn get(&self, actor: &Actor, number: &str) -> Result<QuoteRecord> {
        let ((), record) = self.with_quote(actor, number, |_| Ok(((), false)))?;
        Ok(record)
    }

    /// Number of line items on a quote.
    pub fn items_count(&self, actor: &Actor, number: &str) -> Result<usize> {
        let (count, _) = self.with_quote(actor, number, |record| Ok((record.items_count(), false)))?;
        Ok(count)
    }

    /// Preview totals with `patch` applied. Never persists.
    pub fn calculate_totals(
        &self,
        actor: &Actor,
        number: &str,
        patch: &QuoteFieldsPatch,
    ) -> Result<Totals> {
        let pricing = self.pricing.clone();
        let (totals, _) = self.with_quote(actor, number, |record| {
            let mut preview = record.clone();
            preview.apply_patch(patch)?;
            preview.recalculate(&pricing)?;
            Ok((preview.totals, false))
        })?;
        Ok(totals)
    }

    /// Numbers of every quote the actor owns, newest first.
    pub fn customer_quote_numbers(&self, actor: &Actor) -> Result<Vec<String>> {
        let mut numbers = Vec::new();
        let mut page_number = 1;
        loop {
            let criteria = SearchCriteria::for_customer(actor.customer_id.clone())
                .with_page(page_number, SCAN_PAGE_SIZE);
            let page = self.store.search(&criteria)?;
            let fetched = page.results.len();
            numbers.extend(page.results);
            if fetched < SCAN_PAGE_SIZE || numbers.len() >= page.total_count {
                return Ok(numbers);
            }
            page_number += 1;
        }
    }

    // =========================================================================
    // Draft
    // =========================================================================

    /// The actor's open draft, created on first use.
    ///
    /// Creation runs under the customer's draft key so concurrent first
    /// mutations agree on one draft.
    pub fn current_draft(&self, actor: &Actor) -> Result<QuoteRecord> {
        let (record, _) = self.open_draft(actor)?;
        Ok(record)
    }

    /// [`current_draft`](Self::current_draft), also reporting whether this
    /// call created the draft.
    pub fn open_draft(&self, actor: &Actor) -> Result<(QuoteRecord, bool)> {
        let (number, created) = {
            let _guard = self.lock(&draft_lock_key(&actor.customer_id))?;
            let drafts = self.store.search(
                &SearchCriteria::for_customer(actor.customer_id.clone())
                    .with_stage(QuoteStage::Draft)
                    .with_page(1, 1),
            )?;
            match drafts.results.into_iter().next() {
                Some(number) => (number, false),
                None => (self.create_draft(actor)?, true),
            }
        };
        Ok((self.get(actor, &number)?, created))
    }

    fn create_draft(&self, actor: &Actor) -> Result<String> {
        let number = self.store.next_number()?;
        let record = QuoteRecord::new_draft(
            number.clone(),
            actor.customer_id.clone(),
            self.pricing.currency.clone(),
            actor.locale.language.clone(),
        );
        self.store.save(&record)?;
        info!(quote = %number, customer = %actor.customer_id, "draft created");
        Ok(number)
    }

    // =========================================================================
    // Item and field mutations
    // =========================================================================

    /// Add `quantity` of `product_ref`, merging with an existing line for the
    /// same product. Without a number, targets the actor's current draft.
    ///
    /// Returns the affected line id and the saved quote.
    pub fn add_item(
        &self,
        actor: &Actor,
        number: Option<&str>,
        product_ref: &str,
        quantity: u32,
    ) -> Result<(String, QuoteRecord)> {
        let number = match number {
            Some(number) => number.to_string(),
            None => self.current_draft(actor)?.number,
        };

        let (item_id, record) = self.with_quote(actor, &number, |record| {
            record.ensure_editable("add items to")?;
            let product = self.catalog.resolve(product_ref)?;
            let item_id = record.add_product(&product, quantity)?;
            Ok((item_id, true))
        })?;

        info!(quote = %record.number, item = %item_id, product = %product_ref, quantity, "item added");
        Ok((item_id, record))
    }

    pub fn remove_item(&self, actor: &Actor, number: &str, item_id: &str) -> Result<QuoteRecord> {
        let (removed, record) = self.with_quote(actor, number, |record| {
            let removed = record.remove_item(item_id)?;
            Ok((removed, true))
        })?;

        info!(quote = %record.number, item = %removed.id, product = %removed.product_id, "item removed");
        Ok(record)
    }

    /// Apply a partial update of the customer-editable fields.
    ///
    /// Returns whether anything changed; an unchanged quote is not saved.
    pub fn update(
        &self,
        actor: &Actor,
        number: &str,
        patch: &QuoteFieldsPatch,
    ) -> Result<(bool, QuoteRecord)> {
        let (changed, record) = self.with_quote(actor, number, |record| {
            record.ensure_editable("update")?;
            let changed = record.apply_patch(patch)?;
            Ok((changed, changed))
        })?;

        if changed {
            info!(quote = %record.number, "quote updated");
        }
        Ok((changed, record))
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Submit the quote, applying `patch` first.
    ///
    /// The first submit notifies the approval system after the save; a
    /// re-submit is a no-op and sends nothing.
    pub fn submit(&self, actor: &Actor, number: &str, patch: &QuoteFieldsPatch) -> Result<SubmitOutcome> {
        let (change, record) = self.with_quote(actor, number, |record| {
            if record.items.is_empty() {
                return Err(QuoteError::EmptyQuote(record.number.clone()));
            }
            let patched = record.apply_patch(patch)?;
            let change = record.submit(&actor.display_name, Utc::now())?;
            let dirty = patched || matches!(change, StageChange::Moved { .. });
            Ok((change, dirty))
        })?;

        let notification = match change {
            StageChange::Moved { .. } => {
                info!(quote = %record.number, employee = %actor.display_name, "quote submitted");
                self.notify_submitted(&record)
            }
            StageChange::Unchanged => {
                debug!(quote = %record.number, "quote already submitted");
                NotificationOutcome::Skipped
            }
        };

        Ok(SubmitOutcome {
            quote: record,
            change,
            notification,
        })
    }

    fn notify_submitted(&self, record: &QuoteRecord) -> NotificationOutcome {
        match self
            .approvals
            .notify_submitted(&SubmittedQuote::from_record(record))
        {
            Ok(response) => match response.correlation_id {
                Some(correlation_id) => {
                    info!(quote = %record.number, correlation_id = %correlation_id, "approval system notified");
                    NotificationOutcome::Acknowledged { correlation_id }
                }
                None => {
                    warn!(quote = %record.number, "approval notification returned no correlation id");
                    NotificationOutcome::Degraded {
                        reason: "approval system returned no correlation id".to_string(),
                    }
                }
            },
            Err(e) => {
                warn!(quote = %record.number, error = %e, "approval notification failed");
                NotificationOutcome::Degraded {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Confirm a submitted, non-empty quote, then materialize it as a cart.
    pub fn confirm(&self, actor: &Actor, number: &str, patch: &QuoteFieldsPatch) -> Result<ConfirmOutcome> {
        let ((), record) = self.with_quote(actor, number, |record| {
            record.apply_patch(patch)?;
            record.apply_transition(Transition::Confirm, Utc::now())?;
            if record.items.is_empty() {
                return Err(QuoteError::EmptyQuote(record.number.clone()));
            }
            Ok(((), true))
        })?;
        info!(quote = %record.number, "quote confirmed");

        let cart = match self.carts.materialize_from_quote(&record) {
            Ok(()) => CartOutcome::Materialized,
            Err(error) => {
                warn!(quote = %record.number, error = %error, "quote confirmed but cart materialization failed");
                CartOutcome::Failed { error }
            }
        };

        Ok(ConfirmOutcome {
            quote: record,
            cart,
        })
    }

    pub fn reject(&self, actor: &Actor, number: &str) -> Result<QuoteRecord> {
        let ((), record) = self.with_quote(actor, number, |record| {
            record.apply_transition(Transition::Reject, Utc::now())?;
            Ok(((), true))
        })?;
        info!(quote = %record.number, "quote rejected");
        Ok(record)
    }

    // =========================================================================
    // Approval status
    // =========================================================================

    /// Mirror the approval system's status onto the quote. Allowed in every
    /// stage; an unchanged status does not touch the store.
    pub fn reconcile_approval_status(
        &self,
        actor: &Actor,
        number: &str,
        external_status: &str,
    ) -> Result<ReconcileOutcome> {
        let (outcome, _) = self.with_quote(actor, number, |record| {
            let from = record.approval_status.clone();
            if !record.set_approval_status(external_status) {
                return Ok((ReconcileOutcome::Unchanged, false));
            }
            Ok((
                ReconcileOutcome::Updated {
                    from,
                    to: external_status.to_string(),
                },
                true,
            ))
        })?;
        Ok(outcome)
    }
}
