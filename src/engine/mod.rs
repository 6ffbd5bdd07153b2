//! Quote Workflow Engine.
//!
//! Every operation against an existing quote runs as one unit:
//!
//! 1. acquire the quote's key lock
//! 2. load a fresh copy from the store
//! 3. check ownership on that copy
//! 4. mutate the working copy
//! 5. save it, if anything changed
//! 6. release the lock
//!
//! Side effects that talk to other systems (approval notification, cart
//! materialization) run after the save and after the lock is released.
//! Their failures are reported in the operation's outcome and never undo
//! the persisted transition.

use crate::approval::ApprovalClient;
use crate::cart::CartSink;
use crate::catalog::Catalog;
use crate::error::{QuoteError, Result};
use crate::identity::Actor;
use crate::locks::{KeyedLockGuard, KeyedLockRegistry, quote_lock_key};
use crate::ownership::assert_owner;
use crate::quote::{PricingContext, QuoteRecord, StageChange};
use crate::store::{QuoteStore, validate_quote_number};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

mod operations;


/// Serializes quote mutations per quote number.
pub struct QuoteEngine {
    store: Arc<dyn QuoteStore>,
    catalog: Arc<dyn Catalog>,
    carts: Arc<dyn CartSink>,
    approvals: Arc<dyn ApprovalClient>,
    locks: KeyedLockRegistry,
    pricing: PricingContext,
    /// `None` waits for a lock indefinitely.
    lock_wait: Option<Duration>,
}

// =============================================================================
// Outcomes
// =============================================================================

/// What happened to the approval notification sent on submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// The approval system answered with its identifier for the quote.
    Acknowledged { correlation_id: String },
    /// The call failed or the identifier was missing.
    Degraded { reason: String },
    /// Re-submit of an already submitted quote; nothing was sent.
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub quote: QuoteRecord,
    pub change: StageChange,
    pub notification: NotificationOutcome,
}

/// Result of handing a confirmed quote to the cart collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOutcome {
    Materialized,
    /// The quote is confirmed regardless.
    Failed { error: QuoteError },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmOutcome {
    pub quote: QuoteRecord,
    pub cart: CartOutcome,
}

impl ConfirmOutcome {
    /// Confirmed, but the cart could not be built.
    pub fn is_partial(&self) -> bool {
        matches!(self.cart, CartOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Updated { from: String, to: String },
    Unchanged,
}

// =============================================================================
// Construction
// =============================================================================

impl QuoteEngine {
    pub fn new(
        store: Arc<dyn QuoteStore>,
        catalog: Arc<dyn Catalog>,
        carts: Arc<dyn CartSink>,
        approvals: Arc<dyn ApprovalClient>,
    ) -> Self {
        Self {
            store,
            catalog,
            carts,
            approvals,
            locks: KeyedLockRegistry::new(),
            pricing: PricingContext::default(),
            lock_wait: None,
        }
    }

    pub fn with_pricing(mut self, pricing: PricingContext) -> Self {
        self.pricing = pricing;
        self
    }

    /// Give up waiting for a quote lock after `wait`.
    pub fn with_lock_wait(mut self, wait: Option<Duration>) -> Self {
        self.lock_wait = wait;
        self
    }

    pub fn approval_client(&self) -> &dyn ApprovalClient {
        self.approvals.as_ref()
    }

    pub fn locks(&self) -> &KeyedLockRegistry {
        &self.locks
    }

    // =========================================================================
    // Lock-scoped unit of work
    // =========================================================================

    fn lock(&self, key: &str) -> Result<KeyedLockGuard<'_>> {
        match self.lock_wait {
            None => Ok(self.locks.acquire(key)),
            Some(wait) => self
                .locks
                .acquire_timeout(key, wait)
                .ok_or_else(|| QuoteError::LockTimeout(key.to_string())),
        }
    }

    /// Run `body` against a freshly loaded, owner-checked copy of `number`
    /// while holding its key lock.
    ///
    /// `body` returns its value plus whether the record must be saved. A
    /// dirty record has its totals recomputed before the save; if `body` or
    /// that recomputation fails, nothing is saved. The returned record is the
    /// post-save state.
    fn with_quote<T, F>(&self, actor: &Actor, number: &str, body: F) -> Result<(T, QuoteRecord)>
    where
        F: FnOnce(&mut QuoteRecord) -> Result<(T, bool)>,
    {
        validate_quote_number(number)?;
        let _guard = self.lock(&quote_lock_key(number))?;

        let mut record = self.store.load(number, &actor.locale)?;
        assert_owner(&record, &actor.customer_id)?;
        record.recalculate(&self.pricing)?;

        let (value, dirty) = body(&mut record)?;
        if dirty {
            record.recalculate(&self.pricing)?;
            self.persist(&mut record)?;
        }
        Ok((value, record))
    }

    fn persist(&self, record: &mut QuoteRecord) -> Result<()> {
        let previous = record.modified_at;
        record.modified_at = Some(Utc::now());
        match self.store.save(record) {
            Ok(version) => {
                record.version = version;
                debug!(quote = %record.number, version, "quote persisted");
                Ok(())
            }
            Err(e) => {
                record.modified_at = previous;
                Err(e)
            }
        }
    }
}
