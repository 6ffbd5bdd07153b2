//! Approval Sync Bridge.
//!
//! Polls the approval system once per quote and feeds any changed status
//! into [`QuoteEngine::reconcile_approval_status`], the same entry point the
//! CLI uses, so every status write is serialized with user mutations on the
//! quote's key lock. A failed poll or reconcile is recorded and the batch
//! moves on.

use super::ApprovalClient;
use crate::engine::{QuoteEngine, ReconcileOutcome};
use crate::error::{QuoteError, Result};
use crate::identity::Actor;
use tracing::{info, warn};

/// A status written by the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub number: String,
    pub from: String,
    pub to: String,
}

/// A quote the bridge could not reconcile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub number: String,
    pub error: QuoteError,
}

/// Outcome of one sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub updated: Vec<StatusChange>,
    pub unchanged: Vec<String>,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    pub fn processed(&self) -> usize {
        self.updated.len() + self.unchanged.len() + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives approval-status reconciliation through a [`QuoteEngine`].
pub struct ApprovalSyncBridge<'a> {
    engine: &'a QuoteEngine,
    client: &'a dyn ApprovalClient,
}

impl<'a> ApprovalSyncBridge<'a> {
    /// Bridge using the engine's own approval client.
    pub fn new(engine: &'a QuoteEngine) -> Self {
        Self {
            engine,
            client: engine.approval_client(),
        }
    }

    /// Sync every quote owned by `actor`.
    pub fn sync_customer(&self, actor: &Actor) -> Result<SyncReport> {
        let numbers = self.engine.customer_quote_numbers(actor)?;
        Ok(self.sync_quotes(actor, &numbers))
    }

    /// Sync the listed quotes, one poll each, in order.
    pub fn sync_quotes(&self, actor: &Actor, numbers: &[String]) -> SyncReport {
        let mut report = SyncReport::default();

        for number in numbers {
            match self.sync_one(actor, number) {
                Ok(ReconcileOutcome::Updated { from, to }) => {
                    info!(quote = %number, from = %from, to = %to, "approval status updated");
                    report.updated.push(StatusChange {
                        number: number.clone(),
                        from,
                        to,
                    });
                }
                Ok(ReconcileOutcome::Unchanged) => report.unchanged.push(number.clone()),
                Err(error) => {
                    warn!(quote = %number, error = %error, "approval sync failed");
                    report.failures.push(SyncFailure {
                        number: number.clone(),
                        error,
                    });
                }
            }
        }

        report
    }

    fn sync_one(&self, actor: &Actor, number: &str) -> Result<ReconcileOutcome> {
        let response = self.client.poll_status(number)?;
        if let Some(correlation_id) = &response.correlation_id {
            tracing::debug!(quote = %number, correlation_id = %correlation_id, "approval correlation id");
        }
        let status = response.require_status(number)?;
        self.engine
            .reconcile_approval_status(actor, number, &status)
    }
}
