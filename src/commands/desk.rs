//! Wiring shared by every command: resolved home, config, engine and actor.

use crate::approval::{ApprovalClient, HttpApprovalClient, UnconfiguredApprovalClient};
use crate::cart::FileCartSink;
use crate::catalog::FileCatalog;
use crate::cli::GlobalArgs;
use crate::config::Config;
use crate::context::{DeskContext, require_initialized};
use crate::engine::QuoteEngine;
use crate::error::{QuoteError, Result};
use crate::events::{Event, append_event};
use crate::identity::Actor;
use crate::store::FileQuoteStore;
use std::sync::Arc;
use tracing::warn;

/// An opened, initialized desk.
pub struct Desk {
    pub ctx: DeskContext,
    pub config: Config,
    pub engine: QuoteEngine,
}

impl Desk {
    /// Open the desk named by `--home`, failing if `init` has not run.
    pub fn open(global: &GlobalArgs) -> Result<Self> {
        let ctx = require_initialized(global.home.as_deref())?;
        Self::from_context(ctx)
    }

    pub fn from_context(ctx: DeskContext) -> Result<Self> {
        let config = Config::load(ctx.config_path())?;

        let store = FileQuoteStore::new(ctx.quotes_dir(), ctx.sequence_path());
        let catalog = FileCatalog::load(ctx.catalog_path())?;
        let carts = FileCartSink::new(ctx.carts_dir());
        let approvals: Arc<dyn ApprovalClient> = if config.approval_enabled() {
            Arc::new(HttpApprovalClient::new(
                config.approval.status_url.clone(),
                config.approval.notify_url.clone(),
                config.approval_timeout(),
                &config.approval.user_agent,
            )?)
        } else {
            Arc::new(UnconfiguredApprovalClient)
        };

        let engine = QuoteEngine::new(
            Arc::new(store),
            Arc::new(catalog),
            Arc::new(carts),
            approvals,
        )
        .with_pricing(config.pricing())
        .with_lock_wait(config.lock_wait());

        Ok(Self {
            ctx,
            config,
            engine,
        })
    }

    /// The principal named by `--customer` / `--name`.
    pub fn actor(&self, global: &GlobalArgs) -> Result<Actor> {
        let customer_id = global
            .customer
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                QuoteError::UserError(
                    "no acting customer.\n\n\
                     Pass --customer <ID> or set QUOTEDESK_CUSTOMER."
                        .to_string(),
                )
            })?;

        let display_name = global
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(customer_id);

        Ok(Actor::new(customer_id, display_name).with_locale(self.config.locale()))
    }

    /// Append an audit event. The mutation it describes is already saved,
    /// so a logging failure is only reported.
    pub fn record(&self, event: Event) {
        if let Err(e) = append_event(&self.ctx, &event) {
            warn!(action = %event.action, error = %e, "failed to log event");
        }
    }
}
