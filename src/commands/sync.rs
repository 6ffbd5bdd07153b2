//! Implementation of the `quotedesk sync` command.
//!
//! One pass polls the approval system for every quote of the acting
//! customer and writes back statuses that changed. `--watch` repeats the
//! pass every `sync_interval_secs` until interrupted.

use super::Desk;
use super::display::render_sync_report;
use crate::approval::{ApprovalSyncBridge, SyncReport};
use crate::cli::{GlobalArgs, SyncArgs};
use crate::error::{QuoteError, Result};
use crate::events::{Event, EventAction};
use crate::identity::Actor;
use serde_json::json;
use std::thread;
use std::time::Duration;
use tracing::info;

/// Execute the `quotedesk sync` command.
pub fn cmd_sync(global: &GlobalArgs, args: SyncArgs) -> Result<()> {
    let desk = Desk::open(global)?;
    let actor = desk.actor(global)?;

    let interval = match args.interval_secs {
        Some(0) => {
            return Err(QuoteError::InvalidInput(
                "--interval-secs must be greater than 0".to_string(),
            ));
        }
        Some(secs) => Duration::from_secs(secs),
        None => desk.config.sync_interval(),
    };
    let watch = args.watch || args.interval_secs.is_some();

    if !watch {
        let report = sync_pass(&desk, &actor)?;
        print!("{}", render_sync_report(&report));
        if !report.is_clean() {
            return Err(QuoteError::ExternalSyncFailure(format!(
                "{} of {} quote(s) could not be synced",
                report.failures.len(),
                report.processed()
            )));
        }
        return Ok(());
    }

    eprintln!("quotedesk sync started");
    eprintln!("  customer: {}", actor.customer_id);
    eprintln!("  interval: {}s", interval.as_secs());
    eprintln!();

    loop {
        let report = sync_pass(&desk, &actor)?;
        print!("{}", render_sync_report(&report));
        thread::sleep(interval);
    }
}

/// Run one bridge pass and log it.
pub fn sync_pass(desk: &Desk, actor: &Actor) -> Result<SyncReport> {
    let report = ApprovalSyncBridge::new(&desk.engine).sync_customer(actor)?;
    info!(
        customer = %actor.customer_id,
        updated = report.updated.len(),
        unchanged = report.unchanged.len(),
        failed = report.failures.len(),
        "sync pass finished"
    );

    desk.record(
        Event::new(EventAction::Sync)
            .with_actor(&actor.customer_id)
            .with_details(json!({
                "updated": report
                    .updated
                    .iter()
                    .map(|c| json!({ "quote": c.number, "from": c.from, "to": c.to }))
                    .collect::<Vec<_>>(),
                "unchanged": report.unchanged.len(),
                "failed": report
                    .failures
                    .iter()
                    .map(|f| json!({ "quote": f.number, "error": f.error.to_string() }))
                    .collect::<Vec<_>>(),
            })),
    );
    Ok(report)
}
