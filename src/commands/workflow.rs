//! Stage transitions: `submit`, `confirm`, `reject`.

use super::Desk;
use crate::cli::{GlobalArgs, PatchCommandArgs, QuoteArg};
use crate::engine::{CartOutcome, NotificationOutcome};
use crate::error::Result;
use crate::events::{Event, EventAction};
use crate::quote::StageChange;
use serde_json::json;

/// Execute the `quotedesk submit` command.
///
/// A notification failure still leaves the quote submitted; it is printed
/// as a warning.
pub fn cmd_submit(global: &GlobalArgs, args: PatchCommandArgs) -> Result<()> {
    let desk = Desk::open(global)?;
    let actor = desk.actor(global)?;
    let patch = args.patch.to_patch()?;

    let outcome = desk.engine.submit(&actor, &args.number, &patch)?;
    let number = &outcome.quote.number;

    if outcome.change == StageChange::Unchanged {
        println!("{} is already submitted", number);
        return Ok(());
    }

    let notification = match &outcome.notification {
        NotificationOutcome::Acknowledged { correlation_id } => {
            json!({ "status": "acknowledged", "correlation_id": correlation_id })
        }
        NotificationOutcome::Degraded { reason } => {
            json!({ "status": "degraded", "reason": reason })
        }
        NotificationOutcome::Skipped => json!({ "status": "skipped" }),
    };
    desk.record(
        Event::new(EventAction::Submit)
            .with_actor(&actor.customer_id)
            .with_quote(number)
            .with_details(json!({
                "employee_name": outcome.quote.employee_name,
                "grand_total": outcome.quote.totals.grand_total.to_string(),
                "notification": notification,
            })),
    );

    println!("Submitted {}", number);
    match &outcome.notification {
        NotificationOutcome::Acknowledged { correlation_id } => {
            println!("Approval system reference: {}", correlation_id);
        }
        NotificationOutcome::Degraded { reason } => {
            eprintln!("Warning: approval system was not notified: {}", reason);
        }
        NotificationOutcome::Skipped => {}
    }
    Ok(())
}

/// Execute the `quotedesk confirm` command.
///
/// The quote stays confirmed even when its cart cannot be built.
pub fn cmd_confirm(global: &GlobalArgs, args: PatchCommandArgs) -> Result<()> {
    let desk = Desk::open(global)?;
    let actor = desk.actor(global)?;
    let patch = args.patch.to_patch()?;

    let outcome = desk.engine.confirm(&actor, &args.number, &patch)?;
    let number = &outcome.quote.number;

    let cart = match &outcome.cart {
        CartOutcome::Materialized => json!({ "status": "materialized" }),
        CartOutcome::Failed { error } => {
            json!({ "status": "failed", "error": error.to_string() })
        }
    };
    desk.record(
        Event::new(EventAction::Confirm)
            .with_actor(&actor.customer_id)
            .with_quote(number)
            .with_details(json!({ "cart": cart })),
    );

    println!("Confirmed {}", number);
    match &outcome.cart {
        CartOutcome::Materialized => println!("Items copied to the cart of {}", actor.customer_id),
        CartOutcome::Failed { error } => {
            eprintln!("Warning: cart was not updated: {}", error);
        }
    }
    Ok(())
}

/// Execute the `quotedesk reject` command.
pub fn cmd_reject(global: &GlobalArgs, args: QuoteArg) -> Result<()> {
    let desk = Desk::open(global)?;
    let actor = desk.actor(global)?;

    let quote = desk.engine.reject(&actor, &args.number)?;

    desk.record(
        Event::new(EventAction::Reject)
            .with_actor(&actor.customer_id)
            .with_quote(&quote.number),
    );
    println!("Rejected {}", quote.number);
    Ok(())
}
