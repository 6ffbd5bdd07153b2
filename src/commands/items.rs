//! Item and field mutations: `add-item`, `remove-item`, `update`.

use super::Desk;
use crate::cli::{AddItemArgs, GlobalArgs, PatchCommandArgs, RemoveItemArgs};
use crate::error::Result;
use crate::events::{Event, EventAction};
use serde_json::json;

/// Execute the `quotedesk add-item` command.
pub fn cmd_add_item(global: &GlobalArgs, args: AddItemArgs) -> Result<()> {
    let desk = Desk::open(global)?;
    let actor = desk.actor(global)?;

    let number = match args.number {
        Some(number) => number,
        None => {
            let (draft, created) = desk.engine.open_draft(&actor)?;
            if created {
                desk.record(
                    Event::new(EventAction::CreateDraft)
                        .with_actor(&actor.customer_id)
                        .with_quote(&draft.number),
                );
            }
            draft.number
        }
    };

    let (item_id, quote) =
        desk.engine
            .add_item(&actor, Some(&number), &args.product, args.quantity)?;

    desk.record(
        Event::new(EventAction::AddItem)
            .with_actor(&actor.customer_id)
            .with_quote(&quote.number)
            .with_details(json!({
                "item": item_id,
                "product": args.product,
                "quantity": args.quantity,
            })),
    );

    println!(
        "Added {} x {} to {} as {}",
        args.quantity, args.product, quote.number, item_id
    );
    println!(
        "Total: {} {} ({} items)",
        quote.totals.grand_total,
        quote.totals.currency,
        quote.items_count()
    );
    Ok(())
}

/// Execute the `quotedesk remove-item` command.
pub fn cmd_remove_item(global: &GlobalArgs, args: RemoveItemArgs) -> Result<()> {
    let desk = Desk::open(global)?;
    let actor = desk.actor(global)?;

    let quote = desk.engine.remove_item(&actor, &args.number, &args.item)?;

    desk.record(
        Event::new(EventAction::RemoveItem)
            .with_actor(&actor.customer_id)
            .with_quote(&quote.number)
            .with_details(json!({ "item": args.item })),
    );

    println!("Removed {} from {}", args.item, quote.number);
    println!(
        "Total: {} {} ({} items)",
        quote.totals.grand_total,
        quote.totals.currency,
        quote.items_count()
    );
    Ok(())
}

/// Execute the `quotedesk update` command.
pub fn cmd_update(global: &GlobalArgs, args: PatchCommandArgs) -> Result<()> {
    let desk = Desk::open(global)?;
    let actor = desk.actor(global)?;
    let patch = args.patch.to_patch()?;

    let (changed, quote) = desk.engine.update(&actor, &args.number, &patch)?;

    if !changed {
        println!("{} unchanged", quote.number);
        return Ok(());
    }

    desk.record(
        Event::new(EventAction::Update)
            .with_actor(&actor.customer_id)
            .with_quote(&quote.number)
            .with_details(json!({ "patch": patch, "version": quote.version })),
    );
    println!("Updated {} (version {})", quote.number, quote.version);
    Ok(())
}
