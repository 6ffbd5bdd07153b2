//! Read-only commands: `search`, `show`, `items-count`, `current`, `totals`.
//!
//! `current` is the one exception: it creates the customer's draft on first
//! use.

use super::Desk;
use super::display::{QuoteView, render_quote, render_search, render_totals, to_json};
use crate::cli::{GlobalArgs, OutputArgs, QuoteArg, SearchArgs, ShowArgs, TotalsArgs};
use crate::error::{QuoteError, Result};
use crate::events::{Event, EventAction};
use crate::quote::QuoteStage;
use crate::store::SearchCriteria;
use serde_json::json;

/// Execute the `quotedesk search` command.
pub fn cmd_search(global: &GlobalArgs, args: SearchArgs) -> Result<()> {
    let desk = Desk::open(global)?;
    let actor = desk.actor(global)?;

    let mut criteria = SearchCriteria::for_customer(actor.customer_id.clone())
        .with_page(args.page, args.page_size);
    if let Some(stage) = &args.stage {
        let stage = QuoteStage::parse(stage).ok_or_else(|| {
            QuoteError::InvalidInput(format!(
                "unknown stage '{}' (expected one of: draft, submitted, confirmed, rejected)",
                stage
            ))
        })?;
        criteria = criteria.with_stage(stage);
    }
    if let Some(keyword) = args.keyword {
        criteria = criteria.with_keyword(keyword);
    }

    let page = desk.engine.search(&actor, &criteria)?;

    if args.output.json {
        let views = page.results.iter().map(QuoteView::from).collect::<Vec<_>>();
        println!(
            "{}",
            to_json(&json!({
                "results": views,
                "total_count": page.total_count,
                "page_number": criteria.page_number,
                "page_size": criteria.page_size,
            }))?
        );
    } else {
        print!("{}", render_search(&page, criteria.page_number));
    }
    Ok(())
}

/// Execute the `quotedesk show` command.
pub fn cmd_show(global: &GlobalArgs, args: ShowArgs) -> Result<()> {
    let desk = Desk::open(global)?;
    let actor = desk.actor(global)?;

    let quote = desk.engine.get(&actor, &args.number)?;

    if args.output.json {
        println!("{}", to_json(&QuoteView::from(&quote))?);
    } else {
        print!("{}", render_quote(&quote));
    }
    Ok(())
}

/// Execute the `quotedesk items-count` command.
pub fn cmd_items_count(global: &GlobalArgs, args: QuoteArg) -> Result<()> {
    let desk = Desk::open(global)?;
    let actor = desk.actor(global)?;

    println!("{}", desk.engine.items_count(&actor, &args.number)?);
    Ok(())
}

/// Execute the `quotedesk current` command.
pub fn cmd_current(global: &GlobalArgs, args: OutputArgs) -> Result<()> {
    let desk = Desk::open(global)?;
    let actor = desk.actor(global)?;

    let (quote, created) = desk.engine.open_draft(&actor)?;
    if created {
        desk.record(
            Event::new(EventAction::CreateDraft)
                .with_actor(&actor.customer_id)
                .with_quote(&quote.number),
        );
    }

    if args.json {
        println!("{}", to_json(&QuoteView::from(&quote))?);
    } else {
        print!("{}", render_quote(&quote));
    }
    Ok(())
}

/// Execute the `quotedesk totals` command.
///
/// Applies the patch to a copy and prints the resulting totals. Nothing is
/// saved.
pub fn cmd_totals(global: &GlobalArgs, args: TotalsArgs) -> Result<()> {
    let desk = Desk::open(global)?;
    let actor = desk.actor(global)?;
    let patch = args.patch.to_patch()?;

    let totals = desk.engine.calculate_totals(&actor, &args.number, &patch)?;

    if args.output.json {
        println!("{}", to_json(&totals)?);
    } else {
        print!("{}", render_totals(&totals));
    }
    Ok(())
}
