//! Implementation of the `quotedesk init` command.
//!
//! Creates the desk home layout:
//!
//! 1. `quotes/`, `carts/` and `events/` directories
//! 2. `config.yaml` with defaults (if missing)
//! 3. `catalog.yaml` with an empty product list (if missing)
//!
//! This command is **idempotent**: existing config, catalog and quotes are
//! never overwritten.

use crate::cli::GlobalArgs;
use crate::config::Config;
use crate::context::DeskContext;
use crate::error::{QuoteError, Result};
use crate::events::{Event, EventAction, append_event};
use crate::fs::atomic_write_file;
use serde_json::json;
use std::fs;
use std::path::Path;

const CATALOG_TEMPLATE: &str = "\
# Products available to add-item. Prices are decimal strings.
#
# products:
#   - id: P-100
#     name: Widget
#     sku: W-100
#     list_price: '12.00'
#     sale_price: '10.00'
products: []
";

/// Execute the `quotedesk init` command.
pub fn cmd_init(global: &GlobalArgs) -> Result<()> {
    let ctx = DeskContext::resolve(global.home.as_deref())?;
    let already = ctx.exists();

    initialize(&ctx)?;

    let event = Event::new(EventAction::Init).with_details(json!({
        "home": ctx.home.display().to_string(),
        "reinitialized": already,
    }));
    append_event(&ctx, &event)?;

    if already {
        println!("Desk already initialized at {}", ctx.home.display());
    } else {
        println!("Initialized desk at {}", ctx.home.display());
        println!();
        println!("Next steps:");
        println!("  - list products in {}", ctx.catalog_path().display());
        println!("  - quotedesk --customer <ID> add-item <PRODUCT>");
    }
    Ok(())
}

/// Create the desk layout under `ctx.home`, leaving existing files alone.
pub fn initialize(ctx: &DeskContext) -> Result<()> {
    for dir in [ctx.quotes_dir(), ctx.carts_dir(), ctx.events_dir()] {
        create_dir(&dir)?;
    }

    let config_path = ctx.config_path();
    if !config_path.exists() {
        let yaml = Config::default().to_yaml()?;
        atomic_write_file(&config_path, &yaml)?;
    }

    let catalog_path = ctx.catalog_path();
    if !catalog_path.exists() {
        atomic_write_file(&catalog_path, CATALOG_TEMPLATE)?;
    }

    Ok(())
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| {
        QuoteError::UserError(format!(
            "failed to create directory '{}': {}",
            path.display(),
            e
        ))
    })
}
