//! CLI argument parsing for quotedesk.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use crate::error::{QuoteError, Result};
use crate::quote::{Address, QuoteFieldsPatch};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Quotedesk: negotiated price quotes with per-quote serialized mutations.
///
/// Quotes move Draft -> Submitted -> Confirmed | Rejected. Every mutation
/// of a quote runs under that quote's lock against a freshly loaded copy,
/// and approval statuses are pulled from the external approval system by
/// `sync`.
#[derive(Parser, Debug)]
#[command(name = "quotedesk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Desk home directory (default: ./.quotedesk).
    #[arg(long, global = true, env = "QUOTEDESK_HOME")]
    pub home: Option<PathBuf>,

    /// Customer the command acts for.
    #[arg(long, global = true, env = "QUOTEDESK_CUSTOMER")]
    pub customer: Option<String>,

    /// Display name recorded on submit (default: the customer id).
    #[arg(long, global = true, env = "QUOTEDESK_USER_NAME")]
    pub name: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands for quotedesk.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a desk home.
    ///
    /// Creates the quote, cart and event directories and a default
    /// config.yaml. Safe to re-run.
    Init,

    /// Search the acting customer's quotes, newest first.
    Search(SearchArgs),

    /// Show a quote with its lines and totals.
    Show(ShowArgs),

    /// Print the number of line items on a quote.
    ItemsCount(QuoteArg),

    /// Show the acting customer's open draft, creating it if needed.
    Current(OutputArgs),

    /// Add a catalog product to a quote.
    ///
    /// Without --quote the product goes onto the current draft.
    AddItem(AddItemArgs),

    /// Remove a line item from a quote.
    RemoveItem(RemoveItemArgs),

    /// Apply a field patch to a quote that is not yet confirmed or rejected.
    Update(PatchCommandArgs),

    /// Submit a draft for approval.
    ///
    /// Submitting an already submitted quote is a no-op.
    Submit(PatchCommandArgs),

    /// Confirm a submitted quote and copy its lines into the cart.
    Confirm(PatchCommandArgs),

    /// Reject a submitted quote.
    Reject(QuoteArg),

    /// Preview totals with a patch applied, without saving anything.
    Totals(TotalsArgs),

    /// Pull approval statuses for the acting customer's quotes.
    Sync(SyncArgs),
}

/// A single quote number.
#[derive(Args, Debug, Clone)]
pub struct QuoteArg {
    /// Quote number (e.g., Q-00001).
    pub number: String,
}

#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `search` command.
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Only quotes in this stage (draft, submitted, confirmed, rejected).
    #[arg(long)]
    pub stage: Option<String>,

    /// Case-insensitive match over number, comment and tag.
    #[arg(long)]
    pub keyword: Option<String>,

    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    #[arg(long, default_value_t = crate::store::DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for the `show` command.
#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Quote number (e.g., Q-00001).
    pub number: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for the `add-item` command.
#[derive(Args, Debug, Clone)]
pub struct AddItemArgs {
    /// Catalog product id.
    pub product: String,

    /// Target quote. Defaults to the current draft.
    #[arg(long = "quote")]
    pub number: Option<String>,

    #[arg(short, long, default_value_t = 1)]
    pub quantity: u32,
}

/// Arguments for the `remove-item` command.
#[derive(Args, Debug, Clone)]
pub struct RemoveItemArgs {
    pub number: String,

    /// Line item id (e.g., Q-00001-L1).
    pub item: String,
}

/// Customer-editable fields, shared by commands that accept a patch.
#[derive(Args, Debug, Clone, Default)]
pub struct PatchArgs {
    #[arg(long)]
    pub comment: Option<String>,

    #[arg(long)]
    pub tag: Option<String>,

    /// New quantity for a line item, as ITEM=QTY. Repeatable.
    #[arg(long = "quantity", value_name = "ITEM=QTY")]
    pub quantities: Vec<String>,

    /// Billing address as inline YAML,
    /// e.g. "{name: Acme, line1: 1 Main St, city: Springfield, postal_code: '12345', country_code: US}".
    #[arg(long, value_name = "YAML")]
    pub billing_address: Option<String>,

    /// Shipping address as inline YAML.
    #[arg(long, value_name = "YAML")]
    pub shipping_address: Option<String>,
}

impl PatchArgs {
    /// Build the field patch these flags describe.
    pub fn to_patch(&self) -> Result<QuoteFieldsPatch> {
        let mut patch = QuoteFieldsPatch {
            comment: self.comment.clone(),
            tag: self.tag.clone(),
            ..QuoteFieldsPatch::default()
        };

        for entry in &self.quantities {
            let (item, quantity) = parse_quantity(entry)?;
            patch.item_quantities.insert(item, quantity);
        }

        if let Some(yaml) = &self.billing_address {
            patch.billing_address = Some(parse_address("billing", yaml)?);
        }
        if let Some(yaml) = &self.shipping_address {
            patch.shipping_address = Some(parse_address("shipping", yaml)?);
        }

        Ok(patch)
    }
}

fn parse_quantity(entry: &str) -> Result<(String, u32)> {
    let invalid = || {
        QuoteError::InvalidInput(format!(
            "invalid --quantity '{}': expected ITEM=QTY with QTY > 0",
            entry
        ))
    };

    let (item, quantity) = entry.split_once('=').ok_or_else(invalid)?;
    let item = item.trim();
    let quantity: u32 = quantity.trim().parse().map_err(|_| invalid())?;
    if item.is_empty() || quantity == 0 {
        return Err(invalid());
    }
    Ok((item.to_string(), quantity))
}

fn parse_address(kind: &str, yaml: &str) -> Result<Address> {
    serde_yaml::from_str(yaml).map_err(|e| {
        QuoteError::InvalidInput(format!("invalid {} address: {}", kind, e))
    })
}

/// Arguments for `update`, `submit` and `confirm`.
#[derive(Args, Debug, Clone)]
pub struct PatchCommandArgs {
    pub number: String,

    #[command(flatten)]
    pub patch: PatchArgs,
}

/// Arguments for the `totals` command.
#[derive(Args, Debug, Clone)]
pub struct TotalsArgs {
    pub number: String,

    #[command(flatten)]
    pub patch: PatchArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for the `sync` command.
#[derive(Args, Debug, Clone, Default)]
pub struct SyncArgs {
    /// Keep syncing every `sync_interval_secs`.
    #[arg(long)]
    pub watch: bool,

    /// Override the configured interval, in seconds (implies --watch).
    #[arg(long)]
    pub interval_secs: Option<u64>,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_debug_assert() {
        // Verifies the CLI arguments configuration is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_init() {
        let cli = Cli::try_parse_from(["quotedesk", "init"]).unwrap();
        assert!(matches!(cli.command, Command::Init));
    }

    #[test]
    fn test_parse_global_args_after_subcommand() {
        let cli = Cli::try_parse_from([
            "quotedesk",
            "show",
            "Q-00001",
            "--customer",
            "cust-1",
            "--home",
            "/tmp/desk",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.global.customer.as_deref(), Some("cust-1"));
        assert_eq!(cli.global.home, Some(PathBuf::from("/tmp/desk")));
        if let Command::Show(args) = cli.command {
            assert_eq!(args.number, "Q-00001");
            assert!(args.output.json);
        } else {
            panic!("Expected Show command");
        }
    }

    #[test]
    fn test_parse_add_item_defaults() {
        let cli = Cli::try_parse_from(["quotedesk", "add-item", "P-100"]).unwrap();
        if let Command::AddItem(args) = cli.command {
            assert_eq!(args.product, "P-100");
            assert_eq!(args.number, None);
            assert_eq!(args.quantity, 1);
        } else {
            panic!("Expected AddItem command");
        }
    }

    #[test]
    fn test_parse_add_item_full() {
        let cli = Cli::try_parse_from([
            "quotedesk", "add-item", "P-200", "--quote", "Q-00007", "-q", "3",
        ])
        .unwrap();
        if let Command::AddItem(args) = cli.command {
            assert_eq!(args.number.as_deref(), Some("Q-00007"));
            assert_eq!(args.quantity, 3);
        } else {
            panic!("Expected AddItem command");
        }
    }

    #[test]
    fn test_parse_search_filters() {
        let cli = Cli::try_parse_from([
            "quotedesk",
            "search",
            "--stage",
            "submitted",
            "--keyword",
            "urgent",
            "--page",
            "2",
            "--page-size",
            "5",
        ])
        .unwrap();
        if let Command::Search(args) = cli.command {
            assert_eq!(args.stage.as_deref(), Some("submitted"));
            assert_eq!(args.keyword.as_deref(), Some("urgent"));
            assert_eq!(args.page, 2);
            assert_eq!(args.page_size, 5);
        } else {
            panic!("Expected Search command");
        }
    }

    #[test]
    fn test_parse_submit_with_patch_flags() {
        let cli = Cli::try_parse_from([
            "quotedesk",
            "submit",
            "Q-00001",
            "--comment",
            "rush order",
            "--quantity",
            "Q-00001-L1=4",
            "--quantity",
            "Q-00001-L2=1",
        ])
        .unwrap();
        let Command::Submit(args) = cli.command else {
            panic!("Expected Submit command");
        };

        let patch = args.patch.to_patch().unwrap();
        assert_eq!(patch.comment.as_deref(), Some("rush order"));
        assert_eq!(patch.item_quantities.get("Q-00001-L1"), Some(&4));
        assert_eq!(patch.item_quantities.get("Q-00001-L2"), Some(&1));
    }

    #[test]
    fn test_patch_rejects_bad_quantity() {
        for entry in ["Q-00001-L1", "Q-00001-L1=0", "=2", "Q-00001-L1=many"] {
            let args = PatchArgs {
                quantities: vec![entry.to_string()],
                ..PatchArgs::default()
            };
            let err = args.to_patch().unwrap_err();
            assert!(matches!(err, QuoteError::InvalidInput(_)), "{}", entry);
        }
    }

    #[test]
    fn test_patch_parses_inline_address() {
        let args = PatchArgs {
            shipping_address: Some(
                "{name: Acme, line1: 1 Main St, city: Springfield, postal_code: '12345', country_code: US}"
                    .to_string(),
            ),
            ..PatchArgs::default()
        };
        let patch = args.to_patch().unwrap();
        let address = patch.shipping_address.unwrap();
        assert_eq!(address.city, "Springfield");
        assert_eq!(address.postal_code, "12345");
        assert_eq!(address.line2, None);
    }

    #[test]
    fn test_patch_rejects_incomplete_address() {
        let args = PatchArgs {
            billing_address: Some("{name: Acme}".to_string()),
            ..PatchArgs::default()
        };
        assert!(args.to_patch().is_err());
    }

    #[test]
    fn test_empty_patch_flags_give_empty_patch() {
        assert!(PatchArgs::default().to_patch().unwrap().is_empty());
    }

    #[test]
    fn test_parse_sync_watch() {
        let cli = Cli::try_parse_from(["quotedesk", "sync", "--watch"]).unwrap();
        if let Command::Sync(args) = cli.command {
            assert!(args.watch);
            assert_eq!(args.interval_secs, None);
        } else {
            panic!("Expected Sync command");
        }
    }
}
