//! Command implementations for quotedesk.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Every command except `init` opens an initialized desk
//! and acts for the customer named by `--customer`.

mod desk;
mod display;
pub mod init;
mod items;
mod query;
mod sync;
mod workflow;


pub use desk::Desk;

use crate::cli::{Command, GlobalArgs};
use crate::error::Result;

/// Dispatch a command to its implementation.
pub fn dispatch(global: &GlobalArgs, command: Command) -> Result<()> {
    match command {
        Command::Init => init::cmd_init(global),
        Command::Search(args) => query::cmd_search(global, args),
        Command::Show(args) => query::cmd_show(global, args),
        Command::ItemsCount(args) => query::cmd_items_count(global, args),
        Command::Current(args) => query::cmd_current(global, args),
        Command::AddItem(args) => items::cmd_add_item(global, args),
        Command::RemoveItem(args) => items::cmd_remove_item(global, args),
        Command::Update(args) => items::cmd_update(global, args),
        Command::Submit(args) => workflow::cmd_submit(global, args),
        Command::Confirm(args) => workflow::cmd_confirm(global, args),
        Command::Reject(args) => workflow::cmd_reject(global, args),
        Command::Totals(args) => query::cmd_totals(global, args),
        Command::Sync(args) => sync::cmd_sync(global, args),
    }
}
