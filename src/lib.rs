//! Quotedesk: negotiated price quotes with per-quote serialized mutations.
//!
//! A quote moves `Draft -> Submitted -> Confirmed | Rejected`. Every
//! operation on an existing quote runs through the [`engine::QuoteEngine`]
//! under that quote's key lock, against a freshly loaded copy, after an
//! ownership check. Approval statuses are pulled from the external approval
//! system by the [`approval::ApprovalSyncBridge`] and written back through
//! the same engine.
//!
//! The `quotedesk` binary drives all of this against a file-backed desk
//! home (see [`context`]).

pub mod approval;
pub mod cart;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod fs;
pub mod identity;
pub mod locks;
pub mod logging;
pub mod ownership;
pub mod quote;
pub mod store;

#[cfg(test)]
mod test_support;
