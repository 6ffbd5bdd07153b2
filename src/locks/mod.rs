//! Keyed locking for quotedesk.
//!
//! Every read-modify-write cycle against a quote runs while holding the lock
//! registered under that quote's key. The registry is process-wide:
//!
//! - A key's lock is created lazily on first use and the same lock is
//!   returned for the same key while it is in use.
//! - Waiters are admitted in ticket (FIFO) order, so a busy key cannot
//!   starve a caller.
//! - Different keys never block each other; the registry map itself is only
//!   held for the few instructions needed to look up a slot.
//! - Idle slots (no holder and no waiters) are evicted on release.
//!
//! # RAII Guards
//!
//! Acquisition hands back a [`KeyedLockGuard`]. Dropping the guard releases
//! the lock on every exit path, including `?` propagation and panics.
//!
//! # Cancellation
//!
//! [`KeyedLockRegistry::acquire_timeout`] gives up after a deadline. A
//! cancelled wait is never granted the lock; its ticket is skipped when the
//! queue reaches it.

mod guard;
mod registry;


pub use guard::KeyedLockGuard;
pub use registry::KeyedLockRegistry;

/// Lock key governing a single quote.
pub fn quote_lock_key(number: &str) -> String {
    format!("quote-request:{}", number)
}

/// Lock key serializing lazy creation of a customer's draft quote.
pub fn draft_lock_key(customer_id: &str) -> String {
    format!("customer-draft:{}", customer_id)
}
