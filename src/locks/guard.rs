//! RAII keyed lock guard implementation.

use super::registry::{KeySlot, KeyedLockRegistry};
use std::sync::Arc;
use tracing::debug;

/// RAII guard for a keyed lock.
///
/// When dropped, the lock passes to the next waiter for the same key and the
/// registry entry is evicted if nobody else is waiting.
#[derive(Debug)]
pub struct KeyedLockGuard<'a> {
    registry: &'a KeyedLockRegistry,
    key: String,
    slot: Arc<KeySlot>,
}

impl<'a> KeyedLockGuard<'a> {
    pub(super) fn new(registry: &'a KeyedLockRegistry, key: String, slot: Arc<KeySlot>) -> Self {
        Self {
            registry,
            key,
            slot,
        }
    }

    /// The key this guard holds.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyedLockGuard<'_> {
    fn drop(&mut self) {
        self.slot.release();
        self.registry.checkin(&self.key, &self.slot);
        KeyedLockRegistry::released_by_thread();
        debug!(key = %self.key, "keyed lock released");
    }
}
