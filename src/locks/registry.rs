//! The process-wide key to lock map.

use super::guard::KeyedLockGuard;
use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

thread_local! {
    /// Number of keyed locks held by the current thread.
    static HELD_BY_THREAD: Cell<usize> = const { Cell::new(0) };
}

/// Registry mapping string keys to FIFO mutual-exclusion slots.
#[derive(Debug, Default)]
pub struct KeyedLockRegistry {
    slots: Mutex<HashMap<String, Arc<KeySlot>>>,
}

/// Per-key ticket lock.
#[derive(Debug, Default)]
pub(super) struct KeySlot {
    state: Mutex<SlotState>,
    turn: Condvar,
}

#[derive(Debug, Default)]
struct SlotState {
    /// Next ticket handed to an arriving caller.
    next_ticket: u64,
    /// Ticket currently allowed to hold the lock.
    now_serving: u64,
    /// Holder plus waiters; the slot is evictable at zero.
    users: usize,
    /// Tickets whose callers gave up before their turn.
    abandoned: BTreeSet<u64>,
}

impl SlotState {
    fn take_ticket(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }

    fn advance(&mut self) {
        self.now_serving += 1;
        while self.abandoned.remove(&self.now_serving) {
            self.now_serving += 1;
        }
    }
}

impl KeySlot {
    fn state(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand the lock to the next ticket in line.
    pub(super) fn release(&self) {
        self.state().advance();
        self.turn.notify_all();
    }
}

impl KeyedLockRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `key`, blocking until it is this caller's turn.
    ///
    /// Acquisition cannot fail. The returned guard releases the lock when
    /// dropped.
    pub fn acquire(&self, key: &str) -> KeyedLockGuard<'_> {
        debug_assert_single_hold();

        let slot = self.checkout(key);
        {
            let mut state = slot.state();
            let ticket = state.take_ticket();
            while state.now_serving != ticket {
                state = slot
                    .turn
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }

        debug!(key, "keyed lock acquired");
        self.granted(key, slot)
    }

    /// Acquire the lock for `key`, giving up once `timeout` elapses.
    ///
    /// Returns `None` when the wait was cancelled. In that case the lock was
    /// never granted and nothing guarded by it was touched.
    pub fn acquire_timeout(&self, key: &str, timeout: Duration) -> Option<KeyedLockGuard<'_>> {
        debug_assert_single_hold();

        let deadline = Instant::now() + timeout;
        let slot = self.checkout(key);
        {
            let mut state = slot.state();
            let ticket = state.take_ticket();
            while state.now_serving != ticket {
                let now = Instant::now();
                if now >= deadline {
                    state.abandoned.insert(ticket);
                    drop(state);
                    self.checkin(key, &slot);
                    debug!(key, "keyed lock wait cancelled");
                    return None;
                }
                let (next, _) = slot
                    .turn
                    .wait_timeout(state, deadline - now)
                    .unwrap_or_else(PoisonError::into_inner);
                state = next;
            }
        }

        debug!(key, "keyed lock acquired");
        Some(self.granted(key, slot))
    }

    /// Number of keys with a holder or waiters.
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    /// Whether no key is currently held or awaited.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Arc<KeySlot>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn granted(&self, key: &str, slot: Arc<KeySlot>) -> KeyedLockGuard<'_> {
        HELD_BY_THREAD.with(|held| held.set(held.get() + 1));
        KeyedLockGuard::new(self, key.to_string(), slot)
    }

    /// Register a new user of `key`'s slot, creating the slot if needed.
    fn checkout(&self, key: &str) -> Arc<KeySlot> {
        let mut slots = self.slots();
        let slot = slots
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(KeySlot::default()))
            .clone();
        slot.state().users += 1;
        slot
    }

    /// Drop a user of `key`'s slot and evict the slot once idle.
    ///
    /// Users are only added while the map is locked, so removing a slot whose
    /// count reached zero under the same lock cannot strand a waiter.
    pub(super) fn checkin(&self, key: &str, slot: &Arc<KeySlot>) {
        let mut slots = self.slots();
        let idle = {
            let mut state = slot.state();
            state.users -= 1;
            state.users == 0
        };
        if idle
            && slots
                .get(key)
                .is_some_and(|current| Arc::ptr_eq(current, slot))
        {
            slots.remove(key);
        }
    }

    /// Tickets handed out for `key` that have not been served yet, holder included.
    #[cfg(test)]
    pub(super) fn queued(&self, key: &str) -> u64 {
        self.slots().get(key).map_or(0, |slot| {
            let state = slot.state();
            state.next_ticket - state.now_serving
        })
    }

    pub(super) fn released_by_thread() {
        HELD_BY_THREAD.with(|held| held.set(held.get().saturating_sub(1)));
    }
}

/// The engine never needs two records locked at once; nesting would open the
/// door to lock-ordering deadlocks.
fn debug_assert_single_hold() {
    debug_assert_eq!(
        HELD_BY_THREAD.with(Cell::get),
        0,
        "a keyed lock was requested while this thread already holds one"
    );
}
