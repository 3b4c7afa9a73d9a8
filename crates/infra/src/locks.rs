//! Per-key async mutual exclusion.
//!
//! Operations on the same key are serialized; operations on different keys never
//! contend beyond a short critical section on the slot table. Slots are removed as soon
//! as no task holds or waits on them, so the table only grows with concurrent keys.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slot = Arc<AsyncMutex<()>>;

/// Table of async mutexes keyed by `K`.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Slot>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> KeyedLocks<K>
where
    K: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`. Released when the guard drops.
    pub async fn lock(&self, key: K) -> KeyGuard<'_, K> {
        let slot = self.slots().entry(key.clone()).or_default().clone();
        let guard = slot.lock_owned().await;
        KeyGuard {
            locks: self,
            key,
            _guard: guard,
        }
    }

    /// Number of keys currently held or awaited.
    pub fn active_keys(&self) -> usize {
        self.slots().len()
    }

    // The table only holds Arcs; a panic elsewhere cannot leave it half-updated.
    fn slots(&self) -> MutexGuard<'_, HashMap<K, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive access to one key of a [`KeyedLocks`] table.
pub struct KeyGuard<'a, K>
where
    K: Clone + Eq + Hash,
{
    locks: &'a KeyedLocks<K>,
    key: K,
    _guard: OwnedMutexGuard<()>,
}

impl<K> KeyGuard<'_, K>
where
    K: Clone + Eq + Hash,
{
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K> Drop for KeyGuard<'_, K>
where
    K: Clone + Eq + Hash,
{
    fn drop(&mut self) {
        let mut slots = self.locks.slots();
        // One reference in the table, one inside our guard: nobody else is waiting.
        if slots
            .get(&self.key)
            .is_some_and(|slot| Arc::strong_count(slot) == 2)
        {
            slots.remove(&self.key);
        }
    }
}
