//! Per-key asynchronous mutual exclusion.
//!
//! Admission, settlement, and reconciliation all mutate a task through
//! several storage calls. [`KeyedLocks`] serializes those sequences per task
//! identity while leaving different tasks fully parallel. Slots are created on
//! first use and removed once no holder or waiter references them.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type SlotMap<K> = HashMap<K, Arc<AsyncMutex<()>>>;

/// Registry of lazily created per-key locks.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    slots: Arc<Mutex<SlotMap<K>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// Clones share the same slots.
impl<K> Clone for KeyedLocks<K> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the lock for `key` is free and takes it.
    pub async fn acquire(&self, key: K) -> KeyedLockGuard<K> {
        let slot = self.slot_for(&key);
        let guard = slot.lock_owned().await;
        KeyedLockGuard {
            key,
            slots: Arc::clone(&self.slots),
            guard: Some(guard),
        }
    }

    /// Takes the lock for `key`, giving up after `timeout`.
    ///
    /// Returns `None` when the lock could not be taken in time.
    pub async fn acquire_within(&self, key: K, timeout: Duration) -> Option<KeyedLockGuard<K>> {
        tokio::time::timeout(timeout, self.acquire(key)).await.ok()
    }

    #[cfg(test)]
    fn active_keys(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn slot_for(&self, key: &K) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key.clone()).or_default())
    }
}

/// Holds a key's lock until dropped.
#[derive(Debug)]
pub struct KeyedLockGuard<K>
where
    K: Eq + Hash,
{
    key: K,
    slots: Arc<Mutex<SlotMap<K>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K> Drop for KeyedLockGuard<K>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the registry still references the slot: nobody holds or awaits it.
        let unused = slots
            .get(&self.key)
            .is_some_and(|slot| Arc::strong_count(slot) == 1);
        if unused {
            slots.remove(&self.key);
        }
    }
}
