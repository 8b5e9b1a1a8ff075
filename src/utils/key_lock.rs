use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

struct Slot {
    lock: Arc<AsyncMutex<()>>,
    /// Holders plus waiters
    users: usize,
}

type Slots<K> = Arc<Mutex<HashMap<K, Slot>>>;

/// One async mutex per key, created on demand and dropped once nobody holds or waits on it.
///
/// Distinct keys never contend with each other.
pub struct KeyedLocks<K> {
    slots: Slots<K>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: K) -> KeyGuard<K> {
        let lock = {
            let mut slots = lock_slots(&self.slots);
            let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
                lock: Arc::new(AsyncMutex::new(())),
                users: 0,
            });
            slot.users += 1;
            slot.lock.clone()
        };

        // Registered before waiting so a cancelled wait still releases the slot.
        let mut guard = KeyGuard {
            key,
            slots: self.slots.clone(),
            guard: None,
        };
        guard.guard = Some(lock.lock_owned().await);
        guard
    }

    /// Number of keys currently held or awaited.
    pub fn active(&self) -> usize {
        lock_slots(&self.slots).len()
    }
}

fn lock_slots<K>(slots: &Slots<K>) -> MutexGuard<'_, HashMap<K, Slot>> {
    // The map is left consistent by every critical section, so a poisoned lock is usable.
    slots.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct KeyGuard<K: Eq + Hash> {
    key: K,
    slots: Slots<K>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash> Drop for KeyGuard<K> {
    fn drop(&mut self) {
        self.guard.take();

        let mut slots = lock_slots(&self.slots);
        if let Some(slot) = slots.get_mut(&self.key) {
            slot.users -= 1;
            if slot.users == 0 {
                slots.remove(&self.key);
            }
        }
    }
}
