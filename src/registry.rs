//! Item registry: every pooled item plus the idle subset

use crate::item::{Item, ItemKey};
use crate::object::PoolObject;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

struct Slots<T> {
    all: HashMap<ItemKey, Arc<Item<T>>>,
    idle: HashMap<ItemKey, Arc<Item<T>>>,
    closed: bool,
}

/// Outcome of handing an item back to the registry
pub(crate) enum Released<T> {
    /// The item is idle again.
    Idle,
    /// The key is not pooled (already destroyed or evicted).
    Unknown,
    /// The registry is closed: the item was dropped from it and must be
    /// torn down by the caller.
    Closed(Arc<Item<T>>),
}

/// Concurrency-safe store of pool items
///
/// A single lock guards both maps, so the idle set is always a subset of the
/// full set. An item present in `all` but not in `idle` is checked out.
pub(crate) struct Registry<T> {
    slots: RwLock<Slots<T>>,
}

impl<T: PoolObject> Registry<T> {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(Slots {
                all: HashMap::new(),
                idle: HashMap::new(),
                closed: false,
            }),
        }
    }

    /// Adds a new item straight into the idle set. Returns false once the
    /// registry is closed.
    pub fn put_idle(&self, item: Arc<Item<T>>) -> bool {
        let mut slots = self.slots.write();
        if slots.closed {
            return false;
        }
        slots.all.insert(item.key(), Arc::clone(&item));
        slots.idle.insert(item.key(), item);
        true
    }

    /// Adds the item as checked out.
    #[cfg(test)]
    pub fn put(&self, item: Arc<Item<T>>) -> bool {
        let mut slots = self.slots.write();
        if slots.closed {
            return false;
        }
        slots.all.insert(item.key(), item);
        true
    }

    /// Takes any one idle item.
    pub fn acquire(&self) -> Option<Arc<Item<T>>> {
        let mut slots = self.slots.write();
        let key = *slots.idle.keys().next()?;
        slots.idle.remove(&key)
    }

    /// Takes every idle item at once.
    pub fn acquire_all(&self) -> Vec<Arc<Item<T>>> {
        let mut slots = self.slots.write();
        slots.idle.drain().map(|(_, item)| item).collect()
    }

    /// Marks a known item idle, or removes it once the registry is closed.
    pub fn release(&self, key: ItemKey) -> Released<T> {
        let mut slots = self.slots.write();
        if slots.closed {
            return match slots.all.remove(&key) {
                Some(item) => Released::Closed(item),
                None => Released::Unknown,
            };
        }
        match slots.all.get(&key).cloned() {
            Some(item) => {
                slots.idle.insert(key, item);
                Released::Idle
            }
            None => Released::Unknown,
        }
    }

    pub fn remove(&self, key: ItemKey) -> Option<Arc<Item<T>>> {
        let mut slots = self.slots.write();
        slots.idle.remove(&key);
        slots.all.remove(&key)
    }

    pub fn get(&self, key: ItemKey) -> Option<Arc<Item<T>>> {
        self.slots.read().all.get(&key).cloned()
    }

    #[cfg(test)]
    pub fn get_all(&self) -> Vec<Arc<Item<T>>> {
        self.slots.read().all.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.slots.read().all.len()
    }

    pub fn len_idle(&self) -> usize {
        self.slots.read().idle.len()
    }

    /// Total and idle counts read under one lock.
    pub fn counts(&self) -> (usize, usize) {
        let slots = self.slots.read();
        (slots.all.len(), slots.idle.len())
    }

    /// Closes the registry and removes every idle item, handing them back
    /// for teardown. Checked-out items stay until they are released.
    pub fn close(&self) -> Vec<Arc<Item<T>>> {
        let mut slots = self.slots.write();
        slots.closed = true;
        let idle: Vec<_> = slots.idle.drain().map(|(_, item)| item).collect();
        for item in &idle {
            slots.all.remove(&item.key());
        }
        idle
    }

    pub fn is_closed(&self) -> bool {
        self.slots.read().closed
    }

    /// Closes the registry and hands back every item, but only when nothing
    /// is checked out. Otherwise returns the number of checked-out items and
    /// leaves the registry untouched.
    pub fn close_if_idle(&self) -> Result<Vec<Arc<Item<T>>>, usize> {
        let mut slots = self.slots.write();
        let outstanding = slots.all.len() - slots.idle.len();
        if outstanding > 0 {
            return Err(outstanding);
        }
        slots.closed = true;
        slots.idle.clear();
        Ok(slots.all.drain().map(|(_, item)| item).collect())
    }
}
