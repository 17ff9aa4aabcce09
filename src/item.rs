//! Pool items: one pooled object plus its idle-time bookkeeping

use crate::errors::BoxError;
use crate::eviction::{EvictionPolicy, IdleClock};
use crate::object::PoolObject;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// Ticket identifying one pooled object
///
/// Keys are unique across every pool in the process, so two objects that
/// compare equal are still distinct pool entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey(u64);

impl ItemKey {
    pub(crate) fn next() -> Self {
        Self(NEXT_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) struct Item<T> {
    key: ItemKey,
    object: Arc<T>,
    lifetime: Option<Duration>,
    clock: Mutex<IdleClock>,
}

impl<T: PoolObject> Item<T> {
    /// A new item counts as released at creation time.
    pub fn new(object: T, lifetime: Option<Duration>) -> Self {
        Self {
            key: ItemKey::next(),
            object: Arc::new(object),
            lifetime,
            clock: Mutex::new(IdleClock::new()),
        }
    }

    pub fn key(&self) -> ItemKey {
        self.key
    }

    pub fn object(&self) -> &Arc<T> {
        &self.object
    }

    #[cfg(test)]
    pub fn released_at(&self) -> Instant {
        self.clock.lock().released_at
    }

    pub fn release(&self) {
        self.clock.lock().touch();
    }

    pub fn is_active(&self, policy: EvictionPolicy) -> bool {
        self.is_active_at(Instant::now(), policy)
    }

    pub fn is_active_at(&self, now: Instant, policy: EvictionPolicy) -> bool {
        if self.clock.lock().is_expired(self.lifetime, now) {
            return false;
        }
        !policy.checks_liveness() || self.object.is_active()
    }

    pub fn destroy(&self) -> Result<bool, BoxError> {
        self.object.destroy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    struct Stub {
        alive: AtomicBool,
        destroy_results: Mutex<Vec<Result<bool, BoxError>>>,
    }

    impl Stub {
        fn new(results: Vec<Result<bool, BoxError>>) -> Self {
            Self {
                alive: AtomicBool::new(true),
                destroy_results: Mutex::new(results),
            }
        }
    }

    impl PoolObject for Stub {
        fn destroy(&self) -> Result<bool, BoxError> {
            self.destroy_results.lock().remove(0)
        }

        fn is_active(&self) -> bool {
            self.alive.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn keys_are_unique() {
        let a = Item::new(Stub::new(vec![]), None);
        let b = Item::new(Stub::new(vec![]), None);
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn release_refreshes_timestamp() {
        let item = Item::new(Stub::new(vec![]), None);
        let created = item.released_at();
        std::thread::sleep(Duration::from_millis(2));
        item.release();
        assert!(item.released_at() > created);
    }

    #[test]
    fn unlimited_lifetime_stays_active() {
        let item = Item::new(Stub::new(vec![]), None);
        let later = item.released_at() + Duration::from_secs(3600);
        assert!(item.is_active_at(later, EvictionPolicy::LifetimeOnly));
    }

    #[test]
    fn expired_item_is_inactive() {
        let item = Item::new(Stub::new(vec![]), Some(Duration::from_millis(20)));
        let released = item.released_at();
        assert!(item.is_active_at(released + Duration::from_millis(19), EvictionPolicy::default()));
        assert!(!item.is_active_at(released + Duration::from_millis(20), EvictionPolicy::default()));
    }

    #[test]
    fn liveness_only_counts_under_combined_policy() {
        let item = Item::new(Stub::new(vec![]), Some(Duration::from_secs(60)));
        item.object().alive.store(false, Ordering::SeqCst);

        assert!(!item.is_active(EvictionPolicy::LifetimeAndLiveness));
        assert!(item.is_active(EvictionPolicy::LifetimeOnly));
    }

    #[test]
    fn destroy_forwards_result_and_error() {
        let item = Item::new(
            Stub::new(vec![Ok(true), Err("test destroy error".into())]),
            None,
        );

        assert!(item.destroy().unwrap());
        let err = item.destroy().unwrap_err();
        assert_eq!(err.to_string(), "test destroy error");
    }
}
