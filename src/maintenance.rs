//! Background tasks: minimum-capacity maintainer and lifetime sweep

use crate::errors::PoolError;
use crate::item::Item;
use crate::metrics::MetricsTracker;
use crate::object::PoolObject;
use crate::pool::PoolShared;
use crate::registry::Released;

use std::sync::Arc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Starts the maintainer and, when a lifetime is configured, the sweep.
///
/// Both tasks stop once the pool's cancellation token fires.
pub(crate) fn spawn_background<T: PoolObject>(shared: &Arc<PoolShared<T>>) {
    tokio::spawn(keep_min_capacity(Arc::clone(shared)));
    if shared.config.lifetime.is_some() {
        tokio::spawn(sweep_expired(Arc::clone(shared)));
    }
}

async fn keep_min_capacity<T: PoolObject>(shared: Arc<PoolShared<T>>) {
    // The first tick fires immediately, which fills the pool at startup.
    let mut ticker = tokio::time::interval(shared.config.min_capacity_check_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = shared.cancel.cancelled() => break,
            _ = ticker.tick() => {}
            () = shared.item_destroyed.notified() => {}
        }
        shared.replenish();
    }
    debug!("min capacity maintainer stopped");
}

async fn sweep_expired<T: PoolObject>(shared: Arc<PoolShared<T>>) {
    let Some(period) = shared.config.lifetime_check_period else {
        return;
    };
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = shared.cancel.cancelled() => break,
            _ = ticker.tick() => {
                shared.evict_expired();
            }
        }
    }
    debug!("lifetime sweep stopped");
}

impl<T: PoolObject> PoolShared<T> {
    /// Issues one creation attempt per object missing below `min_capacity`.
    ///
    /// Each attempt re-checks the count under the creation lock, so repeated
    /// triggers never push the pool past its minimum.
    pub(crate) fn replenish(self: &Arc<Self>) {
        let deficit = self
            .config
            .min_capacity
            .saturating_sub(self.registry.len());

        for _ in 0..deficit {
            let shared = Arc::clone(self);
            tokio::spawn(async move {
                match shared.put_item(shared.config.min_capacity).await {
                    Ok(_) | Err(PoolError::Closed) => {}
                    Err(err) => warn!(error = %err, "failed to create object for min capacity"),
                }
            });
        }
    }

    /// Drains the idle set, re-idles live objects and evicts the rest.
    ///
    /// Re-idled objects keep their release timestamp. Evicted objects are
    /// torn down on the blocking pool so the sweep never waits on them.
    pub(crate) fn evict_expired(self: &Arc<Self>) -> usize {
        if self.config.lifetime.is_none() {
            return 0;
        }
        let drained = self.registry.acquire_all();
        self.sweep(drained)
    }

    /// Sorts drained idle items into kept and evicted ones.
    ///
    /// Items whose pool closed while they were drained are torn down too.
    fn sweep(self: &Arc<Self>, drained: Vec<Arc<Item<T>>>) -> usize {
        let now = Instant::now();
        let policy = self.config.eviction_policy;
        let mut kept = 0;
        let mut evicted = 0;

        for item in drained {
            if item.is_active_at(now, policy) {
                match self.registry.release(item.key()) {
                    Released::Idle => kept += 1,
                    Released::Closed(item) => self.destroy_in_background(item, "pool closed"),
                    Released::Unknown => {}
                }
                continue;
            }

            self.registry.remove(item.key());
            MetricsTracker::increment(&self.metrics.evicted);
            evicted += 1;
            self.destroy_in_background(item, "expired");
        }

        if evicted > 0 {
            debug!(evicted, kept, "evicted idle objects");
            self.item_destroyed.notify_one();
        }
        if kept > 0 || evicted > 0 {
            self.item_released.notify_one();
        }
        evicted
    }

    fn destroy_in_background(self: &Arc<Self>, item: Arc<Item<T>>, reason: &'static str) {
        let shared = Arc::clone(self);
        tokio::task::spawn_blocking(move || shared.destroy_logged(&item, reason));
    }
}
