//! Pool coordinator: acquire, release, destroy and close

use crate::config::PoolConfiguration;
use crate::errors::{PoolError, PoolResult};
use crate::item::{Item, ItemKey};
use crate::maintenance;
use crate::metrics::{MetricsTracker, PoolMetrics};
use crate::object::{ObjectFactory, PoolObject};
use crate::registry::{Registry, Released};

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// An object checked out of the pool
///
/// Dereferences to the pooled object. Hand it back with
/// [`ObjectPool::release`] or [`PooledObject::release`]; dropping the guard
/// releases it as well.
pub struct PooledObject<T: PoolObject> {
    object: Arc<T>,
    key: ItemKey,
    shared: Option<Arc<PoolShared<T>>>,
}

impl<T: PoolObject> PooledObject<T> {
    /// Ticket identifying this object inside its pool
    pub fn key(&self) -> ItemKey {
        self.key
    }

    /// Return the object to its pool
    pub fn release(mut self) {
        if let Some(shared) = self.shared.take() {
            shared.release(self.key);
        }
    }

    /// Destroy the object and remove it from its pool
    ///
    /// The object leaves the pool even when its teardown fails.
    pub fn destroy(mut self) -> PoolResult<bool> {
        match self.shared.take() {
            Some(shared) => shared.destroy(self.key),
            None => Ok(false),
        }
    }
}

impl<T: PoolObject> Deref for PooledObject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.object
    }
}

impl<T: PoolObject> Drop for PooledObject<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.release(self.key);
        }
    }
}

impl<T: PoolObject> fmt::Debug for PooledObject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledObject").field("key", &self.key).finish()
    }
}

/// State shared by the pool handle, checked-out guards and background tasks
pub(crate) struct PoolShared<T> {
    pub config: PoolConfiguration,
    pub factory: Box<dyn ObjectFactory<T>>,
    pub registry: Registry<T>,
    /// Serializes "check length, then insert" across creation attempts.
    pub creation_lock: Mutex<()>,
    pub item_released: Notify,
    pub item_destroyed: Notify,
    pub cancel: CancellationToken,
    pub initialized: AtomicBool,
    pub metrics: MetricsTracker,
}

impl<T: PoolObject> PoolShared<T> {
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.registry.is_closed()
    }

    /// Creates one object if the pool holds fewer than `limit` objects.
    ///
    /// Returns `Ok(false)` when the pool was already full. A new object goes
    /// straight into the idle set and wakes one waiter.
    pub async fn put_item(&self, limit: usize) -> PoolResult<bool> {
        let _creating = self.creation_lock.lock().await;

        if self.registry.len() >= limit {
            return Ok(false);
        }
        if self.is_closed() {
            return Err(PoolError::Closed);
        }

        let object = match self.factory.create().await {
            Ok(object) => object,
            Err(err) => {
                MetricsTracker::increment(&self.metrics.creation_failures);
                return Err(PoolError::Creation(err));
            }
        };

        let item = Arc::new(Item::new(object, self.config.lifetime));
        let key = item.key();
        if !item.object().is_active() {
            MetricsTracker::increment(&self.metrics.creation_failures);
            self.destroy_logged(&item, "inactive on creation");
            return Err(PoolError::InactiveObject);
        }
        if !self.registry.put_idle(Arc::clone(&item)) {
            self.destroy_logged(&item, "pool closed during creation");
            return Err(PoolError::Closed);
        }
        self.initialized.store(true, Ordering::Release);
        MetricsTracker::increment(&self.metrics.created);
        debug!(%key, total = self.registry.len(), "created pooled object");

        self.item_released.notify_one();
        Ok(true)
    }

    fn spawn_creation(self: &Arc<Self>) -> JoinHandle<PoolResult<bool>> {
        let shared = Arc::clone(self);
        tokio::spawn(async move { shared.put_item(shared.config.capacity).await })
    }

    fn checkout(self: &Arc<Self>, item: Arc<Item<T>>) -> PooledObject<T> {
        MetricsTracker::increment(&self.metrics.acquired);
        PooledObject {
            object: Arc::clone(item.object()),
            key: item.key(),
            shared: Some(Arc::clone(self)),
        }
    }

    pub fn release(&self, key: ItemKey) {
        let Some(item) = self.registry.get(key) else {
            debug!(%key, "released object is no longer pooled");
            return;
        };

        item.release();
        match self.registry.release(key) {
            Released::Idle => {
                MetricsTracker::increment(&self.metrics.released);
                self.item_released.notify_one();
            }
            Released::Closed(item) => self.destroy_logged(&item, "released after close"),
            Released::Unknown => debug!(%key, "released object is no longer pooled"),
        }
    }

    pub fn destroy(&self, key: ItemKey) -> PoolResult<bool> {
        let Some(item) = self.registry.get(key) else {
            return Ok(false);
        };

        let outcome = item.destroy();
        self.registry.remove(key);
        self.metrics.record_destroy(&outcome);
        debug!(%key, "destroyed pooled object on request");
        // Frees a slot: the maintainer may refill and a waiter may create.
        self.item_destroyed.notify_one();
        self.item_released.notify_one();

        outcome.map_err(PoolError::Destroy)
    }

    /// Best-effort teardown: failures are logged and counted, never returned.
    pub fn destroy_logged(&self, item: &Item<T>, reason: &'static str) {
        let outcome = item.destroy();
        self.metrics.record_destroy(&outcome);
        match outcome {
            Ok(true) => debug!(key = %item.key(), reason, "destroyed pooled object"),
            Ok(false) => warn!(key = %item.key(), reason, "pooled object reported unsuccessful teardown"),
            Err(err) => warn!(key = %item.key(), reason, error = %err, "failed to destroy pooled object"),
        }
    }
}

/// Resolves with the outcome of a pending creation attempt, or never when
/// there is none.
async fn creation_outcome(creation: &mut Option<JoinHandle<PoolResult<bool>>>) -> PoolResult<bool> {
    match creation {
        Some(handle) => match handle.await {
            Ok(outcome) => outcome,
            Err(join_err) => Err(PoolError::Creation(Box::new(join_err))),
        },
        None => std::future::pending().await,
    }
}

/// Async object pool with a capacity ceiling, a maintained minimum and
/// lifetime-based eviction
///
/// Objects are created on demand by an [`ObjectFactory`] up to
/// [`PoolConfiguration::capacity`]. A background task keeps at least
/// [`PoolConfiguration::min_capacity`] objects around and, when a lifetime is
/// configured, a second task evicts objects that stayed idle for too long.
///
/// The pool must be created inside a tokio runtime.
///
/// # Examples
///
/// ```
/// use esox_managedpool::{BoxError, FnFactory, ObjectPool, PoolConfiguration, PoolObject};
///
/// struct Connection;
///
/// impl PoolObject for Connection {
///     fn destroy(&self) -> Result<bool, BoxError> {
///         Ok(true)
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), esox_managedpool::PoolError> {
/// let factory = FnFactory::new(|| async { Ok::<_, BoxError>(Connection) });
/// let pool = ObjectPool::new(factory, PoolConfiguration::new().with_capacity(2))?;
///
/// let conn = pool.get().await?;
/// pool.release(conn);
/// pool.close()?;
/// # Ok(())
/// # }
/// ```
pub struct ObjectPool<T: PoolObject> {
    shared: Arc<PoolShared<T>>,
}

impl<T: PoolObject> ObjectPool<T> {
    /// Validate the configuration and start the background tasks
    pub fn new<F>(factory: F, config: PoolConfiguration) -> PoolResult<Self>
    where
        F: ObjectFactory<T>,
    {
        config.validate()?;

        info!(
            capacity = config.capacity,
            min_capacity = config.min_capacity,
            lifetime = ?config.lifetime,
            "starting object pool"
        );

        let shared = Arc::new(PoolShared {
            config,
            factory: Box::new(factory),
            registry: Registry::new(),
            creation_lock: Mutex::new(()),
            item_released: Notify::new(),
            item_destroyed: Notify::new(),
            cancel: CancellationToken::new(),
            initialized: AtomicBool::new(false),
            metrics: MetricsTracker::new(),
        });
        maintenance::spawn_background(&shared);

        Ok(Self { shared })
    }

    /// Get an object, waiting up to the configured timeout
    ///
    /// Takes an idle object when there is one. Otherwise a new object is
    /// created if the pool is below capacity, and the call waits for that
    /// object or for another caller to release one.
    ///
    /// # Errors
    ///
    /// [`PoolError::Timeout`] when nothing became available in time,
    /// [`PoolError::Creation`] or [`PoolError::InactiveObject`] when the
    /// creation attempt this call triggered failed, and [`PoolError::Closed`]
    /// once the pool is closed.
    pub async fn get(&self) -> PoolResult<PooledObject<T>> {
        let shared = &self.shared;
        if shared.is_closed() {
            return Err(PoolError::Closed);
        }
        if let Some(item) = shared.registry.acquire() {
            return Ok(shared.checkout(item));
        }

        let timeout = shared.config.timeout;
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);
        let mut creation = Some(shared.spawn_creation());

        loop {
            tokio::select! {
                () = &mut deadline => {
                    MetricsTracker::increment(&shared.metrics.timeouts);
                    debug!(?timeout, "timed out waiting for a pooled object");
                    return Err(PoolError::Timeout(timeout));
                }
                () = shared.cancel.cancelled() => {
                    return Err(PoolError::Closed);
                }
                outcome = creation_outcome(&mut creation) => {
                    creation = None;
                    // Ok(false) means the pool is full: wait for a release.
                    if outcome? {
                        if let Some(item) = shared.registry.acquire() {
                            return Ok(shared.checkout(item));
                        }
                        creation = Some(shared.spawn_creation());
                    }
                }
                () = shared.item_released.notified() => {
                    if let Some(item) = shared.registry.acquire() {
                        return Ok(shared.checkout(item));
                    }
                    if creation.is_none() {
                        creation = Some(shared.spawn_creation());
                    }
                }
            }
        }
    }

    /// Return an object to the pool it came from
    pub fn release(&self, object: PooledObject<T>) {
        object.release();
    }

    /// Destroy an object and remove it from the pool it came from
    ///
    /// Returns the object's own teardown result. The maintainer is woken so
    /// the pool can refill toward its minimum capacity.
    pub fn destroy(&self, object: PooledObject<T>) -> PoolResult<bool> {
        object.destroy()
    }

    /// Number of objects in the pool, idle or checked out
    pub fn len(&self) -> usize {
        self.shared.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of idle objects
    pub fn idle_len(&self) -> usize {
        self.shared.registry.len_idle()
    }

    pub fn capacity(&self) -> usize {
        self.shared.config.capacity
    }

    pub fn config(&self) -> &PoolConfiguration {
        &self.shared.config
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Whether the pool has created at least one object
    pub fn is_initialized(&self) -> bool {
        self.shared.initialized.load(Ordering::Acquire)
    }

    /// Run one eviction pass now instead of waiting for the next tick
    ///
    /// Returns the number of evicted objects. Their teardown runs in the
    /// background.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime with evictable objects in
    /// the pool, since teardown is handed to the runtime's blocking pool.
    pub fn evict_expired(&self) -> usize {
        self.shared.evict_expired()
    }

    #[cfg(test)]
    pub(crate) fn shared(&self) -> Arc<PoolShared<T>> {
        Arc::clone(&self.shared)
    }

    /// Get pool metrics
    pub fn metrics(&self) -> PoolMetrics {
        let (total, idle) = self.shared.registry.counts();
        self.shared.metrics.get_metrics(total, idle, self.shared.config.capacity)
    }

    /// Close the pool and destroy every object
    ///
    /// # Errors
    ///
    /// [`PoolError::OutstandingItems`] while any object is checked out. The
    /// pool stays fully usable in that case; release the objects and retry.
    pub fn close(&self) -> PoolResult<()> {
        let items = self
            .shared
            .registry
            .close_if_idle()
            .map_err(PoolError::OutstandingItems)?;
        self.shared.cancel.cancel();

        for item in &items {
            self.shared.destroy_logged(item, "pool closed");
        }
        info!(destroyed = items.len(), "object pool closed");
        Ok(())
    }
}

impl<T: PoolObject> Drop for ObjectPool<T> {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
        if self.shared.registry.is_closed() {
            return;
        }

        // Checked-out objects are destroyed when their guards come back.
        for item in self.shared.registry.close() {
            self.shared.destroy_logged(&item, "pool dropped");
        }
    }
}

impl<T: PoolObject> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (total, idle) = self.shared.registry.counts();
        f.debug_struct("ObjectPool")
            .field("capacity", &self.shared.config.capacity)
            .field("total", &total)
            .field("idle", &idle)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BoxError;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[derive(Default)]
    struct Counters {
        created: AtomicUsize,
        destroyed: AtomicUsize,
    }

    struct Conn {
        id: usize,
        counters: Arc<Counters>,
    }

    impl PoolObject for Conn {
        fn destroy(&self) -> Result<bool, BoxError> {
            self.counters.destroyed.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    struct ConnFactory {
        counters: Arc<Counters>,
    }

    #[async_trait::async_trait]
    impl ObjectFactory<Conn> for ConnFactory {
        async fn create(&self) -> Result<Conn, BoxError> {
            let id = self.counters.created.fetch_add(1, Ordering::SeqCst);
            Ok(Conn {
                id,
                counters: Arc::clone(&self.counters),
            })
        }
    }

    fn pool(config: PoolConfiguration) -> (ObjectPool<Conn>, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let factory = ConnFactory {
            counters: Arc::clone(&counters),
        };
        (ObjectPool::new(factory, config).unwrap(), counters)
    }

    #[tokio::test]
    async fn get_creates_on_demand() {
        let (pool, counters) = pool(PoolConfiguration::new().with_capacity(2));
        assert!(!pool.is_initialized());

        let conn = pool.get().await.unwrap();
        assert_eq!(conn.id, 0);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.idle_len(), 0);
        assert!(pool.is_initialized());
        assert_eq!(counters.created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dropping_guard_releases_object() {
        let (pool, _) = pool(PoolConfiguration::new().with_capacity(1));
        {
            let _conn = pool.get().await.unwrap();
            assert_eq!(pool.idle_len(), 0);
        }
        assert_eq!(pool.idle_len(), 1);
        assert_eq!(pool.metrics().released, 1);
    }

    #[tokio::test]
    async fn destroy_removes_object() {
        let (pool, counters) = pool(PoolConfiguration::new().with_capacity(1));
        let conn = pool.get().await.unwrap();

        assert!(pool.destroy(conn).unwrap());
        assert_eq!(pool.len(), 0);
        assert_eq!(counters.destroyed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn full_pool_times_out() {
        let (pool, _) = pool(
            PoolConfiguration::new()
                .with_capacity(1)
                .with_timeout(Duration::from_millis(20)),
        );
        let _held = pool.get().await.unwrap();

        let err = pool.get().await.unwrap_err();
        assert!(matches!(err, PoolError::Timeout(_)));
        assert!(err.is_temporary());
        assert_eq!(pool.metrics().timeouts, 1);
        assert_eq!(pool.len(), 1);
    }

    #[tokio::test]
    async fn close_destroys_idle_objects() {
        let (pool, counters) = pool(PoolConfiguration::new().with_capacity(3));
        let a = pool.get().await.unwrap();
        let b = pool.get().await.unwrap();

        assert!(matches!(pool.close(), Err(PoolError::OutstandingItems(2))));
        assert!(!pool.is_closed());

        pool.release(a);
        pool.release(b);
        pool.close().unwrap();

        assert!(pool.is_closed());
        assert_eq!(pool.len(), 0);
        assert_eq!(counters.destroyed.load(Ordering::SeqCst), 2);
        assert!(matches!(pool.get().await, Err(PoolError::Closed)));
    }

    #[tokio::test]
    async fn dropping_pool_destroys_idle_objects() {
        let (pool, counters) = pool(PoolConfiguration::new().with_capacity(2));
        let conn = pool.get().await.unwrap();
        pool.release(conn);

        drop(pool);
        assert_eq!(counters.destroyed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn guard_outliving_pool_is_destroyed_on_release() {
        let (pool, counters) = pool(PoolConfiguration::new().with_capacity(1));
        let conn = pool.get().await.unwrap();

        drop(pool);
        assert_eq!(counters.destroyed.load(Ordering::SeqCst), 0);
        conn.release();
        assert_eq!(counters.destroyed.load(Ordering::SeqCst), 1);
    }
}
