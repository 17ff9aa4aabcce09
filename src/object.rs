//! Capabilities the pool needs from pooled objects and their factory

use crate::errors::BoxError;
use async_trait::async_trait;
use std::future::Future;

/// Contract every pooled object satisfies
///
/// The pool never touches the object otherwise; it only asks whether it is
/// still usable and tears it down when it leaves the pool.
pub trait PoolObject: Send + Sync + 'static {
    /// Release the underlying resource.
    ///
    /// Returns whether the teardown succeeded. The object is removed from the
    /// pool whatever the outcome.
    fn destroy(&self) -> Result<bool, BoxError>;

    /// Whether the object can still be handed out.
    fn is_active(&self) -> bool {
        true
    }
}

/// Creates objects for the pool
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use esox_managedpool::{BoxError, ObjectFactory, PoolObject};
///
/// struct Connection;
///
/// impl PoolObject for Connection {
///     fn destroy(&self) -> Result<bool, BoxError> {
///         Ok(true)
///     }
/// }
///
/// struct ConnectionFactory;
///
/// #[async_trait]
/// impl ObjectFactory<Connection> for ConnectionFactory {
///     async fn create(&self) -> Result<Connection, BoxError> {
///         Ok(Connection)
///     }
/// }
/// ```
#[async_trait]
pub trait ObjectFactory<T>: Send + Sync + 'static {
    async fn create(&self) -> Result<T, BoxError>;
}

/// Factory backed by a closure returning a future
///
/// ```
/// use esox_managedpool::{BoxError, FnFactory};
///
/// let factory = FnFactory::new(|| async { Ok::<_, BoxError>(42u32) });
/// # let _ = factory;
/// ```
pub struct FnFactory<F> {
    create: F,
}

impl<F> FnFactory<F> {
    pub fn new(create: F) -> Self {
        Self { create }
    }
}

#[async_trait]
impl<T, F, Fut> ObjectFactory<T> for FnFactory<F>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, BoxError>> + Send,
{
    async fn create(&self) -> Result<T, BoxError> {
        (self.create)().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn fn_factory_calls_closure_each_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let factory = FnFactory::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, BoxError>(n) }
        });

        assert_eq!(ObjectFactory::<usize>::create(&factory).await.unwrap(), 0);
        assert_eq!(ObjectFactory::<usize>::create(&factory).await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fn_factory_forwards_errors() {
        let factory = FnFactory::new(|| async { Err::<u8, BoxError>("refused".into()) });
        let err = ObjectFactory::<u8>::create(&factory).await.unwrap_err();
        assert_eq!(err.to_string(), "refused");
    }
}
