//! # Esox Managed Pool
//!
//! Async, thread-safe object pool for expensive resources such as
//! connections. The pool hands objects out to concurrent callers under a
//! capacity ceiling, keeps a minimum number of objects ready, evicts objects
//! that stayed idle past their lifetime and bounds how long callers wait.
//!
//! ## Features
//!
//! - Capacity-bounded, on-demand creation through an async [`ObjectFactory`]
//! - Bounded waiting with a retryable [`PoolError::Timeout`]
//! - Background minimum-capacity maintenance
//! - Lifetime-based eviction with an optional liveness check
//! - Automatic return of objects via RAII (Drop trait)
//! - Metrics snapshot with Prometheus export
//! - Structured logging through `tracing`
//!
//! ## Quick Start
//!
//! ```rust
//! use esox_managedpool::{BoxError, FnFactory, ObjectPool, PoolConfiguration, PoolObject};
//! use std::time::Duration;
//!
//! struct Connection;
//!
//! impl PoolObject for Connection {
//!     fn destroy(&self) -> Result<bool, BoxError> {
//!         Ok(true)
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), esox_managedpool::PoolError> {
//! let config = PoolConfiguration::new()
//!     .with_capacity(5)
//!     .with_min_capacity(2)
//!     .with_timeout(Duration::from_secs(1));
//!
//! let pool = ObjectPool::new(FnFactory::new(|| async { Ok::<_, BoxError>(Connection) }), config)?;
//! {
//!     let _conn = pool.get().await?;
//!     // Object automatically returned when `_conn` goes out of scope
//! }
//! pool.close()?;
//! # Ok(())
//! # }
//! ```

mod config;
mod errors;
mod eviction;
mod item;
mod maintenance;
mod metrics;
mod object;
mod pool;
mod registry;

pub use config::PoolConfiguration;
pub use errors::{BoxError, PoolError, PoolResult};
pub use eviction::EvictionPolicy;
pub use item::ItemKey;
#[cfg(feature = "metrics")]
pub use metrics::MetricsExporter;
pub use metrics::PoolMetrics;
pub use object::{FnFactory, ObjectFactory, PoolObject};
pub use pool::{ObjectPool, PooledObject};
