//! Advanced features: lifetime eviction, liveness, metrics and logging

use async_trait::async_trait;
use esox_managedpool::{
    BoxError, EvictionPolicy, MetricsExporter, ObjectFactory, ObjectPool, PoolConfiguration,
    PoolObject,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

struct Connection {
    id: usize,
    healthy: AtomicBool,
}

impl PoolObject for Connection {
    fn destroy(&self) -> Result<bool, BoxError> {
        if self.id % 2 == 1 {
            return Err(format!("connection {} already reset by peer", self.id).into());
        }
        Ok(true)
    }

    fn is_active(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }
}

#[derive(Default)]
struct ConnectionFactory {
    next_id: AtomicUsize,
}

#[async_trait]
impl ObjectFactory<Connection> for ConnectionFactory {
    async fn create(&self) -> Result<Connection, BoxError> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(Connection {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            healthy: AtomicBool::new(true),
        })
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Esox Managed Pool - Advanced Features ===\n");

    // Example 1: Lifetime eviction
    lifetime_eviction().await;

    // Example 2: Liveness-driven eviction
    liveness_eviction().await;

    // Example 3: Prometheus metrics
    prometheus_export().await;
}

async fn lifetime_eviction() {
    println!("1. Lifetime Eviction:");

    let config = PoolConfiguration::new()
        .with_capacity(4)
        .with_min_capacity(2)
        .with_lifetime(Duration::from_millis(100), Duration::from_millis(20));
    let pool = ObjectPool::new(ConnectionFactory::default(), config).unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    println!("   Length after startup: {}", pool.len());

    tokio::time::sleep(Duration::from_millis(300)).await;
    let metrics = pool.metrics();
    println!(
        "   Created: {}, evicted: {}, destroy failures: {}",
        metrics.created, metrics.evicted, metrics.destroy_failures
    );

    pool.close().unwrap();
    println!();
}

async fn liveness_eviction() {
    println!("2. Liveness Eviction:");

    let config = PoolConfiguration::new()
        .with_capacity(2)
        .with_lifetime(Duration::from_secs(60), Duration::from_secs(5))
        .with_eviction_policy(EvictionPolicy::LifetimeAndLiveness);
    let pool = ObjectPool::new(ConnectionFactory::default(), config).unwrap();

    let conn = pool.get().await.unwrap();
    conn.healthy.store(false, Ordering::Relaxed);
    pool.release(conn);

    println!("   Evicted on demand: {}", pool.evict_expired());
    println!("   Length: {}", pool.len());

    println!();
}

async fn prometheus_export() {
    println!("3. Prometheus Export:");

    let pool = ObjectPool::new(
        ConnectionFactory::default(),
        PoolConfiguration::new().with_capacity(3),
    )
    .unwrap();

    let _a = pool.get().await.unwrap();
    let _b = pool.get().await.unwrap();

    let mut tags = HashMap::new();
    tags.insert("service".to_string(), "orders".to_string());

    match MetricsExporter::export_prometheus(&pool.metrics(), "primary_db", Some(&tags)) {
        Ok(output) => println!("{}", output),
        Err(e) => println!("   Export failed: {}", e),
    }
}
