//! Basic usage examples for ObjectPool

use async_trait::async_trait;
use esox_managedpool::{BoxError, ObjectFactory, ObjectPool, PoolConfiguration, PoolObject};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

struct Connection {
    id: usize,
}

impl Connection {
    fn run_command(&self, command: &str) {
        println!("   [conn {}] {}", self.id, command);
    }
}

impl PoolObject for Connection {
    fn destroy(&self) -> Result<bool, BoxError> {
        println!("   [conn {}] closed", self.id);
        Ok(true)
    }
}

#[derive(Default)]
struct ConnectionFactory {
    next_id: AtomicUsize,
}

#[async_trait]
impl ObjectFactory<Connection> for ConnectionFactory {
    async fn create(&self) -> Result<Connection, BoxError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        println!("   [conn {}] opened", id);
        Ok(Connection { id })
    }
}

#[tokio::main]
async fn main() -> Result<(), esox_managedpool::PoolError> {
    println!("=== Esox Managed Pool - Basic Examples ===\n");

    let config = PoolConfiguration::new()
        .with_capacity(5)
        .with_min_capacity(3)
        .with_timeout(Duration::from_secs(3))
        .with_lifetime(Duration::from_secs(20), Duration::from_secs(3));
    let pool = ObjectPool::new(ConnectionFactory::default(), config)?;

    // Example 1: Get and release
    println!("1. Get and Release:");
    let conn = pool.get().await?;
    conn.run_command("SELECT 1");
    pool.release(conn);
    println!("   Pool length: {}\n", pool.len());

    // Example 2: Automatic return
    println!("2. Automatic Return:");
    {
        let conn = pool.get().await?;
        conn.run_command("SELECT 2");
        // Object automatically returned when dropped
    }
    println!("   Idle objects: {}\n", pool.idle_len());

    // Example 3: Destroy a broken object
    println!("3. Destroy:");
    let conn = pool.get().await?;
    pool.destroy(conn)?;
    println!("   Pool length after destroy: {}\n", pool.len());

    // Example 4: Close
    println!("4. Close:");
    let held = pool.get().await?;
    if let Err(e) = pool.close() {
        println!("   Close refused: {}", e);
    }
    pool.release(held);
    pool.close()?;
    println!("   Closed, pool length: {}", pool.len());

    Ok(())
}
