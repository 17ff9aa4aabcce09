//! Async usage examples

use esox_managedpool::{BoxError, FnFactory, ObjectPool, PoolConfiguration, PoolObject};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;

struct Session {
    id: usize,
}

impl PoolObject for Session {
    fn destroy(&self) -> Result<bool, BoxError> {
        Ok(true)
    }
}

fn session_factory() -> FnFactory<impl Fn() -> std::future::Ready<Result<Session, BoxError>>> {
    let next_id = Arc::new(AtomicUsize::new(0));
    FnFactory::new(move || {
        let id = next_id.fetch_add(1, Ordering::Relaxed);
        std::future::ready(Ok(Session { id }))
    })
}

#[tokio::main]
async fn main() {
    println!("=== Esox Managed Pool - Async Examples ===\n");

    // Example 1: Waiting for a release
    wait_for_release().await;

    // Example 2: Timeout
    timeout().await;

    // Example 3: Concurrent access
    concurrent_access().await;
}

async fn wait_for_release() {
    println!("1. Waiting for a Release:");

    let config = PoolConfiguration::new()
        .with_capacity(1)
        .with_timeout(Duration::from_millis(500));
    let pool = Arc::new(ObjectPool::new(session_factory(), config).unwrap());

    let held = pool.get().await.unwrap();
    let waiter = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move { pool.get().await.map(|s| s.id) })
    };

    sleep(Duration::from_millis(50)).await;
    pool.release(held);

    match waiter.await.unwrap() {
        Ok(id) => println!("   Waiter got session {}", id),
        Err(e) => println!("   Error: {}", e),
    }

    println!();
}

async fn timeout() {
    println!("2. Timeout:");

    let config = PoolConfiguration::new()
        .with_capacity(1)
        .with_timeout(Duration::from_millis(100));
    let pool = ObjectPool::new(session_factory(), config).unwrap();

    // Get the only object
    let _held = pool.get().await.unwrap();

    // Try to get another (should timeout)
    match pool.get().await {
        Ok(_) => println!("   Got object"),
        Err(e) if e.is_temporary() => println!("   Temporary error, retry later: {}", e),
        Err(e) => println!("   Error: {}", e),
    }

    println!();
}

async fn concurrent_access() {
    println!("3. Concurrent Access:");

    let config = PoolConfiguration::new()
        .with_capacity(3)
        .with_min_capacity(3)
        .with_timeout(Duration::from_secs(2));
    let pool = Arc::new(ObjectPool::new(session_factory(), config).unwrap());

    let mut handles = vec![];

    for i in 0..10 {
        let pool_clone = Arc::clone(&pool);
        let handle = tokio::spawn(async move {
            match pool_clone.get().await {
                Ok(session) => {
                    println!("   Task {} got session {}", i, session.id);
                    sleep(Duration::from_millis(50)).await;
                }
                Err(e) => println!("   Task {} couldn't get a session: {}", i, e),
            }
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.await.unwrap();
    }

    println!("   Final length: {} (capacity {})", pool.len(), pool.capacity());
}
