use criterion::{Criterion, criterion_group, criterion_main};
use esox_managedpool::{BoxError, FnFactory, ObjectPool, PoolConfiguration, PoolObject};
use std::sync::Arc;

struct Handle;

impl PoolObject for Handle {
    fn destroy(&self) -> Result<bool, BoxError> {
        Ok(true)
    }
}

fn get_release(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let pool = runtime.block_on(async {
        let factory = FnFactory::new(|| async { Ok::<_, BoxError>(Handle) });
        let pool = ObjectPool::new(factory, PoolConfiguration::new().with_capacity(16).with_min_capacity(16))
            .unwrap();
        // Let the maintainer fill the pool.
        while pool.len() < 16 {
            tokio::task::yield_now().await;
        }
        Arc::new(pool)
    });

    c.bench_function("get_release_idle", |b| {
        b.to_async(&runtime).iter(|| {
            let pool = Arc::clone(&pool);
            async move {
                let handle = pool.get().await.unwrap();
                pool.release(handle);
            }
        })
    });

    c.bench_function("get_release_contended", |b| {
        b.to_async(&runtime).iter(|| {
            let pool = Arc::clone(&pool);
            async move {
                let tasks: Vec<_> = (0..32)
                    .map(|_| {
                        let pool = Arc::clone(&pool);
                        tokio::spawn(async move {
                            let handle = pool.get().await.unwrap();
                            tokio::task::yield_now().await;
                            pool.release(handle);
                        })
                    })
                    .collect();
                for task in tasks {
                    task.await.unwrap();
                }
            }
        })
    });
}

criterion_group!(benches, get_release);
criterion_main!(benches);
