//! Stress tests for the routed pools

use parking_lot::Mutex;
use seedqueue_executor::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn runtime(config: Config) -> (Runtime, Arc<WallFlag>) {
    let wall = Arc::new(WallFlag::default());
    let runtime = Runtime::builder(Arc::new(config), wall.clone())
        .uncaught_handler(PanicStrategy::Isolate.handler())
        .build();
    (runtime, wall)
}

#[test]
#[ignore] // Run with --ignored flag
fn stress_test_many_small_tasks() {
    let (runtime, _) = runtime(Config::builder().background(4, 5).build().unwrap());
    let executor = runtime.queue_executor();
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..100_000 {
        let counter = counter.clone();
        executor
            .spawn(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
    }

    let reports = runtime.shutdown_managed_pools();
    assert!(reports.iter().all(ShutdownReport::is_clean));
    assert_eq!(counter.load(Ordering::Relaxed), 100_000);
}

#[test]
#[ignore]
fn stress_test_mode_flapping() {
    let (runtime, wall) = runtime(
        Config::builder()
            .background(2, 5)
            .wall(2, 5)
            .build()
            .unwrap(),
    );
    let executor = runtime.queue_executor();
    let per_pool = Arc::new(Mutex::new((0usize, 0usize)));

    let flipper = {
        let wall = wall.clone();
        thread::spawn(move || {
            for i in 0..1000 {
                wall.set_on_wall(i % 2 == 0);
                thread::sleep(Duration::from_micros(50));
            }
        })
    };

    for _ in 0..10_000 {
        let per_pool = per_pool.clone();
        executor
            .spawn(move || {
                let on_wall_pool = current_worker().unwrap().pool() == "SeedQueue Wall";
                let mut guard = per_pool.lock();
                if on_wall_pool {
                    guard.1 += 1;
                } else {
                    guard.0 += 1;
                }
            })
            .unwrap();
    }
    flipper.join().unwrap();

    runtime.shutdown_managed_pools();
    let (background, wall) = *per_pool.lock();
    assert_eq!(background + wall, 10_000);
}

#[test]
#[ignore]
fn stress_test_panic_recovery() {
    let (runtime, _) = runtime(Config::builder().locked(2, 5).build().unwrap());
    let executor = runtime.locked_executor();
    let survived = Arc::new(AtomicUsize::new(0));

    for i in 0..1000 {
        let survived = survived.clone();
        executor
            .spawn(move || {
                if i % 10 == 0 {
                    panic!("Intentional panic");
                }
                survived.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
    }

    let locked = runtime.registry().pool(PoolKind::Locked).unwrap();
    let report = locked.shutdown(Duration::from_secs(10));
    assert!(report.is_clean());
    assert_eq!(survived.load(Ordering::Relaxed), 900);
    assert_eq!(locked.panicked_tasks(), 100);
    assert!(locked.spawned_workers() <= 2);
}

#[test]
#[ignore]
fn stress_test_repeated_sessions() {
    let (runtime, _) = runtime(Config::builder().background(2, 5).build().unwrap());

    for iteration in 0..100 {
        let executor = runtime.queue_executor();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..100 {
            let counter = counter.clone();
            executor
                .spawn(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                })
                .unwrap();
        }

        runtime.shutdown_managed_pools();
        assert_eq!(counter.load(Ordering::Relaxed), 100, "iteration {}", iteration);
    }
}
