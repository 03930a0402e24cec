//! Concurrent acquires for one key share a single creation.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Tracked, key};
use wharf_pool::{Error, Pool, PoolConfig};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_acquires_share_one_creation() {
    let pool = Pool::new(
        Tracked::with_delay(Duration::from_millis(50)),
        PoolConfig::default(),
    )
    .unwrap();
    let barrier = Arc::new(tokio::sync::Barrier::new(10));

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let pool = pool.clone();
        let barrier = Arc::clone(&barrier);
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            let handle = pool.acquire(&key("a")).await.unwrap();
            let id = handle.lock().await.id;
            id
        }));
    }

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap());
    }

    assert_eq!(pool.resource().creates(), 1);
    assert!(ids.iter().all(|id| *id == ids[0]));
    assert_eq!(pool.stats().created, 1);
    assert_eq!(pool.stats().total_acquisitions, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn keys_contending_for_the_last_slot_are_created_once_each() {
    let config = PoolConfig {
        capacity: 2,
        acquire_timeout: Duration::from_secs(5),
        ..Default::default()
    };
    let pool = Pool::new(Tracked::with_delay(Duration::from_millis(50)), config).unwrap();
    // Keeps one slot borrowed for the whole test.
    let pinned = pool.acquire(&key("pinned")).await.unwrap();

    let callers = ["a", "a", "a", "a", "b", "b", "b", "b"];
    let barrier = Arc::new(tokio::sync::Barrier::new(callers.len()));
    let mut tasks = Vec::new();
    for name in callers {
        let pool = pool.clone();
        let barrier = Arc::clone(&barrier);
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            let handle = pool.acquire(&key(name)).await?;
            let id = handle.lock().await.id;
            // Hold on so every caller for this key overlaps.
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, Error>((name, id))
        }));
    }

    let mut seen = std::collections::HashMap::new();
    for task in tasks {
        let (name, id) = task.await.unwrap().unwrap();
        let first = *seen.entry(name).or_insert(id);
        assert_eq!(first, id, "callers for {name} got different instances");
    }

    assert_eq!(seen.len(), 2);
    assert_eq!(pool.resource().creates(), 3);
    assert_eq!(pool.stats().created, 3);
    assert!(pool.stats().resident <= 2);
    drop(pinned);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn creation_failure_reaches_every_waiter() {
    let resource = Tracked::with_delay(Duration::from_millis(50));
    resource.fail_key("down");
    let pool = Pool::new(resource, PoolConfig::default()).unwrap();

    let mut tasks = Vec::new();
    for _ in 0..5 {
        let pool = pool.clone();
        tasks.push(tokio::spawn(async move { pool.acquire(&key("down")).await }));
    }

    for task in tasks {
        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Unavailable { .. }), "got {err:?}");
        assert!(err.to_string().contains("cannot reach down"));
    }
    assert_eq!(pool.resource().creates(), 1);
    assert_eq!(pool.stats().creation_failures, 1);
    assert!(!pool.contains(&key("down")));
}

#[tokio::test]
async fn failure_is_not_cached() {
    let resource = Tracked::new();
    resource.fail_key("flaky");
    let pool = Pool::new(resource, PoolConfig::default()).unwrap();

    assert!(pool.acquire(&key("flaky")).await.is_err());
    pool.resource().heal_key("flaky");

    let handle = pool.acquire(&key("flaky")).await.unwrap();
    assert_eq!(handle.lock().await.key, "flaky");
    assert_eq!(pool.resource().creates(), 2);
}

#[tokio::test]
async fn failure_cause_can_be_inspected() {
    let resource = Tracked::new();
    resource.fail_key("x");
    let pool = Pool::new(resource, PoolConfig::default()).unwrap();

    let err = pool.acquire(&key("x")).await.unwrap_err();
    let cause = err.cause().expect("factory error is attached");
    assert_eq!(cause.to_string(), "cannot reach x");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn failed_key_does_not_hold_capacity() {
    let resource = Tracked::new();
    resource.fail_key("bad");
    let pool = Pool::new(resource, PoolConfig::with_capacity(1)).unwrap();

    assert!(pool.acquire(&key("bad")).await.is_err());
    let handle = pool.acquire(&key("good")).await.unwrap();
    assert_eq!(handle.key(), "good");
}
