//! Invalidation, validation, disposal and shutdown.

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{Tracked, key, wait_until};
use pretty_assertions::assert_eq;
use wharf_pool::{Error, Pool, PoolConfig};

#[tokio::test]
async fn invalidating_idle_entry_disposes_it() {
    let pool = Pool::new(Tracked::new(), PoolConfig::default()).unwrap();
    let id = pool.acquire(&key("a")).await.unwrap().generation();
    assert!(id > 0);

    assert!(pool.invalidate(&key("a")));
    assert!(!pool.contains(&key("a")));
    assert!(wait_until(|| pool.resource().cleaned().len() == 1).await);
}

#[tokio::test]
async fn invalidating_borrowed_entry_waits_for_release() {
    let pool = Pool::new(Tracked::new(), PoolConfig::default()).unwrap();
    let handle = pool.acquire(&key("a")).await.unwrap();
    let id = handle.lock().await.id;

    assert!(pool.invalidate(&key("a")));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(pool.resource().cleaned().is_empty());

    // The key is free for a fresh instance while the old one is still out.
    let fresh = pool.acquire(&key("a")).await.unwrap();
    assert!(!fresh.same_resource(&handle));
    assert_eq!(pool.stats().resident, 2);

    drop(handle);
    assert!(wait_until(|| pool.resource().cleaned() == vec![id]).await);
    assert_eq!(pool.stats().resident, 1);
}

#[tokio::test]
async fn invalid_idle_entry_is_replaced() {
    let pool = Pool::new(Tracked::new(), PoolConfig::default()).unwrap();
    let old = {
        let handle = pool.acquire(&key("a")).await.unwrap();
        let id = handle.lock().await.id;
        id
    };
    pool.resource().mark_invalid(old);

    let handle = pool.acquire(&key("a")).await.unwrap();
    assert_ne!(handle.lock().await.id, old);
    assert_eq!(pool.resource().creates(), 2);
    assert!(wait_until(|| pool.resource().cleaned() == vec![old]).await);
}

#[tokio::test]
async fn disposal_failure_does_not_reach_callers() {
    let pool = Pool::new(Tracked::new(), PoolConfig::with_capacity(1)).unwrap();
    pool.resource().cleanup_fails.store(true, Ordering::SeqCst);

    drop(pool.acquire(&key("a")).await.unwrap());
    // Evicts "a"; its cleanup fails in the background.
    let handle = pool.acquire(&key("b")).await.unwrap();
    assert_eq!(handle.key(), "b");

    assert!(wait_until(|| pool.stats().disposal_failures == 1).await);
    assert_eq!(pool.stats().disposed, 1);
}

#[tokio::test]
async fn disposal_panic_is_contained() {
    let pool = Pool::new(Tracked::new(), PoolConfig::with_capacity(1)).unwrap();
    pool.resource().cleanup_panics.store(true, Ordering::SeqCst);

    drop(pool.acquire(&key("a")).await.unwrap());
    drop(pool.acquire(&key("b")).await.unwrap());
    drop(pool.acquire(&key("c")).await.unwrap());

    assert!(wait_until(|| pool.stats().disposal_failures == 2).await);
    assert_eq!(pool.resource().cleaned().len(), 2);
    assert!(pool.contains(&key("c")));
}

#[tokio::test]
async fn every_instance_is_disposed_exactly_once() {
    let pool = Pool::new(Tracked::new(), PoolConfig::with_capacity(2)).unwrap();

    for i in 0..10 {
        let name = format!("k{}", i % 4);
        let handle = pool.acquire(&key(&name)).await.unwrap();
        if i % 3 == 0 {
            pool.invalidate(&key(&name));
        }
        drop(handle);
    }
    pool.shutdown().await.unwrap();

    let mut cleaned = pool.resource().cleaned();
    let total = cleaned.len();
    cleaned.sort_unstable();
    cleaned.dedup();
    assert_eq!(cleaned.len(), total);
    assert_eq!(total, pool.resource().creates());
}

#[tokio::test]
async fn shutdown_rejects_new_acquires() {
    let pool = Pool::new(Tracked::new(), PoolConfig::default()).unwrap();
    drop(pool.acquire(&key("a")).await.unwrap());

    pool.shutdown().await.unwrap();

    assert!(pool.is_closed());
    assert!(matches!(
        pool.acquire(&key("a")).await,
        Err(Error::Closed { .. })
    ));
    assert_eq!(pool.resource().cleaned().len(), 1);
    assert_eq!(pool.stats().disposed, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_waits_for_borrowed_instances() {
    let pool = Pool::new(Tracked::new(), PoolConfig::default()).unwrap();
    let handle = pool.acquire(&key("a")).await.unwrap();

    let shutdown = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.shutdown().await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!shutdown.is_finished());
    assert!(pool.resource().cleaned().is_empty());

    drop(handle);
    shutdown.await.unwrap().unwrap();
    assert_eq!(pool.resource().cleaned().len(), 1);
}

#[tokio::test]
async fn shutdown_times_out_but_still_disposes_late_releases() {
    let config = PoolConfig {
        drain_timeout: Duration::from_millis(30),
        ..Default::default()
    };
    let pool = Pool::new(Tracked::new(), config).unwrap();
    let handle = pool.acquire(&key("a")).await.unwrap();

    let err = pool.shutdown().await.unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }), "got {err:?}");

    drop(handle);
    assert!(wait_until(|| pool.resource().cleaned().len() == 1).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn late_releases_respect_the_disposal_limit() {
    let config = PoolConfig {
        capacity: 8,
        drain_timeout: Duration::from_millis(20),
        max_concurrent_disposals: 2,
        ..Default::default()
    };
    let pool = Pool::new(
        Tracked::with_cleanup_delay(Duration::from_millis(20)),
        config,
    )
    .unwrap();

    let mut handles = Vec::new();
    for i in 0..6 {
        handles.push(pool.acquire(&key(&format!("k{i}"))).await.unwrap());
    }
    assert!(pool.shutdown().await.is_err());

    drop(handles);
    assert!(wait_until(|| pool.stats().disposed == 6).await);
    assert_eq!(pool.resource().cleaned().len(), 6);
    assert!(
        pool.resource().peak_cleaning() <= 2,
        "peak was {}",
        pool.resource().peak_cleaning()
    );
}

#[tokio::test]
async fn shutdown_is_idempotent() {
    let pool = Pool::new(Tracked::new(), PoolConfig::default()).unwrap();
    pool.shutdown().await.unwrap();
    pool.shutdown().await.unwrap();
}

#[tokio::test]
async fn invalidate_handle_spares_a_replacement() {
    let pool = Pool::new(Tracked::new(), PoolConfig::default()).unwrap();
    let stale = pool.acquire(&key("a")).await.unwrap();
    assert!(pool.invalidate_handle(&stale));

    let fresh = pool.acquire(&key("a")).await.unwrap();
    assert!(!pool.invalidate_handle(&stale));
    assert!(pool.contains(&key("a")));
    assert!(pool.invalidate_handle(&fresh));
}
