//! Behaviour when the caller driving a creation goes away.

mod common;

use std::time::Duration;

use common::{Tracked, key};
use rstest::rstest;
use wharf_pool::{AbandonPolicy, Error, Pool, PoolConfig};

fn pool(policy: AbandonPolicy) -> Pool<Tracked> {
    let config = PoolConfig {
        abandon_policy: policy,
        ..Default::default()
    };
    Pool::new(Tracked::with_delay(Duration::from_millis(100)), config).unwrap()
}

/// Start a creation, attach a waiter, then abort the initiator.
async fn abandon_initiator(
    pool: &Pool<Tracked>,
) -> tokio::task::JoinHandle<wharf_pool::Result<u64>> {
    let initiator = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.acquire(&key("a")).await.map(|h| h.generation()) })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.acquire(&key("a")).await.map(|h| h.generation()) })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    initiator.abort();
    let _ = initiator.await;
    waiter
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn detached_creation_survives_initiator() {
    let pool = pool(AbandonPolicy::Detach);
    let waiter = abandon_initiator(&pool).await;

    assert!(waiter.await.unwrap().is_ok());
    assert_eq!(pool.resource().creates(), 1);
    assert!(pool.contains(&key("a")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fail_policy_reports_abandonment() {
    let pool = pool(AbandonPolicy::Fail);
    let waiter = abandon_initiator(&pool).await;

    let err = waiter.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::CreationAbandoned { .. }), "got {err:?}");
    assert!(!pool.contains(&key("a")));
    assert_eq!(pool.stats().creating, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn retry_policy_lets_a_waiter_create() {
    let pool = pool(AbandonPolicy::Retry);
    let waiter = abandon_initiator(&pool).await;

    assert!(waiter.await.unwrap().is_ok());
    assert_eq!(pool.resource().creates(), 2);
    assert!(pool.contains(&key("a")));
}

#[rstest]
#[case::detach(AbandonPolicy::Detach)]
#[case::fail(AbandonPolicy::Fail)]
#[case::retry(AbandonPolicy::Retry)]
#[tokio::test]
async fn cancelled_capacity_wait_leaks_nothing(#[case] policy: AbandonPolicy) {
    let config = PoolConfig {
        capacity: 1,
        abandon_policy: policy,
        ..Default::default()
    };
    let pool = Pool::new(Tracked::new(), config).unwrap();
    let held = pool.acquire(&key("a")).await.unwrap();

    let blocked = tokio::time::timeout(Duration::from_millis(30), pool.acquire(&key("b"))).await;
    assert!(blocked.is_err());

    drop(held);
    let handle = pool.acquire(&key("b")).await.unwrap();
    assert_eq!(handle.key(), "b");
    assert_eq!(pool.stats().creating, 0);
}
