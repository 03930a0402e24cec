//! Shared test resource for pool integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use wharf_pool::{BoxError, Resource};

/// A fake client connection.
#[derive(Debug)]
pub struct Conn {
    pub id: u64,
    pub key: String,
}

/// Resource that records every create and cleanup call.
#[derive(Default)]
pub struct Tracked {
    pub creates: AtomicUsize,
    next_id: AtomicU64,
    create_delay: Duration,
    failing: Mutex<HashSet<String>>,
    invalid: Mutex<HashSet<u64>>,
    cleaned: Mutex<Vec<u64>>,
    cleanup_delay: Duration,
    cleaning: AtomicUsize,
    peak_cleaning: AtomicUsize,
    pub cleanup_fails: AtomicBool,
    pub cleanup_panics: AtomicBool,
}

impl Tracked {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            create_delay: delay,
            ..Self::default()
        }
    }

    /// Make every cleanup take `delay`.
    pub fn with_cleanup_delay(delay: Duration) -> Self {
        Self {
            cleanup_delay: delay,
            ..Self::default()
        }
    }

    pub fn fail_key(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_string());
    }

    pub fn heal_key(&self, key: &str) {
        self.failing.lock().unwrap().remove(key);
    }

    pub fn mark_invalid(&self, id: u64) {
        self.invalid.lock().unwrap().insert(id);
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn cleaned(&self) -> Vec<u64> {
        self.cleaned.lock().unwrap().clone()
    }

    /// Most cleanups that were ever running at the same time.
    pub fn peak_cleaning(&self) -> usize {
        self.peak_cleaning.load(Ordering::SeqCst)
    }
}

impl Resource for Tracked {
    type Key = String;
    type Instance = Conn;

    fn id(&self) -> &str {
        "tracked"
    }

    async fn create(&self, key: &String) -> Result<Conn, BoxError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }
        if self.failing.lock().unwrap().contains(key) {
            return Err(format!("cannot reach {key}").into());
        }
        Ok(Conn {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            key: key.clone(),
        })
    }

    fn is_valid(&self, conn: &Conn) -> bool {
        !self.invalid.lock().unwrap().contains(&conn.id)
    }

    async fn cleanup(&self, conn: Conn) -> Result<(), BoxError> {
        let running = self.cleaning.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_cleaning.fetch_max(running, Ordering::SeqCst);
        if !self.cleanup_delay.is_zero() {
            tokio::time::sleep(self.cleanup_delay).await;
        }
        self.cleaning.fetch_sub(1, Ordering::SeqCst);
        self.cleaned.lock().unwrap().push(conn.id);
        if self.cleanup_panics.load(Ordering::SeqCst) {
            panic!("cleanup exploded for {}", conn.key);
        }
        if self.cleanup_fails.load(Ordering::SeqCst) {
            return Err("close failed".into());
        }
        Ok(())
    }
}

pub fn key(name: &str) -> String {
    name.to_string()
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
