//! RAII handle for borrowed pool instances

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::MutexGuard;

use crate::pool::{Entry, Pool};
use crate::resource::Resource;

/// A borrowed pool instance.
///
/// The instance stays owned by the pool. Dropping the handle releases the
/// borrow exactly once, on every exit path; it never closes the instance.
///
/// Several handles may point at the same instance. [`Handle::lock`] gives
/// exclusive access, so borrowers sharing an instance take turns.
pub struct Handle<R: Resource> {
    pool: Pool<R>,
    entry: Option<Arc<Entry<R>>>,
    acquired_at: Instant,
}

impl<R: Resource> Handle<R> {
    pub(crate) fn new(pool: Pool<R>, entry: Arc<Entry<R>>) -> Self {
        Self {
            pool,
            entry: Some(entry),
            acquired_at: Instant::now(),
        }
    }

    fn entry(&self) -> &Entry<R> {
        self.entry.as_ref().expect("handle used after release")
    }

    /// The key this instance was created for.
    pub fn key(&self) -> &R::Key {
        &self.entry().key
    }

    /// Identifier of the underlying instance, unique within the pool.
    pub fn generation(&self) -> u64 {
        self.entry().generation
    }

    /// Wait for exclusive access to the instance.
    pub async fn lock(&self) -> MutexGuard<'_, R::Instance> {
        self.entry().instance.lock().await
    }

    /// Whether both handles borrow the same instance.
    pub fn same_resource(&self, other: &Self) -> bool {
        match (&self.entry, &other.entry) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<R: Resource> Drop for Handle<R> {
    fn drop(&mut self) {
        if let Some(entry) = self.entry.take() {
            self.pool.release(entry, self.acquired_at.elapsed());
        }
    }
}

impl<R: Resource> fmt::Debug for Handle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Handle");
        if let Some(entry) = &self.entry {
            s.field("key", &entry.key)
                .field("generation", &entry.generation);
        }
        s.field("held_for", &self.acquired_at.elapsed()).finish()
    }
}
