//! Background disposal queue.
//!
//! Evicted and retired instances are pushed onto an unbounded channel and
//! disposed by a single worker task. Once the pool is shut down, late
//! disposals are spawned directly. Both paths share one semaphore, so at most
//! `max_concurrent_disposals` cleanups run at once.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::pool::PoolStats;
use crate::resource::Resource;

/// Why an instance is being disposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DisposeReason {
    /// Made room for another key.
    Evicted,
    /// Removed through `Pool::invalidate`.
    Invalidated,
    /// `Resource::is_valid` rejected the idle instance.
    Invalid,
    /// The pool was shut down.
    Shutdown,
    /// The last pool reference went away.
    Dropped,
}

impl fmt::Display for DisposeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Evicted => "evicted",
            Self::Invalidated => "invalidated",
            Self::Invalid => "invalid",
            Self::Shutdown => "shutdown",
            Self::Dropped => "dropped",
        };
        f.write_str(reason)
    }
}

/// An instance on its way out.
pub(crate) struct Disposal<R: Resource> {
    pub(crate) key: R::Key,
    pub(crate) generation: u64,
    pub(crate) instance: R::Instance,
    pub(crate) reason: DisposeReason,
}

/// Sending side of the disposal queue.
pub(crate) struct Disposer<R: Resource> {
    tx: Option<mpsc::UnboundedSender<Disposal<R>>>,
    resource: Arc<R>,
    stats: Arc<Mutex<PoolStats>>,
    permits: Arc<Semaphore>,
}

impl<R: Resource> Disposer<R> {
    /// Start the worker. Must be called from within a Tokio runtime.
    pub(crate) fn spawn(
        resource: Arc<R>,
        stats: Arc<Mutex<PoolStats>>,
        concurrency: usize,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let permits = Arc::new(Semaphore::new(concurrency));
        let worker = tokio::spawn(run(
            Arc::clone(&resource),
            Arc::clone(&stats),
            Arc::clone(&permits),
            rx,
            concurrency,
        ));
        let disposer = Self {
            tx: Some(tx),
            resource,
            stats,
            permits,
        };
        (disposer, worker)
    }

    /// Queue an instance for disposal. Never blocks.
    pub(crate) fn submit(&self, disposal: Disposal<R>) {
        let disposal = match &self.tx {
            Some(tx) => match tx.send(disposal) {
                Ok(()) => return,
                Err(mpsc::error::SendError(disposal)) => disposal,
            },
            None => disposal,
        };

        // The worker is gone (pool shut down); dispose on whatever runtime
        // is current instead.
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let resource = Arc::clone(&self.resource);
                let stats = Arc::clone(&self.stats);
                let permits = Arc::clone(&self.permits);
                drop(runtime.spawn(async move {
                    dispose_limited(&permits, &*resource, &stats, disposal).await;
                }));
            }
            Err(_) => {
                tracing::warn!(
                    component = self.resource.id(),
                    operation = "dispose",
                    generation = disposal.generation,
                    "no runtime available, dropping instance without cleanup"
                );
            }
        }
    }

    /// Stop accepting work. The worker drains what is already queued.
    pub(crate) fn close(&mut self) {
        self.tx = None;
    }
}

async fn run<R: Resource>(
    resource: Arc<R>,
    stats: Arc<Mutex<PoolStats>>,
    permits: Arc<Semaphore>,
    rx: mpsc::UnboundedReceiver<Disposal<R>>,
    concurrency: usize,
) {
    UnboundedReceiverStream::new(rx)
        .for_each_concurrent(concurrency, |disposal| {
            let resource = Arc::clone(&resource);
            let stats = Arc::clone(&stats);
            let permits = Arc::clone(&permits);
            async move { dispose_limited(&permits, &*resource, &stats, disposal).await }
        })
        .await;
}

/// Run one disposal once a cleanup slot is free.
async fn dispose_limited<R: Resource>(
    permits: &Semaphore,
    resource: &R,
    stats: &Mutex<PoolStats>,
    disposal: Disposal<R>,
) {
    // The semaphore is never closed.
    let _permit = permits.acquire().await.ok();
    dispose_one(resource, stats, disposal).await;
}

async fn dispose_one<R: Resource>(resource: &R, stats: &Mutex<PoolStats>, disposal: Disposal<R>) {
    let Disposal {
        key,
        generation,
        instance,
        reason,
    } = disposal;

    let outcome = AssertUnwindSafe(resource.cleanup(instance))
        .catch_unwind()
        .await;

    let failure = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(_) => Some("cleanup panicked".to_string()),
    };

    {
        let mut stats = stats.lock();
        stats.disposed += 1;
        if failure.is_some() {
            stats.disposal_failures += 1;
        }
    }

    match failure {
        None => tracing::debug!(
            component = resource.id(),
            operation = "dispose",
            key = ?key,
            generation,
            %reason,
            "resource disposed"
        ),
        Some(error) => tracing::error!(
            component = resource.id(),
            operation = "dispose",
            key = ?key,
            generation,
            %reason,
            %error,
            "failed to close resource after removing it from the pool"
        ),
    }
}
