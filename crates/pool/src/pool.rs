//! Keyed resource pool.
//!
//! `Pool<R>` maps `R::Key` to at most one live `R::Instance`. The index is a
//! single `parking_lot::Mutex` over:
//!
//! - `resident`: instances that can be handed out, in LRU order;
//! - `creating`: keys whose creation is in flight, each with a `watch`
//!   channel that waiters subscribe to;
//! - `retired`: instances no longer reachable by key that still have
//!   borrowers. They are disposed when the last borrower lets go.
//!
//! All three count against `capacity`. The lock is never held across an
//! `.await`.
//!
//! Callers that wait on a creation hold a [`Ticket`]. When the instance is
//! published it starts with one reserved borrow per ticket, and eviction
//! skips it until every ticket has been redeemed or given back.

use std::collections::HashMap;
use std::fmt;
use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;

use crate::config::{AbandonPolicy, PoolConfig};
use crate::disposal::{Disposal, DisposeReason, Disposer};
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::resource::{BoxError, Resource};

// ---------------------------------------------------------------------------
// Pool internals
// ---------------------------------------------------------------------------

/// A created instance. Exclusively owned by the pool; handles borrow it.
pub(crate) struct Entry<R: Resource> {
    pub(crate) key: R::Key,
    pub(crate) generation: u64,
    pub(crate) instance: tokio::sync::Mutex<R::Instance>,
}

/// Index bookkeeping for one entry.
struct Slot<R: Resource> {
    entry: Arc<Entry<R>>,
    borrowers: usize,
    /// Waiters of the creation that have not picked the entry up yet.
    reserved: usize,
}

impl<R: Resource> Slot<R> {
    fn is_idle(&self) -> bool {
        self.borrowers == 0 && self.reserved == 0
    }
}

/// Broadcast state of an in-flight creation.
#[derive(Debug, Clone)]
enum Outcome {
    Pending,
    Ready,
    Failed(Error),
    Abandoned,
}

struct Creation {
    generation: u64,
    rx: watch::Receiver<Outcome>,
    /// Outstanding tickets for this creation.
    waiters: usize,
}

struct State<R: Resource> {
    resident: LruCache<R::Key, Slot<R>>,
    creating: HashMap<R::Key, Creation>,
    retired: HashMap<u64, (Slot<R>, DisposeReason)>,
    closed: bool,
    disposer: Disposer<R>,
}

impl<R: Resource> State<R> {
    fn occupied(&self) -> usize {
        self.resident.len() + self.creating.len() + self.retired.len()
    }
}

/// Pool statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Total successful acquisitions.
    pub total_acquisitions: u64,
    /// Total handle releases.
    pub total_releases: u64,
    /// Total instances ever created.
    pub created: u64,
    /// Factory calls that returned an error.
    pub creation_failures: u64,
    /// Idle instances evicted to make room for another key.
    pub evictions: u64,
    /// Instances whose disposal has finished (successfully or not).
    pub disposed: u64,
    /// Disposals that returned an error or panicked.
    pub disposal_failures: u64,
    /// Instances currently held by the pool, retired ones included.
    pub resident: usize,
    /// Outstanding handles.
    pub borrowed: usize,
    /// Creations in flight.
    pub creating: usize,
}

/// Inner shared state for the pool.
struct PoolInner<R: Resource> {
    resource: Arc<R>,
    config: PoolConfig,
    state: Mutex<State<R>>,
    stats: Arc<Mutex<PoolStats>>,
    /// Signalled whenever a slot may have become available.
    capacity_changed: Notify,
    next_generation: AtomicU64,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<R: Resource> PoolInner<R> {
    fn retire(&self, state: &mut State<R>, slot: Slot<R>, reason: DisposeReason) {
        if slot.borrowers == 0 {
            dispose_entry(&state.disposer, slot.entry, reason);
        } else {
            let generation = slot.entry.generation;
            tracing::debug!(
                component = self.resource.id(),
                operation = "retire",
                generation,
                borrowers = slot.borrowers,
                %reason,
                "entry retired, disposal deferred until released"
            );
            state.retired.insert(generation, (slot, reason));
        }
    }

    /// Evict the least-recently-used entry nobody is borrowing.
    fn evict_idle(&self, state: &mut State<R>) -> bool {
        let victim = state
            .resident
            .iter()
            .rev()
            .find(|(_, slot)| slot.is_idle())
            .map(|(key, _)| key.clone());
        let Some(victim) = victim else {
            return false;
        };
        let Some(slot) = state.resident.pop(&victim) else {
            return false;
        };

        self.stats.lock().evictions += 1;
        tracing::debug!(
            component = self.resource.id(),
            operation = "evict",
            key = ?victim,
            generation = slot.entry.generation,
            "evicting idle entry"
        );
        dispose_entry(&state.disposer, slot.entry, DisposeReason::Evicted);
        true
    }
}

impl<R: Resource> Drop for PoolInner<R> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        let mut leftovers = Vec::with_capacity(state.resident.len() + state.retired.len());
        while let Some((_, slot)) = state.resident.pop_lru() {
            leftovers.push(slot.entry);
        }
        leftovers.extend(state.retired.drain().map(|(_, (slot, _))| slot.entry));
        for entry in leftovers {
            dispose_entry(&state.disposer, entry, DisposeReason::Dropped);
        }
    }
}

/// Hand an entry's instance to the disposal queue.
///
/// Only called once the index holds the last reference to `entry`.
fn dispose_entry<R: Resource>(
    disposer: &Disposer<R>,
    entry: Arc<Entry<R>>,
    reason: DisposeReason,
) {
    match Arc::try_unwrap(entry) {
        Ok(entry) => disposer.submit(Disposal {
            key: entry.key,
            generation: entry.generation,
            instance: entry.instance.into_inner(),
            reason,
        }),
        Err(entry) => {
            debug_assert!(false, "disposing an entry that is still borrowed");
            tracing::error!(
                operation = "dispose",
                generation = entry.generation,
                "entry still shared at disposal, skipping cleanup"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

/// Reservation for one in-flight creation.
///
/// Exactly one of `finish` or `Drop` publishes the outcome. Dropping an
/// unfinished guard frees the key and tells waiters the creation was
/// abandoned.
struct CreationGuard<R: Resource> {
    pool: Pool<R>,
    key: R::Key,
    generation: u64,
    tx: watch::Sender<Outcome>,
    finished: bool,
}

impl<R: Resource> CreationGuard<R> {
    fn subscribe(&self) -> watch::Receiver<Outcome> {
        self.tx.subscribe()
    }

    /// Publish the factory result. With `claim`, the caller gets the first
    /// borrow of the new instance.
    fn finish(
        mut self,
        result: std::result::Result<R::Instance, BoxError>,
        claim: bool,
    ) -> Result<Option<Handle<R>>> {
        self.finished = true;
        let inner = &self.pool.inner;
        let resource_id = inner.resource.id();

        let (outcome, returned) = {
            let mut state = inner.state.lock();
            let waiters = if state
                .creating
                .get(&self.key)
                .is_some_and(|c| c.generation == self.generation)
            {
                state.creating.remove(&self.key).map_or(0, |c| c.waiters)
            } else {
                0
            };

            match result {
                Ok(instance) if state.closed => {
                    state.disposer.submit(Disposal {
                        key: self.key.clone(),
                        generation: self.generation,
                        instance,
                        reason: DisposeReason::Shutdown,
                    });
                    let error = Error::closed(resource_id);
                    (Outcome::Failed(error.clone()), Err(error))
                }
                Ok(instance) => {
                    let entry = Arc::new(Entry {
                        key: self.key.clone(),
                        generation: self.generation,
                        instance: tokio::sync::Mutex::new(instance),
                    });
                    let slot = Slot {
                        entry: Arc::clone(&entry),
                        borrowers: usize::from(claim),
                        reserved: waiters,
                    };
                    if let Some((_, previous)) = state.resident.push(self.key.clone(), slot) {
                        debug_assert!(false, "created an entry for a resident key");
                        inner.retire(&mut state, previous, DisposeReason::Invalidated);
                    }
                    {
                        let mut stats = inner.stats.lock();
                        stats.created += 1;
                        if claim {
                            stats.total_acquisitions += 1;
                        }
                    }
                    let handle = claim.then(|| Handle::new(self.pool.clone(), entry));
                    (Outcome::Ready, Ok(handle))
                }
                Err(cause) => {
                    inner.stats.lock().creation_failures += 1;
                    let error = Error::unavailable(resource_id, cause);
                    (Outcome::Failed(error.clone()), Err(error))
                }
            }
        };

        match &outcome {
            Outcome::Ready => tracing::debug!(
                component = resource_id,
                operation = "create",
                key = ?self.key,
                generation = self.generation,
                "resource created"
            ),
            Outcome::Failed(error) => tracing::warn!(
                component = resource_id,
                operation = "create",
                key = ?self.key,
                %error,
                "resource creation failed"
            ),
            Outcome::Pending | Outcome::Abandoned => {}
        }

        self.tx.send_replace(outcome);
        inner.capacity_changed.notify_waiters();
        returned
    }
}

impl<R: Resource> Drop for CreationGuard<R> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let inner = &self.pool.inner;
        {
            let mut state = inner.state.lock();
            if state
                .creating
                .get(&self.key)
                .is_some_and(|c| c.generation == self.generation)
            {
                state.creating.remove(&self.key);
            }
        }
        tracing::warn!(
            component = inner.resource.id(),
            operation = "create",
            key = ?self.key,
            "creation abandoned before completion"
        );
        self.tx.send_replace(Outcome::Abandoned);
        inner.capacity_changed.notify_waiters();
    }
}

/// A waiter's claim on an instance that is still being created.
///
/// Redeemed when the waiter borrows the published entry. An unredeemed
/// ticket gives its reservation back, either under a lock the pool already
/// holds (`cancel`) or on drop.
struct Ticket<R: Resource> {
    pool: Pool<R>,
    key: R::Key,
    generation: u64,
    settled: bool,
}

impl<R: Resource> Ticket<R> {
    /// Take the borrow reserved in `slot`, if it is the entry this ticket
    /// waited for.
    fn redeem(&mut self, slot: &mut Slot<R>) -> bool {
        if self.settled || slot.entry.generation != self.generation {
            return false;
        }
        self.settled = true;
        debug_assert!(slot.reserved > 0, "redeemed a ticket without reservation");
        slot.reserved = slot.reserved.saturating_sub(1);
        true
    }

    /// Give the reservation back. Returns `true` if that left an idle entry.
    fn cancel(&mut self, state: &mut State<R>) -> bool {
        if std::mem::replace(&mut self.settled, true) {
            return false;
        }
        if let Some(creation) = state
            .creating
            .get_mut(&self.key)
            .filter(|c| c.generation == self.generation)
        {
            creation.waiters = creation.waiters.saturating_sub(1);
            return false;
        }
        match state
            .resident
            .peek_mut(&self.key)
            .filter(|slot| slot.entry.generation == self.generation)
        {
            Some(slot) => {
                slot.reserved = slot.reserved.saturating_sub(1);
                slot.is_idle()
            }
            None => false,
        }
    }
}

impl<R: Resource> Drop for Ticket<R> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let pool = self.pool.clone();
        let freed = self.cancel(&mut pool.inner.state.lock());
        if freed {
            pool.inner.capacity_changed.notify_waiters();
        }
    }
}

/// What `acquire` should do next, decided under the index lock.
enum Step<R: Resource> {
    Acquired(Handle<R>),
    Wait(watch::Receiver<Outcome>),
    Create(CreationGuard<R>),
    Full,
}

// ---------------------------------------------------------------------------
// Pool<R>
// ---------------------------------------------------------------------------

/// Bounded, keyed, single-flight resource pool.
///
/// Cheap to clone; clones share the same index. Must be created inside a
/// Tokio runtime because it starts a background disposal worker.
pub struct Pool<R: Resource> {
    inner: Arc<PoolInner<R>>,
}

impl<R: Resource> Clone for Pool<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Resource> fmt::Debug for Pool<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("resource_id", &self.inner.resource.id())
            .field("capacity", &self.inner.config.capacity)
            .field("stats", &self.stats())
            .finish()
    }
}

impl<R: Resource> Pool<R> {
    /// Create a new pool for the given resource and settings.
    ///
    /// # Errors
    /// Returns error if `config` is invalid (e.g. capacity == 0).
    pub fn new(resource: R, config: PoolConfig) -> Result<Self> {
        config.validate()?;
        let resource = Arc::new(resource);
        let stats = Arc::new(Mutex::new(PoolStats::default()));
        let (disposer, worker) = Disposer::spawn(
            Arc::clone(&resource),
            Arc::clone(&stats),
            config.max_concurrent_disposals,
        );

        let capacity = config.capacity;
        Ok(Self {
            inner: Arc::new(PoolInner {
                resource,
                config,
                state: Mutex::new(State {
                    resident: LruCache::unbounded(),
                    creating: HashMap::with_capacity(capacity),
                    retired: HashMap::new(),
                    closed: false,
                    disposer,
                }),
                stats,
                capacity_changed: Notify::new(),
                next_generation: AtomicU64::new(1),
                worker: Mutex::new(Some(worker)),
            }),
        })
    }

    /// Borrow the instance for `key`, creating it if needed.
    ///
    /// Concurrent calls for a key without an instance share one creation.
    /// When the pool is full, the least-recently-used idle instance is evicted;
    /// if every instance is borrowed, waits up to `acquire_timeout` for one to
    /// be released.
    pub async fn acquire(&self, key: &R::Key) -> Result<Handle<R>> {
        let inner = &self.inner;
        let started = tokio::time::Instant::now();
        let deadline = started + inner.config.acquire_timeout;

        let mut ticket = None;
        loop {
            let mut notified = pin!(inner.capacity_changed.notified());
            let step = {
                let mut state = inner.state.lock();
                let step = self.step(&mut state, key, &mut ticket)?;
                if matches!(step, Step::Full) {
                    // Register before unlocking so a release in between is
                    // not missed.
                    notified.as_mut().enable();
                }
                step
            };

            match step {
                Step::Acquired(handle) => return Ok(handle),
                Step::Wait(rx) => self.await_creation(rx).await?,
                Step::Create(guard) => {
                    if let Some(handle) = self.create(key, guard).await? {
                        return Ok(handle);
                    }
                }
                Step::Full => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        let waited_ms = started.elapsed().as_millis() as u64;
                        tracing::warn!(
                            component = inner.resource.id(),
                            operation = "acquire",
                            key = ?key,
                            capacity = inner.config.capacity,
                            waited_ms,
                            "pool exhausted"
                        );
                        return Err(Error::PoolExhausted {
                            resource_id: inner.resource.id().to_string(),
                            capacity: inner.config.capacity,
                            waited_ms,
                        });
                    }
                }
            }
        }
    }

    /// Decide the next move for `key`. `ticket` carries the caller's
    /// reservation from one step to the next; it is redeemed or settled here
    /// so that it is never dropped while `state` is locked.
    fn step(
        &self,
        state: &mut State<R>,
        key: &R::Key,
        ticket: &mut Option<Ticket<R>>,
    ) -> Result<Step<R>> {
        let inner = &self.inner;
        let mut held = ticket.take();
        if state.closed {
            self.settle(state, held);
            return Err(Error::closed(inner.resource.id()));
        }

        if let Some(slot) = state.resident.get_mut(key) {
            // A borrowed or freshly created instance is not revalidated.
            let usable = !slot.is_idle()
                || slot
                    .entry
                    .instance
                    .try_lock()
                    .map_or(true, |instance| inner.resource.is_valid(&instance));
            if usable {
                if let Some(claim) = held.as_mut() {
                    claim.redeem(slot);
                }
                slot.borrowers += 1;
                let entry = Arc::clone(&slot.entry);
                self.settle(state, held);
                inner.stats.lock().total_acquisitions += 1;
                return Ok(Step::Acquired(Handle::new(self.clone(), entry)));
            }
            if let Some(slot) = state.resident.pop(key) {
                tracing::debug!(
                    component = inner.resource.id(),
                    operation = "acquire",
                    key = ?key,
                    generation = slot.entry.generation,
                    "idle entry failed validation, recreating"
                );
                inner.retire(state, slot, DisposeReason::Invalid);
            }
        }

        self.settle(state, held);

        if let Some(creation) = state.creating.get_mut(key) {
            creation.waiters += 1;
            *ticket = Some(self.ticket(key, creation.generation));
            return Ok(Step::Wait(creation.rx.clone()));
        }

        while state.occupied() >= inner.config.capacity {
            if !inner.evict_idle(state) {
                return Ok(Step::Full);
            }
        }

        let generation = inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = watch::channel(Outcome::Pending);
        // A detached creation publishes without claiming, so its caller
        // waits on a ticket like everyone else.
        let waiters = if inner.config.abandon_policy == AbandonPolicy::Detach {
            *ticket = Some(self.ticket(key, generation));
            1
        } else {
            0
        };
        state.creating.insert(
            key.clone(),
            Creation {
                generation,
                rx,
                waiters,
            },
        );
        Ok(Step::Create(CreationGuard {
            pool: self.clone(),
            key: key.clone(),
            generation,
            tx,
            finished: false,
        }))
    }

    fn ticket(&self, key: &R::Key, generation: u64) -> Ticket<R> {
        Ticket {
            pool: self.clone(),
            key: key.clone(),
            generation,
            settled: false,
        }
    }

    /// Give back an unredeemed ticket while `state` is already locked.
    fn settle(&self, state: &mut State<R>, ticket: Option<Ticket<R>>) {
        if let Some(mut ticket) = ticket
            && ticket.cancel(state)
        {
            self.inner.capacity_changed.notify_waiters();
        }
    }

    async fn create(&self, key: &R::Key, guard: CreationGuard<R>) -> Result<Option<Handle<R>>> {
        let inner = &self.inner;
        match inner.config.abandon_policy {
            AbandonPolicy::Detach => {
                let rx = guard.subscribe();
                let resource = Arc::clone(&inner.resource);
                let key = key.clone();
                drop(tokio::spawn(async move {
                    let result = resource.create(&key).await;
                    // The entry is reserved for every ticket holder,
                    // the caller that started it included.
                    let _ = guard.finish(result, false);
                }));
                self.await_creation(rx).await?;
                Ok(None)
            }
            AbandonPolicy::Fail | AbandonPolicy::Retry => {
                let result = inner.resource.create(key).await;
                guard.finish(result, true)
            }
        }
    }

    /// Wait for someone else's creation. `Ok` means look the key up again.
    async fn await_creation(&self, mut rx: watch::Receiver<Outcome>) -> Result<()> {
        let outcome = {
            let result = rx
                .wait_for(|outcome| !matches!(outcome, Outcome::Pending))
                .await;
            match result {
                Ok(outcome) => (*outcome).clone(),
                Err(_) => Outcome::Abandoned,
            }
        };

        match outcome {
            Outcome::Pending | Outcome::Ready => Ok(()),
            Outcome::Failed(error) => Err(error),
            Outcome::Abandoned => match self.inner.config.abandon_policy {
                AbandonPolicy::Retry => Ok(()),
                AbandonPolicy::Detach | AbandonPolicy::Fail => Err(Error::CreationAbandoned {
                    resource_id: self.inner.resource.id().to_string(),
                }),
            },
        }
    }

    /// Drop one borrow. Called from `Handle::drop`.
    pub(crate) fn release(&self, entry: Arc<Entry<R>>, held_for: Duration) {
        let inner = &self.inner;
        let key = entry.key.clone();
        let generation = entry.generation;

        let freed = {
            let mut state = inner.state.lock();
            // Give up the handle's reference first: a zero borrow count then
            // means the index holds the only one.
            drop(entry);
            inner.stats.lock().total_releases += 1;

            if let Some(slot) = state
                .resident
                .peek_mut(&key)
                .filter(|slot| slot.entry.generation == generation)
            {
                debug_assert!(slot.borrowers > 0, "release without borrow");
                slot.borrowers = slot.borrowers.saturating_sub(1);
                slot.is_idle()
            } else if let Some((slot, _)) = state.retired.get_mut(&generation) {
                slot.borrowers = slot.borrowers.saturating_sub(1);
                if slot.borrowers == 0 {
                    if let Some((slot, reason)) = state.retired.remove(&generation) {
                        dispose_entry(&state.disposer, slot.entry, reason);
                    }
                    true
                } else {
                    false
                }
            } else {
                debug_assert!(false, "released handle has no pool entry");
                tracing::error!(
                    component = inner.resource.id(),
                    operation = "release",
                    generation,
                    "released handle has no pool entry"
                );
                false
            }
        };

        tracing::trace!(
            component = inner.resource.id(),
            operation = "release",
            key = ?key,
            generation,
            held_ms = held_for.as_millis() as u64,
            "handle released"
        );
        if freed {
            inner.capacity_changed.notify_waiters();
        }
    }

    /// Remove the entry for `key` so the next `acquire` creates a fresh one.
    ///
    /// An idle instance is disposed right away; a borrowed one once its last
    /// handle is dropped. Returns `false` if the key had no resident entry.
    pub fn invalidate(&self, key: &R::Key) -> bool {
        self.invalidate_matching(key, None)
    }

    /// Like [`Pool::invalidate`], but only if the resident entry is the one
    /// `handle` borrows. A replacement created in the meantime is left alone.
    pub fn invalidate_handle(&self, handle: &Handle<R>) -> bool {
        self.invalidate_matching(handle.key(), Some(handle.generation()))
    }

    fn invalidate_matching(&self, key: &R::Key, generation: Option<u64>) -> bool {
        let inner = &self.inner;
        let removed = {
            let mut state = inner.state.lock();
            let matches = state
                .resident
                .peek(key)
                .is_some_and(|slot| generation.is_none_or(|g| slot.entry.generation == g));
            let popped = if matches { state.resident.pop(key) } else { None };
            match popped {
                Some(slot) => {
                    inner.retire(&mut state, slot, DisposeReason::Invalidated);
                    true
                }
                None => false,
            }
        };
        if removed {
            tracing::debug!(
                component = inner.resource.id(),
                operation = "invalidate",
                key = ?key,
                "entry invalidated"
            );
            inner.capacity_changed.notify_waiters();
        }
        removed
    }

    /// Close the pool and dispose of every instance.
    ///
    /// New `acquire` calls fail with [`Error::Closed`]. Idle instances are
    /// disposed immediately; borrowed ones as they come back, for up to
    /// `drain_timeout`. Returns once the disposal queue has been worked off.
    ///
    /// # Errors
    /// [`Error::Timeout`] if borrowers were still out when the drain timed
    /// out. Their instances are disposed whenever they are released.
    pub async fn shutdown(&self) -> Result<()> {
        let inner = &self.inner;
        {
            let mut state = inner.state.lock();
            if !state.closed {
                state.closed = true;
                while let Some((_, slot)) = state.resident.pop_lru() {
                    inner.retire(&mut state, slot, DisposeReason::Shutdown);
                }
            }
        }
        inner.capacity_changed.notify_waiters();

        let deadline = tokio::time::Instant::now() + inner.config.drain_timeout;
        let mut drained = true;
        loop {
            let mut notified = pin!(inner.capacity_changed.notified());
            {
                let state = inner.state.lock();
                if state.retired.is_empty() && state.creating.is_empty() {
                    break;
                }
                notified.as_mut().enable();
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                drained = false;
                break;
            }
        }

        inner.state.lock().disposer.close();
        let worker = inner.worker.lock().take();
        if let Some(worker) = worker
            && let Err(e) = worker.await
        {
            tracing::error!(
                component = inner.resource.id(),
                operation = "shutdown",
                error = %e,
                "disposal worker failed"
            );
        }

        if drained {
            tracing::info!(
                component = inner.resource.id(),
                operation = "shutdown",
                "pool shut down"
            );
            Ok(())
        } else {
            let remaining = inner.state.lock().retired.len();
            tracing::warn!(
                component = inner.resource.id(),
                operation = "shutdown",
                remaining,
                "borrowed entries still outstanding after drain timeout"
            );
            Err(Error::Timeout {
                resource_id: inner.resource.id().to_string(),
                timeout_ms: inner.config.drain_timeout.as_millis() as u64,
                operation: "shutdown".to_string(),
            })
        }
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let state = self.inner.state.lock();
        let mut stats = self.inner.stats.lock().clone();
        stats.resident = state.resident.len() + state.retired.len();
        stats.creating = state.creating.len();
        stats.borrowed = state
            .resident
            .iter()
            .map(|(_, slot)| slot.borrowers)
            .chain(state.retired.values().map(|(slot, _)| slot.borrowers))
            .sum();
        stats
    }

    /// Whether `key` has a resident entry. Does not touch recency.
    pub fn contains(&self, key: &R::Key) -> bool {
        self.inner.state.lock().resident.contains(key)
    }

    /// Number of resident entries reachable by key.
    pub fn len(&self) -> usize {
        self.inner.state.lock().resident.len()
    }

    /// Whether no entry is reachable by key.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.inner.config.capacity
    }

    /// Whether [`Pool::shutdown`] has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// The resource this pool manages.
    pub fn resource(&self) -> &R {
        &self.inner.resource
    }
}
