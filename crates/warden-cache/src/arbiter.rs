//! MutationArbiter - the single logical writer for the LRU table
//!
//! Every insert, eviction and promotion goes through here. Readers in
//! `CacheStore` only ever take the shared half of the table lock.
//!
//! # Miss resolution (singleflight)
//!
//! ```text
//!   get("k") miss ──► claim("k")
//!                       │
//!           ┌───────────┴────────────┐
//!           ▼                        ▼
//!     Leader (first miss)      Waiter (load in flight)
//!       re-check table            wait on slot condvar
//!       loader.load("k")                 ▲
//!       write lock: insert/evict         │
//!       remove in-flight record          │
//!       publish outcome ─────────────────┘
//! ```
//!
//! The loader runs with no table lock held, so misses on other keys and
//! readers proceed while it is busy. The write lock is taken only for the
//! insert (plus at most one eviction) that follows.
//!
//! A loader that calls back into the same cache for the key it is loading
//! will wait on its own in-flight record forever.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex, RwLock};
use tracing::{debug, error, trace, warn};

use crate::error::{CacheError, CacheResult};
use crate::loader::Loader;
use crate::lru::LruTable;
use crate::stats::CacheCounters;
use crate::store::{Fetched, Lookup};

/// Per-key bookkeeping for a load in progress
struct InFlight<V> {
    /// Set exactly once by the leader
    outcome: Mutex<Option<CacheResult<V>>>,
    ready: Condvar,
    /// Callers parked on this record (excluding the leader)
    waiters: AtomicUsize,
}

impl<V: Clone> InFlight<V> {
    fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
            ready: Condvar::new(),
            waiters: AtomicUsize::new(0),
        }
    }

    fn wait(&self) -> CacheResult<V> {
        let mut outcome = self.outcome.lock();
        loop {
            if let Some(result) = outcome.as_ref() {
                return result.clone();
            }
            self.ready.wait(&mut outcome);
        }
    }

    /// Store the outcome and wake everyone; returns the waiter count
    fn publish(&self, result: CacheResult<V>) -> usize {
        *self.outcome.lock() = Some(result);
        self.ready.notify_all();
        self.waiters.load(Ordering::Acquire)
    }
}

enum Role<V> {
    Leader(Arc<InFlight<V>>),
    Waiter(Arc<InFlight<V>>),
}

pub(crate) struct MutationArbiter<K, V> {
    table: Arc<RwLock<LruTable<K, V>>>,
    inflight: Mutex<HashMap<K, Arc<InFlight<V>>>>,
    loader: Box<dyn Loader<K, V>>,
    counters: Arc<CacheCounters>,
}

impl<K, V> MutationArbiter<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub(crate) fn new(
        table: Arc<RwLock<LruTable<K, V>>>,
        loader: Box<dyn Loader<K, V>>,
        counters: Arc<CacheCounters>,
    ) -> Self {
        Self {
            table,
            inflight: Mutex::new(HashMap::new()),
            loader,
            counters,
        }
    }

    /// Resolve a miss for `key`, loading it at most once across all
    /// concurrent callers
    pub(crate) fn resolve(&self, key: &K) -> CacheResult<Fetched<V>> {
        match self.claim(key) {
            Role::Leader(slot) => self.lead(key, &slot),
            Role::Waiter(slot) => {
                self.counters.coalesced();
                trace!(key = ?key, "joining in-flight load");
                slot.wait().map(|value| Fetched::new(value, Lookup::Coalesced))
            }
        }
    }

    /// Mark `key` as most recently used
    pub(crate) fn promote<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut table = self.table.write();
        let promoted = table.promote(key);
        debug_assert!(table.check_invariants(), "LRU order and mapping diverged");
        promoted
    }

    /// Number of keys with a load currently in flight
    pub(crate) fn in_flight(&self) -> usize {
        self.inflight.lock().len()
    }

    fn claim(&self, key: &K) -> Role<V> {
        let mut inflight = self.inflight.lock();
        if let Some(slot) = inflight.get(key) {
            slot.waiters.fetch_add(1, Ordering::AcqRel);
            return Role::Waiter(Arc::clone(slot));
        }
        let slot = Arc::new(InFlight::new());
        inflight.insert(key.clone(), Arc::clone(&slot));
        Role::Leader(slot)
    }

    fn lead(&self, key: &K, slot: &InFlight<V>) -> CacheResult<Fetched<V>> {
        // A previous episode may have installed the key after our caller's read.
        let cached = self.table.read().get(key).cloned();
        if let Some(value) = cached {
            self.promote(key);
            self.finish(key, slot, Ok(value.clone()));
            return Ok(Fetched::new(value, Lookup::Hit));
        }

        self.counters.load();
        debug!(key = ?key, "cache miss, loading");

        match panic::catch_unwind(AssertUnwindSafe(|| self.loader.load(key))) {
            Ok(Ok(value)) => {
                self.install(key.clone(), value.clone());
                self.finish(key, slot, Ok(value.clone()));
                Ok(Fetched::new(value, Lookup::Loaded))
            }
            Ok(Err(err)) => {
                self.counters.load_failure();
                warn!(key = ?key, error = %err, "load failed");
                let err = CacheError::LoadFailure(err);
                self.finish(key, slot, Err(err.clone()));
                Err(err)
            }
            Err(payload) => {
                self.counters.load_failure();
                error!(key = ?key, "loader panicked");
                self.finish(key, slot, Err(CacheError::LoaderPanicked));
                panic::resume_unwind(payload)
            }
        }
    }

    fn install(&self, key: K, value: V) {
        let evicted = {
            let mut table = self.table.write();
            let evicted = table.insert(key, value);
            debug_assert!(table.check_invariants(), "LRU order and mapping diverged");
            evicted
        };
        // Evicted value is dropped here, outside the write lock.
        if let Some((old, _)) = evicted {
            self.counters.eviction();
            debug!(evicted = ?old, "evicted least-recently-used entry");
        }
    }

    fn finish(&self, key: &K, slot: &InFlight<V>, result: CacheResult<V>) {
        self.inflight.lock().remove(key);
        let waiters = slot.publish(result);
        if waiters > 0 {
            trace!(key = ?key, waiters, "released coalesced waiters");
        }
    }
}
