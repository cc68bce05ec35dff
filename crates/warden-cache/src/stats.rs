//! Cache counters
//!
//! Bumped with relaxed atomics from readers and the arbiter alike;
//! `snapshot()` is a best-effort view, not a consistent cut.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served from the table
    pub hits: u64,
    /// Reads that went to the arbiter
    pub misses: u64,
    /// Loader invocations
    pub loads: u64,
    /// Loader invocations that returned an error or panicked
    pub load_failures: u64,
    /// Misses that piggybacked on another caller's in-flight load
    pub coalesced: u64,
    /// Entries dropped to stay within capacity
    pub evictions: u64,
}

#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
    coalesced: AtomicU64,
    evictions: AtomicU64,
}

impl CacheCounters {
    #[inline]
    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
