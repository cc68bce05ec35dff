//! CacheStore - concurrent read front of the LRU cache
//!
//! Readers take the shared half of the table lock and never block each
//! other. Anything that changes the table (promotion on a hit, insert and
//! eviction on a miss) is handed to the `MutationArbiter`.

use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;
use warden_core::WardenResult;

use crate::arbiter::MutationArbiter;
use crate::config::CacheConfig;
use crate::error::CacheResult;
use crate::loader::Loader;
use crate::lru::LruTable;
use crate::stats::{CacheCounters, CacheStats};

/// How a `get` was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Key was already resident
    Hit,
    /// This caller ran the loader and installed the value
    Loaded,
    /// This caller waited on another caller's load for the same key
    Coalesced,
}

/// Value returned by `CacheStore::get`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched<V> {
    pub value: V,
    pub lookup: Lookup,
}

impl<V> Fetched<V> {
    #[inline]
    pub(crate) fn new(value: V, lookup: Lookup) -> Self {
        Self { value, lookup }
    }

    /// True if the value came straight from the table
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.lookup == Lookup::Hit
    }

    #[inline]
    pub fn into_value(self) -> V {
        self.value
    }
}

/// Capacity-bounded LRU cache, safe to share between threads
///
/// # Example
///
/// ```ignore
/// use warden_cache::{CacheConfig, CacheStore, LoadError};
///
/// let cache: CacheStore = CacheStore::new(CacheConfig::new(), |key: &String| {
///     db.get(key).map_err(LoadError::new)
/// })?;
///
/// let fetched = cache.get("user:42")?;
/// println!("{} (hit={})", fetched.value, fetched.is_hit());
/// ```
pub struct CacheStore<K = String, V = String> {
    table: Arc<RwLock<LruTable<K, V>>>,
    arbiter: MutationArbiter<K, V>,
    counters: Arc<CacheCounters>,
}

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// Create a cache backed by `loader`
    ///
    /// Fails if the configuration does not validate.
    pub fn new<L>(config: CacheConfig, loader: L) -> WardenResult<Self>
    where
        L: Loader<K, V> + 'static,
    {
        config.validate()?;

        let table = Arc::new(RwLock::new(LruTable::new(config.capacity)));
        let counters = Arc::new(CacheCounters::default());
        let arbiter = MutationArbiter::new(
            Arc::clone(&table),
            Box::new(loader),
            Arc::clone(&counters),
        );

        Ok(Self {
            table,
            arbiter,
            counters,
        })
    }

    /// Shorthand for `new(CacheConfig::new().capacity(capacity), loader)`
    pub fn with_capacity<L>(capacity: usize, loader: L) -> WardenResult<Self>
    where
        L: Loader<K, V> + 'static,
    {
        Self::new(CacheConfig::new().capacity(capacity), loader)
    }

    /// Get the value for `key`, loading it on a miss
    ///
    /// A hit counts as a use and moves the key to the front of the LRU
    /// order. On a miss the calling thread blocks until the value is loaded;
    /// concurrent callers for the same key share one load and receive the
    /// same value or the same failure.
    pub fn get<Q>(&self, key: &Q) -> CacheResult<Fetched<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + Debug + ?Sized,
    {
        let cached = self.table.read().get(key).cloned();

        match cached {
            Some(value) => {
                self.counters.hit();
                // The entry may be evicted between the read and the
                // promotion; the caller still gets the value it saw.
                self.arbiter.promote(key);
                trace!(key = ?key, "cache hit");
                Ok(Fetched::new(value, Lookup::Hit))
            }
            None => {
                self.counters.miss();
                self.arbiter.resolve(&key.to_owned())
            }
        }
    }

    /// Read a value without loading on miss and without promoting it
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.read().get(key).cloned()
    }

    /// Check residency without promoting
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.read().contains(key)
    }

    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.table.read().capacity()
    }

    /// Snapshot of resident keys, most recently used first
    pub fn keys_by_recency(&self) -> Vec<K> {
        self.table.read().keys_by_recency()
    }

    /// Number of keys currently being loaded
    pub fn loads_in_flight(&self) -> usize {
        self.arbiter.in_flight()
    }

    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}

impl<K, V> Debug for CacheStore<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CacheError, LoadError};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    /// Loader that counts calls and echoes the key
    fn counting_loader(
        calls: Arc<AtomicUsize>,
        delay: Duration,
    ) -> impl Fn(&String) -> Result<String, LoadError> + Send + Sync + 'static {
        move |key: &String| {
            calls.fetch_add(1, Ordering::SeqCst);
            if !delay.is_zero() {
                thread::sleep(delay);
            }
            Ok(format!("value-of-{}", key))
        }
    }

    fn resident(cache: &CacheStore) -> HashSet<String> {
        cache.keys_by_recency().into_iter().collect()
    }

    #[test]
    fn test_miss_then_hit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache: CacheStore = CacheStore::with_capacity(4, counting_loader(calls.clone(), Duration::ZERO)).unwrap();

        let first = cache.get("a").unwrap();
        assert_eq!(first.value, "value-of-a");
        assert_eq!(first.lookup, Lookup::Loaded);
        assert!(!first.is_hit());

        let second = cache.get("a").unwrap();
        assert!(second.is_hit());
        assert_eq!(second.into_value(), "value-of-a");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.loads, 1);
    }

    #[test]
    fn test_lru_eviction() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache: CacheStore = CacheStore::with_capacity(2, counting_loader(calls, Duration::ZERO)).unwrap();

        cache.get("A").unwrap();
        cache.get("B").unwrap();
        cache.get("C").unwrap();

        let expected: HashSet<String> = ["B", "C"].iter().map(|s| s.to_string()).collect();
        assert_eq!(resident(&cache), expected);
        assert!(!cache.contains("A"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_read_promotes_entry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache: CacheStore = CacheStore::with_capacity(2, counting_loader(calls, Duration::ZERO)).unwrap();

        cache.get("A").unwrap();
        cache.get("B").unwrap();
        assert!(cache.get("A").unwrap().is_hit());
        cache.get("C").unwrap();

        assert!(cache.contains("A"));
        assert!(!cache.contains("B"));
        assert_eq!(cache.keys_by_recency(), vec!["C", "A"]);
    }

    #[test]
    fn test_peek_does_not_promote() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache: CacheStore = CacheStore::with_capacity(2, counting_loader(calls, Duration::ZERO)).unwrap();

        cache.get("A").unwrap();
        cache.get("B").unwrap();
        assert_eq!(cache.peek("A").as_deref(), Some("value-of-A"));
        cache.get("C").unwrap();

        assert!(!cache.contains("A"));
        assert_eq!(cache.peek("missing"), None);
    }

    #[test]
    fn test_concurrent_misses_load_once() {
        const CALLERS: usize = 16;
        let calls = Arc::new(AtomicUsize::new(0));
        let cache: Arc<CacheStore> = Arc::new(
            CacheStore::with_capacity(8, counting_loader(calls.clone(), Duration::from_millis(50)))
                .unwrap(),
        );
        let barrier = Arc::new(Barrier::new(CALLERS));

        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache.get("hot").unwrap()
                })
            })
            .collect();

        let results: Vec<Fetched<String>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|f| f.value == "value-of-hot"));
        assert_eq!(
            results.iter().filter(|f| f.lookup == Lookup::Loaded).count(),
            1
        );
        assert_eq!(cache.loads_in_flight(), 0);
    }

    #[test]
    fn test_failure_reaches_caller_and_is_not_cached() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let a = Arc::clone(&attempts);
        let cache: CacheStore = CacheStore::with_capacity(2, move |key: &String| {
            a.fetch_add(1, Ordering::SeqCst);
            Err(LoadError::msg(format!("{} not in database", key)))
        })
        .unwrap();

        let err = cache.get("x").unwrap_err();
        assert!(matches!(err, CacheError::LoadFailure(_)));
        assert_eq!(err.to_string(), "load failed: x not in database");
        assert!(cache.is_empty());

        // A later get starts a new episode.
        assert!(cache.get("x").is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_distinct_keys_load_in_parallel() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache: Arc<CacheStore> = Arc::new(
            CacheStore::with_capacity(16, counting_loader(calls.clone(), Duration::from_millis(100)))
                .unwrap(),
        );

        let start = std::time::Instant::now();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.get(&format!("k{}", i)).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // Serialized loads would take ~400ms.
        assert!(start.elapsed() < Duration::from_millis(350));
    }

    #[test]
    fn test_capacity_holds_under_concurrency() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache: Arc<CacheStore> = Arc::new(CacheStore::with_capacity(8, counting_loader(calls, Duration::ZERO)).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..200 {
                        let key = format!("k{}", (i * 7 + t) % 32);
                        cache.get(&key).unwrap();
                        assert!(cache.len() <= 8);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert!(cache.len() <= cache.capacity());
        assert_eq!(cache.keys_by_recency().len(), cache.len());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let res = CacheStore::with_capacity(0, counting_loader(calls, Duration::ZERO));
        assert!(res.is_err());
    }
}
