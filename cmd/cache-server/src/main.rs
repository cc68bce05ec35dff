//! Cache server - many request workers in front of a slow mock database
//!
//! A dispatcher pushes key lookups into a bounded queue; worker threads
//! pop them and serve each through one shared `CacheStore`. The key
//! stream is skewed so a small hot set dominates, which exercises hits,
//! evictions and coalesced misses at once. Keys ending in `7` are absent
//! from the database and fail to load.
//!
//! Usage: cache-server [workers] [requests] [key-space]
//!
//! Capacity comes from `WARDEN_CACHE_CAPACITY`, log level from `WARDEN_LOG`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_queue::ArrayQueue;
use tracing::{error, info};
use warden::{CacheConfig, CacheError, CacheStore, LoadError, Lookup};

/// Simulated database round trip
const DB_LATENCY: Duration = Duration::from_millis(5);

const QUEUE_DEPTH: usize = 1024;

/// Mock database: deterministic rows, some keys missing
fn db_lookup(key: &String) -> Result<String, LoadError> {
    thread::sleep(DB_LATENCY);
    if key.ends_with('7') {
        return Err(LoadError::msg(format!("no row for {}", key)));
    }
    Ok(format!("row({})", key))
}

#[derive(Default)]
struct Outcomes {
    hits: AtomicU64,
    loaded: AtomicU64,
    coalesced: AtomicU64,
    failed: AtomicU64,
}

struct Shared {
    cache: CacheStore,
    requests: ArrayQueue<String>,
    done: AtomicBool,
    outcomes: Outcomes,
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let key = match shared.requests.pop() {
            Some(key) => key,
            None if shared.done.load(Ordering::Acquire) => break,
            None => {
                thread::yield_now();
                continue;
            }
        };

        let outcomes = &shared.outcomes;
        match shared.cache.get(key.as_str()) {
            Ok(fetched) => {
                let counter = match fetched.lookup {
                    Lookup::Hit => &outcomes.hits,
                    Lookup::Loaded => &outcomes.loaded,
                    Lookup::Coalesced => &outcomes.coalesced,
                };
                counter.fetch_add(1, Ordering::Relaxed);
            }
            Err(CacheError::LoaderPanicked) => {
                error!(%key, "loader panicked");
                outcomes.failed.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                outcomes.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Cheap xorshift so the key stream is reproducible without a rand dep
fn next_key(state: &mut u64, key_space: u64) -> String {
    *state ^= *state << 13;
    *state ^= *state >> 7;
    *state ^= *state << 17;
    // 80% of traffic goes to the first tenth of the key space
    let hot = (key_space / 10).max(1);
    let k = if *state % 10 < 8 {
        (*state >> 8) % hot
    } else {
        (*state >> 8) % key_space
    };
    format!("user-{}", k)
}

fn main() {
    warden::init_logging();

    let mut args = std::env::args().skip(1);
    let num_workers: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(8);
    let num_requests: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(20_000);
    let key_space: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(1_000).max(1);

    let config = CacheConfig::from_env();
    let cache: CacheStore = match CacheStore::new(config, db_lookup) {
        Ok(cache) => cache,
        Err(e) => {
            error!(error = %e, "bad cache configuration");
            std::process::exit(1);
        }
    };

    println!("=== Warden Cache Server ===\n");
    println!("Workers:   {}", num_workers);
    println!("Requests:  {}", num_requests);
    println!("Key space: {}", key_space);
    println!("Capacity:  {}\n", cache.capacity());

    let shared = Arc::new(Shared {
        cache,
        requests: ArrayQueue::new(QUEUE_DEPTH),
        done: AtomicBool::new(false),
        outcomes: Outcomes::default(),
    });

    let mut handles = Vec::with_capacity(num_workers);
    for worker_id in 0..num_workers {
        let shared = Arc::clone(&shared);
        match thread::Builder::new()
            .name(format!("cache-worker-{}", worker_id))
            .spawn(move || worker_loop(shared))
        {
            Ok(handle) => handles.push(handle),
            Err(e) => error!(worker_id, error = %e, "failed to spawn worker"),
        }
    }
    if handles.is_empty() {
        error!("no workers running");
        std::process::exit(1);
    }

    let start = Instant::now();
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    for _ in 0..num_requests {
        let mut key = next_key(&mut state, key_space);
        // Queue full: back off until a worker drains a slot
        while let Err(rejected) = shared.requests.push(key) {
            key = rejected;
            thread::yield_now();
        }
    }
    shared.done.store(true, Ordering::Release);

    for h in handles {
        let _ = h.join();
    }
    let elapsed = start.elapsed();

    let o = &shared.outcomes;
    let stats = shared.cache.stats();
    info!(?stats, "run finished");

    println!("=== Results ===");
    println!("Hits:        {}", o.hits.load(Ordering::Relaxed));
    println!("Loaded:      {}", o.loaded.load(Ordering::Relaxed));
    println!("Coalesced:   {}", o.coalesced.load(Ordering::Relaxed));
    println!("Failed:      {}", o.failed.load(Ordering::Relaxed));
    println!("Evictions:   {}", stats.evictions);
    println!("Resident:    {}/{}", shared.cache.len(), shared.cache.capacity());
    println!("Elapsed:     {:?}", elapsed);
    println!(
        "Throughput:  {:.0} req/sec",
        num_requests as f64 / elapsed.as_secs_f64()
    );
}
