//! # warden-cache
//!
//! Capacity-bounded LRU cache for many concurrent readers.
//!
//! ## Architecture
//!
//! ```text
//!        get(key) ──────────────────────────────┐
//!           │                                   │
//!           ▼ shared lock                       │ miss
//!   ┌───────────────────┐              ┌────────▼─────────┐
//!   │     LruTable      │◄─ exclusive ─│ MutationArbiter  │
//!   │ mapping + order   │    lock      │ in-flight map    │──► Loader
//!   └───────────────────┘              └──────────────────┘
//! ```
//!
//! - Readers never block each other.
//! - The arbiter is the only writer; it promotes keys on hits, and on
//!   misses installs loaded values and evicts the least-recently-used one.
//! - Concurrent misses for the same key share one loader call.
//!
//! ## Modules
//!
//! - `store` - `CacheStore`, the public entry point
//! - `arbiter` - single writer + in-flight coalescing
//! - `lru` - slab-backed LRU table
//! - `loader` - `Loader` capability trait
//! - `config` - capacity configuration
//! - `error` - `CacheError` / `LoadError`
//! - `stats` - hit/miss/eviction counters

mod arbiter;
mod lru;
mod stats;

pub mod config;
pub mod error;
pub mod loader;
pub mod store;

pub use config::CacheConfig;
pub use error::{CacheError, CacheResult, LoadError};
pub use loader::Loader;
pub use stats::CacheStats;
pub use store::{CacheStore, Fetched, Lookup};
