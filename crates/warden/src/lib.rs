//! # warden - guarded access to slow resources
//!
//! Two independent building blocks behind one facade:
//!
//! - **Cache**: `CacheStore`, a capacity-bounded LRU cache in front of a
//!   slow `Loader`. Readers share a lock; all mutation goes through one
//!   arbiter, and concurrent misses for the same key share a single load.
//! - **Budget**: `BudgetGuard`, which runs work for a `Principal` under a
//!   per-call or cumulative time ceiling and cancels it cooperatively via
//!   a `CancellationToken` when the ceiling is crossed.
//!
//! ## Quick Start
//!
//! ```ignore
//! use warden::{BudgetConfig, BudgetGuard, CacheStore, Limit, LoadError, Principal};
//!
//! warden::init_logging();
//!
//! let cache: CacheStore = CacheStore::with_capacity(100, |key: &String| {
//!     db_lookup(key).map_err(LoadError::new)
//! })?;
//! let profile = cache.get("alice")?.into_value();
//!
//! let guard = BudgetGuard::new(BudgetConfig::from_env())?;
//! let user = Principal::standard(1);
//! let verdict = guard.run_bounded(|token| transcode(token), &user, Limit::cumulative(10));
//! ```
//!
//! ## Logging
//!
//! All crates log through `tracing`. Binaries call `init_logging()`, which
//! installs a fmt subscriber filtered by `WARDEN_LOG` (default `info`).

mod logging;

pub use logging::{init_logging, init_logging_with};

// Re-export core types
pub use warden_core::{CancellationToken, WardenError, WardenResult};
pub use warden_core::{env_get, env_get_opt};

// Re-export cache types
pub use warden_cache::{
    CacheConfig,
    CacheError,
    CacheResult,
    CacheStats,
    CacheStore,
    Fetched,
    LoadError,
    Loader,
    Lookup,
};

// Re-export budget types
pub use warden_budget::{
    BudgetConfig,
    BudgetGuard,
    BudgetPolicy,
    GuardStats,
    Limit,
    Principal,
    PrincipalId,
    Verdict,
};
