//! Environment variable utilities
//!
//! The cache and budget config layers start from compile-time defaults
//! and let `WARDEN_*` variables override them at runtime.
//!
//! # Usage
//!
//! ```ignore
//! use warden_core::env::{env_get, env_get_opt};
//!
//! let capacity: usize = env_get("WARDEN_CACHE_CAPACITY", 100);
//! let resolution_ms: Option<u64> = env_get_opt("WARDEN_BUDGET_RESOLUTION_MS");
//! ```

use std::str::FromStr;

/// Get environment variable parsed as type T, or return default
///
/// Unset variables and values that fail to parse both yield `default`.
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env_get_opt(key).unwrap_or(default)
}

/// Get environment variable as optional value
///
/// Returns `Some(T)` if the variable is set and parses successfully,
/// `None` otherwise. Surrounding whitespace is ignored.
#[inline]
pub fn env_get_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

// ============================================================================
// Tests
// ============================================================================
