//! Cache configuration
//!
//! Compile-time defaults with runtime environment overrides.
//!
//! # Configuration Priority (highest wins)
//!
//! 1. Builder calls
//! 2. Environment variables (via `from_env()`)
//! 3. Library defaults
//!
//! # Example
//!
//! ```rust,ignore
//! use warden_cache::CacheConfig;
//!
//! // WARDEN_CACHE_CAPACITY=500 overrides the default of 100
//! let config = CacheConfig::from_env();
//!
//! // Or pin it explicitly
//! let config = CacheConfig::new().capacity(2);
//! ```

use warden_core::env::env_get;
use warden_core::{WardenError, WardenResult};

/// Library defaults
pub mod defaults {
    /// Maximum number of resident entries
    pub const CAPACITY: usize = 100;
}

/// Cache configuration with builder pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of resident entries; must be at least 1
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl CacheConfig {
    /// Create config from defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `WARDEN_CACHE_CAPACITY` - Maximum resident entries
    pub fn from_env() -> Self {
        Self {
            capacity: env_get("WARDEN_CACHE_CAPACITY", defaults::CAPACITY),
        }
    }

    /// Create config with explicit defaults (no env override).
    pub fn new() -> Self {
        Self {
            capacity: defaults::CAPACITY,
        }
    }

    pub fn capacity(mut self, n: usize) -> Self {
        self.capacity = n;
        self
    }

    /// Validate configuration and return errors if invalid.
    pub fn validate(&self) -> WardenResult<()> {
        if self.capacity == 0 {
            return Err(WardenError::InvalidConfig("capacity must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::new();
        assert_eq!(config.capacity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = CacheConfig::new().capacity(2);
        assert_eq!(config.capacity, 2);
    }

    #[test]
    fn test_validation() {
        let config = CacheConfig::new().capacity(0);
        assert_eq!(
            config.validate(),
            Err(WardenError::InvalidConfig("capacity must be > 0"))
        );
    }

    #[test]
    fn test_from_env_override() {
        std::env::set_var("WARDEN_CACHE_CAPACITY", "7");
        let config = CacheConfig::from_env();
        std::env::remove_var("WARDEN_CACHE_CAPACITY");
        assert_eq!(config.capacity, 7);
    }
}
