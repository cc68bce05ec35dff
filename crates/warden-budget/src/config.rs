//! Budget guard configuration
//!
//! Compile-time defaults with runtime environment overrides, same layering
//! as the cache configuration.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use warden_budget::{BudgetConfig, BudgetPolicy};
//!
//! // WARDEN_BUDGET_LIMIT=30 WARDEN_BUDGET_POLICY=per-call
//! let config = BudgetConfig::from_env();
//!
//! let config = BudgetConfig::new()
//!     .limit(3)
//!     .resolution(Duration::from_millis(10))
//!     .policy(BudgetPolicy::PerCall);
//! ```

use std::time::Duration;

use warden_core::env::env_get;
use warden_core::{WardenError, WardenResult};

use crate::policy::{BudgetPolicy, Limit};

/// Library defaults
pub mod defaults {
    use super::BudgetPolicy;

    /// Default ceiling in time units
    pub const LIMIT: u64 = 10;

    /// Length of one time unit, in milliseconds
    pub const RESOLUTION_MS: u64 = 1000;

    /// Longest accepted time unit (one day)
    pub const MAX_RESOLUTION_MS: u64 = 24 * 60 * 60 * 1000;

    pub const POLICY: BudgetPolicy = BudgetPolicy::Cumulative;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetConfig {
    /// Ceiling used by `run_bounded_default`
    pub limit: u64,

    /// Length of one time unit; also the charging tick for cumulative budgets
    pub resolution: Duration,

    /// Policy used by `run_bounded_default`
    pub policy: BudgetPolicy,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl BudgetConfig {
    /// Create config from defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `WARDEN_BUDGET_LIMIT` - Default ceiling in units
    /// - `WARDEN_BUDGET_RESOLUTION_MS` - Unit length in milliseconds
    /// - `WARDEN_BUDGET_POLICY` - `per-call` or `cumulative`
    pub fn from_env() -> Self {
        Self {
            limit: env_get("WARDEN_BUDGET_LIMIT", defaults::LIMIT),
            resolution: Duration::from_millis(env_get(
                "WARDEN_BUDGET_RESOLUTION_MS",
                defaults::RESOLUTION_MS,
            )),
            policy: env_get("WARDEN_BUDGET_POLICY", defaults::POLICY),
        }
    }

    /// Create config with explicit defaults (no env override).
    pub fn new() -> Self {
        Self {
            limit: defaults::LIMIT,
            resolution: Duration::from_millis(defaults::RESOLUTION_MS),
            policy: defaults::POLICY,
        }
    }

    pub fn limit(mut self, units: u64) -> Self {
        self.limit = units;
        self
    }

    pub fn resolution(mut self, unit: Duration) -> Self {
        self.resolution = unit;
        self
    }

    pub fn policy(mut self, policy: BudgetPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The configured default limit
    pub fn default_limit(&self) -> Limit {
        Limit {
            policy: self.policy,
            units: self.limit,
        }
    }

    /// Validate configuration and return errors if invalid.
    pub fn validate(&self) -> WardenResult<()> {
        if self.limit == 0 {
            return Err(WardenError::InvalidConfig("limit must be > 0"));
        }
        if self.resolution.is_zero() {
            return Err(WardenError::InvalidConfig("resolution must be > 0"));
        }
        if self.resolution > Duration::from_millis(defaults::MAX_RESOLUTION_MS) {
            return Err(WardenError::InvalidConfig("resolution must be at most one day"));
        }
        Ok(())
    }
}
