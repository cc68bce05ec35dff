//! # warden-core
//!
//! Shared building blocks for the warden cache and budget crates.
//!
//! This crate has no knowledge of caching or budgeting; it only carries
//! the pieces both sides need.
//!
//! ## Modules
//!
//! - `cancel` - Cancellation token for cooperative cancellation
//! - `error` - Error types shared across crates
//! - `env` - Environment variable utilities used by the config layers

pub mod cancel;
pub mod env;
pub mod error;

// Re-exports for convenience
pub use cancel::CancellationToken;
pub use env::{env_get, env_get_opt};
pub use error::{WardenError, WardenResult};
