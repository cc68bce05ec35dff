//! # warden-budget
//!
//! Execution-time budgets for principals.
//!
//! A `BudgetGuard` runs a closure on its own thread and supervises it
//! against a ceiling expressed in time units. Work is told to stop through
//! a `CancellationToken`; it is never killed.
//!
//! ```rust,ignore
//! use warden_budget::{BudgetConfig, BudgetGuard, Limit, Principal, Verdict};
//!
//! let guard = BudgetGuard::new(BudgetConfig::from_env())?;
//! let user = Principal::standard(42);
//!
//! let verdict = guard.run_bounded(
//!     |token| {
//!         for frame in 0..600 {
//!             if token.is_cancelled() {
//!                 return;
//!             }
//!             encode(frame);
//!         }
//!     },
//!     &user,
//!     Limit::cumulative(10),
//! );
//! ```
//!
//! ## Modules
//!
//! - `guard` - `BudgetGuard` and its supervision loop
//! - `principal` - `Principal` and its time-used counter
//! - `policy` - `BudgetPolicy`, `Limit`, `Verdict`
//! - `config` - environment-driven configuration

mod completion;
mod stats;

pub mod config;
pub mod guard;
pub mod policy;
pub mod principal;

pub use config::BudgetConfig;
pub use guard::BudgetGuard;
pub use policy::{BudgetPolicy, Limit, Verdict};
pub use principal::{Principal, PrincipalId};
pub use stats::GuardStats;
pub use warden_core::CancellationToken;
