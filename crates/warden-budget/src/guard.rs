//! Budget guard
//!
//! Runs a unit of work on its own thread and supervises it against a time
//! ceiling. The supervisor waits on the work's completion signal with a
//! deadline:
//!
//! - **Per-call**: one deadline, `units * resolution` after start.
//! - **Cumulative**: a deadline every `resolution`; each one that passes
//!   without completion charges one unit to the principal, and the run
//!   times out once the principal's total reaches the ceiling.
//!
//! On timeout the work's token is cancelled before the verdict is
//! returned. A run whose token was cancelled by `shutdown()` is also
//! reported as `TimedOut`, even if its work then returned. The work thread is not joined: cancellation is cooperative,
//! so work that never polls its token keeps running detached.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};
use warden_core::{CancellationToken, WardenResult};

use crate::completion::CompletionSignal;
use crate::config::BudgetConfig;
use crate::policy::{BudgetPolicy, Limit, Verdict};
use crate::principal::Principal;
use crate::stats::{GuardCounters, GuardStats};

/// Enforces execution-time budgets on principals
///
/// One guard can serve any number of threads; `run_bounded` takes `&self`.
pub struct BudgetGuard {
    config: BudgetConfig,
    /// Parent of every per-run token; cancelled by `shutdown()`
    root: CancellationToken,
    counters: GuardCounters,
    next_run: AtomicU64,
}

impl BudgetGuard {
    pub fn new(config: BudgetConfig) -> WardenResult<Self> {
        config.validate()?;
        debug!(
            limit = config.limit,
            resolution_ms = config.resolution.as_millis() as u64,
            policy = %config.policy,
            "budget guard created"
        );
        Ok(Self {
            config,
            root: CancellationToken::new(),
            counters: GuardCounters::default(),
            next_run: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    /// Run `work` for `principal` under `limit`
    ///
    /// `work` receives a token it should poll; once the verdict is
    /// `TimedOut` that token is already cancelled.
    ///
    /// - Premium principals run `work` on the calling thread with a token
    ///   that never cancels. Always `Completed`; nothing is charged.
    /// - A run cut short by `shutdown()` is `TimedOut`.
    /// - A zero limit, an exhausted cumulative budget, or a shut-down guard
    ///   yields `Rejected` without starting `work`.
    /// - If completion and the ceiling coincide, `Completed` wins.
    /// - Work that panics counts as completed; the panic is logged.
    pub fn run_bounded<F>(&self, work: F, principal: &Principal, limit: Limit) -> Verdict
    where
        F: FnOnce(&CancellationToken) + Send + 'static,
    {
        if principal.is_premium() {
            trace!(principal = %principal.id(), "premium principal, running unbounded");
            self.counters.premium_bypass();
            let never = CancellationToken::never();
            if panic::catch_unwind(AssertUnwindSafe(|| work(&never))).is_err() {
                warn!(principal = %principal.id(), "bounded work panicked");
            }
            self.counters.completed();
            return Verdict::Completed;
        }

        if !limit.is_valid() {
            return self.reject(principal, "zero limit");
        }
        if self.root.is_cancelled() {
            return self.reject(principal, "guard shut down");
        }
        if limit.policy == BudgetPolicy::Cumulative && principal.time_used() >= limit.units {
            return self.reject(principal, "budget exhausted");
        }

        let token = self.root.child();
        let done = Arc::new(CompletionSignal::new());
        if let Err(e) = self.spawn_work(work, &token, &done, principal) {
            warn!(principal = %principal.id(), error = %e, "failed to spawn work thread");
            return self.reject(principal, "spawn failed");
        }

        let finished = match limit.policy {
            BudgetPolicy::PerCall => self.supervise_per_call(&done, limit.units),
            BudgetPolicy::Cumulative => self.supervise_cumulative(&done, principal, limit.units),
        };

        if finished && !token.is_cancelled() {
            trace!(principal = %principal.id(), used = principal.time_used(), "work completed");
            self.counters.completed();
            return Verdict::Completed;
        }

        if finished {
            info!(principal = %principal.id(), "run cut short by shutdown");
        } else {
            token.cancel();
            info!(
                principal = %principal.id(),
                policy = %limit.policy,
                limit = limit.units,
                used = principal.time_used(),
                "budget exceeded, work cancelled"
            );
        }
        self.counters.timed_out();
        Verdict::TimedOut
    }

    /// `run_bounded` with the configured default limit
    pub fn run_bounded_default<F>(&self, work: F, principal: &Principal) -> Verdict
    where
        F: FnOnce(&CancellationToken) + Send + 'static,
    {
        self.run_bounded(work, principal, self.config.default_limit())
    }

    /// Cancel every in-flight run and reject all future non-premium runs
    ///
    /// Supervisors already waiting keep waiting; their work sees a
    /// cancelled token and is expected to return promptly.
    pub fn shutdown(&self) {
        if self.root.cancel() {
            info!("budget guard shut down");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }

    pub fn stats(&self) -> GuardStats {
        self.counters.snapshot()
    }

    fn reject(&self, principal: &Principal, reason: &'static str) -> Verdict {
        debug!(principal = %principal.id(), used = principal.time_used(), reason, "run rejected");
        self.counters.rejected();
        Verdict::Rejected
    }

    fn spawn_work<F>(
        &self,
        work: F,
        token: &CancellationToken,
        done: &Arc<CompletionSignal>,
        principal: &Principal,
    ) -> std::io::Result<()>
    where
        F: FnOnce(&CancellationToken) + Send + 'static,
    {
        let run = self.next_run.fetch_add(1, Ordering::Relaxed);
        let token = token.clone();
        let guard = done.guard(principal.id());

        thread::Builder::new()
            .name(format!("warden-work-{}", run))
            .spawn(move || {
                let _guard = guard;
                work(&token);
            })
            .map(drop)
    }

    /// True if the work finished before `units * resolution` elapsed
    fn supervise_per_call(&self, done: &CompletionSignal, units: u64) -> bool {
        match Instant::now().checked_add(span(self.config.resolution, units)) {
            Some(deadline) => done.wait_until(deadline),
            // Deadline past the clock's range: it can never be reached
            None => {
                done.wait();
                true
            }
        }
    }

    /// True if the work finished before the principal's total reached `units`
    fn supervise_cumulative(&self, done: &CompletionSignal, principal: &Principal, units: u64) -> bool {
        let resolution = self.config.resolution;
        let mut next = Instant::now().checked_add(resolution);
        loop {
            let Some(tick) = next else {
                done.wait();
                return true;
            };
            if done.wait_until(tick) {
                return true;
            }
            let used = principal.charge(1);
            self.counters.charged(1);
            trace!(principal = %principal.id(), used, limit = units, "charged one unit");
            if used >= units {
                return false;
            }
            next = tick.checked_add(resolution);
        }
    }
}

impl std::fmt::Debug for BudgetGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BudgetGuard")
            .field("config", &self.config)
            .field("shut_down", &self.is_shut_down())
            .field("stats", &self.stats())
            .finish()
    }
}

fn span(resolution: Duration, units: u64) -> Duration {
    resolution.saturating_mul(u32::try_from(units).unwrap_or(u32::MAX))
}
