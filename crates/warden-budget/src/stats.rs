//! Guard counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of guard activity since construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuardStats {
    pub completed: u64,
    pub timed_out: u64,
    pub rejected: u64,
    /// Premium invocations (also counted in `completed`)
    pub premium_bypasses: u64,
    /// Time units charged to principals across all cumulative runs
    pub units_charged: u64,
}

#[derive(Debug, Default)]
pub(crate) struct GuardCounters {
    completed: AtomicU64,
    timed_out: AtomicU64,
    rejected: AtomicU64,
    premium_bypasses: AtomicU64,
    units_charged: AtomicU64,
}

impl GuardCounters {
    #[inline]
    pub(crate) fn completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn timed_out(&self) {
        self.timed_out.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn premium_bypass(&self) {
        self.premium_bypasses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn charged(&self, units: u64) {
        self.units_charged.fetch_add(units, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> GuardStats {
        GuardStats {
            completed: self.completed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            premium_bypasses: self.premium_bypasses.load(Ordering::Relaxed),
            units_charged: self.units_charged.load(Ordering::Relaxed),
        }
    }
}
