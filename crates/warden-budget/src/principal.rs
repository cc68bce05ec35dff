//! Principal - the identity whose execution time is tracked

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier for a principal (e.g. a user account)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PrincipalId(u64);

impl PrincipalId {
    #[inline]
    pub const fn new(id: u64) -> Self {
        PrincipalId(id)
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for PrincipalId {
    #[inline]
    fn from(id: u64) -> Self {
        PrincipalId(id)
    }
}

impl fmt::Debug for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrincipalId({})", self.0)
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A principal with its cumulative time-used counter
///
/// The counter is measured in budget time units and only ever grows.
/// It is written exclusively by `BudgetGuard` through an atomic add, so
/// one `Principal` (usually behind an `Arc`) can be shared by any number
/// of concurrent invocations.
///
/// Premium principals bypass enforcement entirely; their counter is never
/// read or charged by the guard.
pub struct Principal {
    id: PrincipalId,
    premium: bool,
    time_used: AtomicU64,
}

impl Principal {
    pub fn new(id: impl Into<PrincipalId>, premium: bool) -> Self {
        Self::with_time_used(id, premium, 0)
    }

    /// Non-premium principal with a fresh counter
    pub fn standard(id: impl Into<PrincipalId>) -> Self {
        Self::new(id, false)
    }

    /// Premium principal (never limited)
    pub fn premium(id: impl Into<PrincipalId>) -> Self {
        Self::new(id, true)
    }

    /// Rebuild a principal whose usage was recorded elsewhere
    pub fn with_time_used(id: impl Into<PrincipalId>, premium: bool, time_used: u64) -> Self {
        Self {
            id: id.into(),
            premium,
            time_used: AtomicU64::new(time_used),
        }
    }

    #[inline]
    pub fn id(&self) -> PrincipalId {
        self.id
    }

    #[inline]
    pub fn is_premium(&self) -> bool {
        self.premium
    }

    /// Time units charged so far
    #[inline]
    pub fn time_used(&self) -> u64 {
        self.time_used.load(Ordering::Acquire)
    }

    /// Add `units` and return the counter value after the add
    #[inline]
    pub(crate) fn charge(&self, units: u64) -> u64 {
        self.time_used
            .fetch_add(units, Ordering::AcqRel)
            .saturating_add(units)
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("premium", &self.premium)
            .field("time_used", &self.time_used())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_principal_basics() {
        let p = Principal::standard(7);
        assert_eq!(p.id(), PrincipalId::new(7));
        assert!(!p.is_premium());
        assert_eq!(p.time_used(), 0);

        assert!(Principal::premium(8).is_premium());
        assert_eq!(Principal::with_time_used(9, false, 4).time_used(), 4);
    }

    #[test]
    fn test_charge_returns_new_total() {
        let p = Principal::standard(1);
        assert_eq!(p.charge(1), 1);
        assert_eq!(p.charge(3), 4);
        assert_eq!(p.time_used(), 4);
    }

    #[test]
    fn test_concurrent_charges_are_not_lost() {
        let p = Arc::new(Principal::standard(1));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let p = Arc::clone(&p);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        p.charge(1);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(p.time_used(), 8000);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(format!("{}", PrincipalId::new(42)), "42");
        assert_eq!(format!("{:?}", PrincipalId::from(42)), "PrincipalId(42)");
    }
}
