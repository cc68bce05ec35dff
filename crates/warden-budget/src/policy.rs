//! Budget policies, limits and verdicts

use core::fmt;
use std::str::FromStr;

use warden_core::WardenError;

/// How a limit is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BudgetPolicy {
    /// Ceiling applies to each invocation on its own
    PerCall,
    /// Ceiling applies to the principal's accumulated usage
    Cumulative,
}

impl FromStr for BudgetPolicy {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "per-call" | "per_call" | "percall" => Ok(BudgetPolicy::PerCall),
            "cumulative" => Ok(BudgetPolicy::Cumulative),
            _ => Err(WardenError::InvalidConfig(
                "policy must be `per-call` or `cumulative`",
            )),
        }
    }
}

impl fmt::Display for BudgetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetPolicy::PerCall => write!(f, "per-call"),
            BudgetPolicy::Cumulative => write!(f, "cumulative"),
        }
    }
}

/// A ceiling in time units under a given policy
///
/// One unit is the guard's configured resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub policy: BudgetPolicy,
    pub units: u64,
}

impl Limit {
    pub const fn per_call(units: u64) -> Self {
        Self {
            policy: BudgetPolicy::PerCall,
            units,
        }
    }

    pub const fn cumulative(units: u64) -> Self {
        Self {
            policy: BudgetPolicy::Cumulative,
            units,
        }
    }

    /// A zero ceiling cannot admit any work
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.units > 0
    }
}

/// Outcome of `BudgetGuard::run_bounded`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Work finished within budget, or the principal is premium
    Completed,
    /// The ceiling was crossed or the guard shut down mid-run; the work's
    /// token has been cancelled
    TimedOut,
    /// Work was never started (budget exhausted, bad limit, or shut down)
    Rejected,
}

impl Verdict {
    #[inline]
    pub fn is_completed(self) -> bool {
        self == Verdict::Completed
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Completed => write!(f, "completed"),
            Verdict::TimedOut => write!(f, "timed out"),
            Verdict::Rejected => write!(f, "rejected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parse() {
        assert_eq!("per-call".parse::<BudgetPolicy>(), Ok(BudgetPolicy::PerCall));
        assert_eq!("PER_CALL".parse::<BudgetPolicy>(), Ok(BudgetPolicy::PerCall));
        assert_eq!(" cumulative ".parse::<BudgetPolicy>(), Ok(BudgetPolicy::Cumulative));
        assert!("forever".parse::<BudgetPolicy>().is_err());
    }

    #[test]
    fn test_policy_display_roundtrip() {
        for p in [BudgetPolicy::PerCall, BudgetPolicy::Cumulative] {
            assert_eq!(p.to_string().parse::<BudgetPolicy>(), Ok(p));
        }
    }

    #[test]
    fn test_limit_validity() {
        assert!(Limit::per_call(1).is_valid());
        assert!(!Limit::cumulative(0).is_valid());
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::TimedOut.to_string(), "timed out");
        assert!(Verdict::Completed.is_completed());
        assert!(!Verdict::Rejected.is_completed());
    }
}
