//! Error types shared by the warden crates

use thiserror::Error;

/// Result type for warden operations
pub type WardenResult<T> = Result<T, WardenError>;

/// Errors that are not specific to the cache or the budget guard
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WardenError {
    /// Operation was cancelled via CancellationToken
    #[error("operation cancelled")]
    Cancelled,

    /// A configuration value failed validation
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = WardenError::Cancelled;
        assert_eq!(format!("{}", e), "operation cancelled");

        let e = WardenError::InvalidConfig("capacity must be > 0");
        assert_eq!(format!("{}", e), "invalid config: capacity must be > 0");
    }

    #[test]
    fn test_question_mark_propagation() {
        fn inner() -> WardenResult<u32> {
            Err(WardenError::Cancelled)
        }
        fn outer() -> WardenResult<u32> {
            let v = inner()?;
            Ok(v + 1)
        }
        assert_eq!(outer(), Err(WardenError::Cancelled));
    }
}
