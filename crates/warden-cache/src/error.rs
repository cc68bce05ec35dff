//! Error types for the cache

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors surfaced by `CacheStore::get`
///
/// Cloneable so that a single failed load can be handed to every caller
/// that was coalesced onto it.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The loader reported a failure for this key. Not retried.
    #[error("load failed: {0}")]
    LoadFailure(#[source] LoadError),

    /// The loader panicked while the caller was waiting on it
    #[error("loader panicked while resolving a miss")]
    LoaderPanicked,
}

impl CacheError {
    /// The underlying loader failure, if any
    pub fn load_error(&self) -> Option<&LoadError> {
        match self {
            CacheError::LoadFailure(e) => Some(e),
            CacheError::LoaderPanicked => None,
        }
    }
}

impl From<LoadError> for CacheError {
    fn from(e: LoadError) -> Self {
        CacheError::LoadFailure(e)
    }
}

/// Failure returned by a `Loader`
///
/// Shares the underlying error behind an `Arc`; clones point at the same
/// failure, which `ptr_eq` can confirm.
#[derive(Clone)]
pub struct LoadError {
    inner: Arc<dyn Error + Send + Sync>,
}

#[derive(Debug, Error)]
#[error("{0}")]
struct Message(String);

impl LoadError {
    /// Wrap any error produced by the backing data source
    pub fn new<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self { inner: Arc::new(err) }
    }

    /// Build a failure from a plain message
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    /// True if both handles refer to the same failure instance
    pub fn ptr_eq(a: &LoadError, b: &LoadError) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl fmt::Debug for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LoadError").field(&self.inner).finish()
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = CacheError::LoadFailure(LoadError::msg("key not found"));
        assert_eq!(format!("{}", e), "load failed: key not found");
        assert_eq!(
            format!("{}", CacheError::LoaderPanicked),
            "loader panicked while resolving a miss"
        );
    }

    #[test]
    fn test_clones_share_failure() {
        let a = LoadError::msg("db down");
        let b = a.clone();
        let c = LoadError::msg("db down");
        assert!(LoadError::ptr_eq(&a, &b));
        assert!(!LoadError::ptr_eq(&a, &c));
    }

    #[test]
    fn test_wraps_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing row");
        let err: CacheError = LoadError::new(io).into();
        assert!(err.load_error().is_some());
        assert!(err.to_string().contains("missing row"));
    }
}
