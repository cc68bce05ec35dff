//! Loader capability - the backing data source consulted on a miss

use crate::error::LoadError;

/// Source of values for keys missing from the cache
///
/// Called at most once per key per miss episode, with no cache lock held.
/// The cache never retries a failed load on its own.
pub trait Loader<K, V>: Send + Sync {
    /// Produce the value for `key`, or report why it cannot be produced
    fn load(&self, key: &K) -> Result<V, LoadError>;
}

impl<K, V, F> Loader<K, V> for F
where
    F: Fn(&K) -> Result<V, LoadError> + Send + Sync,
{
    #[inline]
    fn load(&self, key: &K) -> Result<V, LoadError> {
        self(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl Loader<String, String> for Upper {
        fn load(&self, key: &String) -> Result<String, LoadError> {
            if key.is_empty() {
                return Err(LoadError::msg("empty key"));
            }
            Ok(key.to_uppercase())
        }
    }

    #[test]
    fn test_struct_loader() {
        let loader: Box<dyn Loader<String, String>> = Box::new(Upper);
        assert_eq!(loader.load(&"abc".to_string()).unwrap(), "ABC");
        assert!(loader.load(&String::new()).is_err());
    }

    #[test]
    fn test_closure_loader() {
        let loader = |k: &u32| -> Result<u64, LoadError> { Ok(u64::from(*k) * 2) };
        assert_eq!(Loader::load(&loader, &21).unwrap(), 42);
    }
}
