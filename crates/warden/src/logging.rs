//! Subscriber setup for binaries
//!
//! Library code only emits `tracing` events; installing a subscriber is
//! left to the process entry point.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directive
pub const LOG_ENV: &str = "WARDEN_LOG";

/// Install a fmt subscriber filtered by `WARDEN_LOG` (default `info`)
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    init_logging_with("info");
}

/// Like `init_logging`, with a caller-chosen fallback directive
pub fn init_logging_with(default_directive: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_logging_with("debug");
        init_logging();
        tracing::info!("still alive");
    }
}
