//! Cancellation token for cooperative cancellation
//!
//! Work run under a budget receives a token and is expected to poll it.
//! Nothing here can stop a thread by force; a cancelled token is only a
//! request, honored when the work next checks it.
//!
//! Tokens can be linked to form parent-child relationships, so one
//! cancel on a parent reaches every invocation derived from it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{WardenError, WardenResult};

/// Token for checking and triggering cancellation
///
/// Clones share state: cancelling any clone cancels all of them.
/// When cancelled, `check()` returns `Err(WardenError::Cancelled)`.
#[derive(Clone)]
pub struct CancellationToken {
    inner: CancellationInner,
}

#[derive(Clone)]
enum CancellationInner {
    /// Heap-allocated flag, optionally linked to a parent
    Owned(Arc<OwnedCancellation>),
    /// Token that never cancels (premium bypass)
    Never,
}

struct OwnedCancellation {
    /// Cancellation flag
    cancelled: AtomicBool,

    /// Parent token (if any)
    parent: Option<CancellationToken>,
}

impl CancellationToken {
    /// Create a new independent cancellation token
    pub fn new() -> Self {
        Self {
            inner: CancellationInner::Owned(Arc::new(OwnedCancellation {
                cancelled: AtomicBool::new(false),
                parent: None,
            })),
        }
    }

    /// Create a token that never reports cancellation
    ///
    /// `cancel()` on it is a no-op.
    pub fn never() -> Self {
        Self {
            inner: CancellationInner::Never,
        }
    }

    /// Create a child token linked to this one
    ///
    /// If this token is cancelled, checking the child will also return cancelled.
    /// Cancelling the child leaves the parent untouched.
    pub fn child(&self) -> Self {
        Self {
            inner: CancellationInner::Owned(Arc::new(OwnedCancellation {
                cancelled: AtomicBool::new(false),
                parent: Some(self.clone()),
            })),
        }
    }

    /// Check if cancellation was requested
    ///
    /// Also checks parent tokens recursively.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        match &self.inner {
            CancellationInner::Owned(arc) => {
                if arc.cancelled.load(Ordering::Acquire) {
                    return true;
                }
                match arc.parent {
                    Some(ref parent) => parent.is_cancelled(),
                    None => false,
                }
            }
            CancellationInner::Never => false,
        }
    }

    /// Request cancellation
    ///
    /// Returns `true` if this call flipped the flag, `false` if the token
    /// was already cancelled (or can never be cancelled).
    pub fn cancel(&self) -> bool {
        match &self.inner {
            CancellationInner::Owned(arc) => !arc.cancelled.swap(true, Ordering::AcqRel),
            CancellationInner::Never => false,
        }
    }

    /// Check if cancelled and return error if so
    ///
    /// This is the typical usage pattern inside bounded work:
    /// ```ignore
    /// fn transcode(token: &CancellationToken) -> WardenResult<()> {
    ///     for chunk in chunks {
    ///         token.check()?;
    ///         process(chunk);
    ///     }
    ///     Ok(())
    /// }
    /// ```
    #[inline]
    pub fn check(&self) -> WardenResult<()> {
        if self.is_cancelled() {
            Err(WardenError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Sleep for up to `dur`, waking early if cancelled
    ///
    /// Polls at `poll` granularity. Returns `Err(Cancelled)` if the token
    /// was cancelled before the full duration elapsed.
    pub fn sleep(&self, dur: Duration, poll: Duration) -> WardenResult<()> {
        let deadline = Instant::now() + dur;
        loop {
            self.check()?;
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            std::thread::sleep(poll.min(deadline - now));
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
