//! Completion signal between a work thread and its supervisor
//!
//! The work thread holds a `CompletionGuard`; dropping it (normal return
//! or unwind) flips the flag and wakes the supervisor.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use tracing::warn;

use crate::principal::PrincipalId;

pub(crate) struct CompletionSignal {
    done: Mutex<bool>,
    cv: Condvar,
}

impl CompletionSignal {
    pub(crate) fn new() -> Self {
        Self {
            done: Mutex::new(false),
            cv: Condvar::new(),
        }
    }

    pub(crate) fn signal(&self) {
        *self.done.lock() = true;
        self.cv.notify_all();
    }

    #[cfg(test)]
    fn is_done(&self) -> bool {
        *self.done.lock()
    }

    /// Block until completion or `deadline`, whichever comes first
    ///
    /// Returns true if completion was observed. When the deadline and the
    /// completion land together, completion wins: the flag is read once
    /// more after the timed-out wakeup.
    pub(crate) fn wait_until(&self, deadline: Instant) -> bool {
        let mut done = self.done.lock();
        while !*done {
            if self.cv.wait_until(&mut done, deadline).timed_out() {
                return *done;
            }
        }
        true
    }

    /// Block until completion with no deadline
    pub(crate) fn wait(&self) {
        let mut done = self.done.lock();
        while !*done {
            self.cv.wait(&mut done);
        }
    }

    /// Guard that signals completion when dropped
    pub(crate) fn guard(self: &Arc<Self>, principal: PrincipalId) -> CompletionGuard {
        CompletionGuard {
            signal: Arc::clone(self),
            principal,
        }
    }
}

pub(crate) struct CompletionGuard {
    signal: Arc<CompletionSignal>,
    principal: PrincipalId,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            warn!(principal = %self.principal, "bounded work panicked");
        }
        self.signal.signal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_wait_times_out() {
        let signal = CompletionSignal::new();
        let start = Instant::now();
        assert!(!signal.wait_until(start + Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_wait_sees_prior_signal() {
        let signal = CompletionSignal::new();
        signal.signal();
        // Deadline already in the past: completion still wins.
        assert!(signal.wait_until(Instant::now()));
    }

    #[test]
    fn test_guard_signals_on_drop() {
        let signal = Arc::new(CompletionSignal::new());
        let guard = signal.guard(PrincipalId::new(1));
        assert!(!signal.is_done());
        drop(guard);
        assert!(signal.is_done());
    }

    #[test]
    fn test_guard_signals_on_panic() {
        let signal = Arc::new(CompletionSignal::new());
        let s = Arc::clone(&signal);
        let res = thread::spawn(move || {
            let _guard = s.guard(PrincipalId::new(2));
            panic!("work blew up");
        })
        .join();
        assert!(res.is_err());
        assert!(signal.is_done());
    }

    #[test]
    fn test_wakes_waiter_from_other_thread() {
        let signal = Arc::new(CompletionSignal::new());
        let s = Arc::clone(&signal);
        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            s.signal();
        });
        assert!(signal.wait_until(Instant::now() + Duration::from_secs(5)));
        worker.join().unwrap();
    }

    #[test]
    fn test_unbounded_wait_returns_on_signal() {
        let signal = Arc::new(CompletionSignal::new());
        let s = Arc::clone(&signal);
        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            s.signal();
        });
        signal.wait();
        assert!(signal.is_done());
        worker.join().unwrap();
    }
}
