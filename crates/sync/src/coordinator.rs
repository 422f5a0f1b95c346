//! Mutex/condition-variable pair owned by a context object.
//!
//! Instead of a process-wide mutex, condvar and flag, a [`Coordinator`]
//! owns all three and is handed to the threads that need it (usually as an
//! `Arc<Coordinator<T>>`).

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::warn;

/// Shared state plus the condition variable that announces changes to it.
#[derive(Debug, Default)]
pub struct Coordinator<T> {
    state: Mutex<T>,
    changed: Condvar,
}

impl<T> Coordinator<T> {
    /// Create a coordinator around an initial state.
    pub fn new(initial: T) -> Self {
        Self {
            state: Mutex::new(initial),
            changed: Condvar::new(),
        }
    }

    /// Mutate the state under the lock and wake every waiter.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = {
            let mut state = self.lock();
            f(&mut *state)
        };
        self.changed.notify_all();
        result
    }

    /// Block until `ready` holds for the state, then return the locked state.
    ///
    /// The predicate is re-checked after every wakeup, so spurious wakeups
    /// and notifications for unrelated changes are absorbed here.
    pub fn wait_until(&self, mut ready: impl FnMut(&T) -> bool) -> MutexGuard<'_, T> {
        let guard = self.lock();
        self.changed
            .wait_while(guard, |state| !ready(&*state))
            .unwrap_or_else(recover)
    }

    /// Like [`wait_until`](Self::wait_until) but gives up after `timeout`.
    pub fn wait_until_timeout(
        &self,
        timeout: Duration,
        mut ready: impl FnMut(&T) -> bool,
    ) -> Option<MutexGuard<'_, T>> {
        let guard = self.lock();
        let (guard, result) = self
            .changed
            .wait_timeout_while(guard, timeout, |state| !ready(&*state))
            .unwrap_or_else(recover);
        if result.timed_out() && !ready(&*guard) {
            None
        } else {
            Some(guard)
        }
    }

    /// Lock the state directly.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.state.lock().unwrap_or_else(recover)
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> T
    where
        T: Clone,
    {
        self.lock().clone()
    }
}

// A panicking writer leaves the state as it was at the panic; waiters keep going.
fn recover<G>(poisoned: PoisonError<G>) -> G {
    warn!("Coordinator state poisoned by a panicking thread; recovering");
    poisoned.into_inner()
}
