//! Scoped ownership of a worker handle.
//!
//! A [`ScopedWorker`] owns one [`WorkerHandle`] and, when it is released
//! (explicitly or by going out of scope), brings the handle to a terminal
//! state using the [`Disposition`] chosen at construction:
//!
//! ```text
//! attached + WaitOnRelease   → wait_for_completion()  → Release::Joined
//! attached + DetachOnRelease → detach()               → Release::Detached
//! not attached / released    → nothing                → Release::Skipped
//! ```
//!
//! Release runs from `Drop`, so it happens on every way out of the owning
//! scope: normal return, early return, `?` propagation and unwinding.

use crate::disposition::Disposition;
use crate::error::Result;
use crate::handle::WorkerHandle;
use crate::thread::ThreadWorker;
use tracing::{debug, error};

/// What a call to [`ScopedWorker::release`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Waited for the worker to finish
    Joined,
    /// Detached the worker
    Detached,
    /// Nothing to do: empty, already released, or not attached
    Skipped,
}

/// Owns a worker handle and applies a [`Disposition`] to it exactly once.
pub struct ScopedWorker<H: WorkerHandle> {
    disposition: Disposition,
    worker: Option<H>,
    released: bool,
}

impl<H: WorkerHandle> ScopedWorker<H> {
    /// Take ownership of an already started worker.
    pub fn new(worker: H, disposition: Disposition) -> Self {
        Self {
            disposition,
            worker: Some(worker),
            released: false,
        }
    }

    /// The disposition applied on release.
    pub fn disposition(&self) -> Disposition {
        self.disposition
    }

    /// Whether this wrapper owns no worker (default-built or moved from).
    pub fn is_empty(&self) -> bool {
        self.worker.is_none()
    }

    /// Whether [`release`](Self::release) has already run.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Borrow the owned worker.
    pub fn get(&self) -> Option<&H> {
        self.worker.as_ref()
    }

    /// Mutably borrow the owned worker, e.g. to join or detach it early.
    pub fn get_mut(&mut self) -> Option<&mut H> {
        self.worker.as_mut()
    }

    /// Move the worker and its disposition into a new wrapper.
    ///
    /// `self` is left empty and its release becomes a no-op.
    pub fn take(&mut self) -> Self {
        Self {
            disposition: self.disposition,
            worker: self.worker.take(),
            released: std::mem::replace(&mut self.released, true),
        }
    }

    /// Give the worker back without applying the disposition.
    pub fn into_inner(mut self) -> Option<H> {
        self.released = true;
        self.worker.take()
    }

    /// Apply the disposition if the worker is still attached.
    ///
    /// Only the first call can do anything; later calls return
    /// [`Release::Skipped`]. Errors come from the underlying handle (for
    /// example a worker that panicked) and leave the wrapper released.
    pub fn release(&mut self) -> Result<Release> {
        if self.released {
            return Ok(Release::Skipped);
        }
        self.released = true;

        let Some(worker) = self.worker.as_mut() else {
            return Ok(Release::Skipped);
        };
        if !worker.attached() {
            debug!(disposition = %self.disposition, "Scoped worker already terminal");
            return Ok(Release::Skipped);
        }

        match self.disposition {
            Disposition::WaitOnRelease => {
                debug!("Releasing scoped worker: waiting for completion");
                worker.wait_for_completion()?;
                Ok(Release::Joined)
            }
            Disposition::DetachOnRelease => {
                debug!("Releasing scoped worker: detaching");
                worker.detach()?;
                Ok(Release::Detached)
            }
        }
    }
}

impl<T: Send + 'static> ScopedWorker<ThreadWorker<T>> {
    /// Start `f` on a new thread and wrap it.
    pub fn spawn<F>(disposition: Disposition, f: F) -> Result<Self>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Ok(Self::new(ThreadWorker::spawn(f)?, disposition))
    }

    /// Start `f` on a new named thread and wrap it.
    pub fn spawn_named<F>(name: impl Into<String>, disposition: Disposition, f: F) -> Result<Self>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Ok(Self::new(ThreadWorker::spawn_named(name, f)?, disposition))
    }
}

impl<H: WorkerHandle> Default for ScopedWorker<H> {
    fn default() -> Self {
        Self {
            disposition: Disposition::default(),
            worker: None,
            released: false,
        }
    }
}

impl<H: WorkerHandle> Drop for ScopedWorker<H> {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            error!(disposition = %self.disposition, "Failed to release scoped worker: {}", err);
        }
    }
}

impl<H: WorkerHandle + std::fmt::Debug> std::fmt::Debug for ScopedWorker<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedWorker")
            .field("disposition", &self.disposition)
            .field("worker", &self.worker)
            .field("released", &self.released)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WorkerError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};
    use std::time::{Duration, Instant};

    /// Handle that only counts what was done to it.
    #[derive(Debug, Default)]
    struct CountingHandle {
        attached: bool,
        waits: Arc<AtomicUsize>,
        detaches: Arc<AtomicUsize>,
    }

    impl CountingHandle {
        fn attached() -> Self {
            Self {
                attached: true,
                ..Default::default()
            }
        }
    }

    impl WorkerHandle for CountingHandle {
        fn attached(&self) -> bool {
            self.attached
        }

        fn wait_for_completion(&mut self) -> Result<()> {
            if !self.attached {
                return Err(WorkerError::NotAttached);
            }
            self.attached = false;
            self.waits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn detach(&mut self) -> Result<()> {
            if !self.attached {
                return Err(WorkerError::NotAttached);
            }
            self.attached = false;
            self.detaches.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_wait_on_release_completes_side_effect() {
        let done = Arc::new(AtomicBool::new(false));
        {
            let flag = done.clone();
            let _guard = ScopedWorker::spawn(Disposition::WaitOnRelease, move || {
                std::thread::sleep(Duration::from_millis(50));
                flag.store(true, Ordering::SeqCst);
            })
            .unwrap();
        }
        assert!(done.load(Ordering::SeqCst));
    }

    #[test]
    fn test_wait_on_release_leaves_worker_unattached() {
        let mut guard = ScopedWorker::spawn(Disposition::WaitOnRelease, || 5).unwrap();
        assert_eq!(guard.release().unwrap(), Release::Joined);

        let worker = guard.get_mut().unwrap();
        assert!(!worker.attached());
        assert_eq!(worker.join().unwrap(), 5);
    }

    #[test]
    fn test_detach_on_release_does_not_block() {
        let (tx, rx) = mpsc::channel::<()>();
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let mut guard = ScopedWorker::spawn(Disposition::DetachOnRelease, move || {
            let _ = rx.recv_timeout(Duration::from_secs(5));
            flag.store(true, Ordering::SeqCst);
        })
        .unwrap();

        let start = Instant::now();
        assert_eq!(guard.release().unwrap(), Release::Detached);
        assert!(!guard.get().unwrap().attached());
        drop(guard);
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(!finished.load(Ordering::SeqCst));

        tx.send(()).unwrap();
    }

    #[test]
    fn test_detach_on_drop_of_running_worker() {
        let (tx, rx) = mpsc::channel::<()>();
        let start = Instant::now();
        {
            let _guard = ScopedWorker::spawn(Disposition::DetachOnRelease, move || {
                let _ = rx.recv_timeout(Duration::from_secs(5));
            })
            .unwrap();
        }
        assert!(start.elapsed() < Duration::from_secs(1));
        let _ = tx.send(());
    }

    #[test]
    fn test_completed_worker_releases_immediately() {
        let mut worker = ThreadWorker::spawn(|| ()).unwrap();
        worker.wait_for_completion().unwrap();

        let mut guard = ScopedWorker::new(worker, Disposition::WaitOnRelease);
        assert_eq!(guard.release().unwrap(), Release::Skipped);
        assert!(!guard.get().unwrap().attached());
    }

    #[test]
    fn test_double_release_applies_once() {
        let handle = CountingHandle::attached();
        let waits = handle.waits.clone();

        {
            let mut guard = ScopedWorker::new(handle, Disposition::WaitOnRelease);
            assert_eq!(guard.release().unwrap(), Release::Joined);
            assert_eq!(guard.release().unwrap(), Release::Skipped);
            assert!(guard.is_released());
        }

        assert_eq!(waits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_take_moves_ownership() {
        let handle = CountingHandle::attached();
        let detaches = handle.detaches.clone();

        let mut source = ScopedWorker::new(handle, Disposition::DetachOnRelease);
        let mut target = source.take();

        assert!(source.is_empty());
        assert_eq!(source.release().unwrap(), Release::Skipped);
        assert_eq!(detaches.load(Ordering::SeqCst), 0);

        assert_eq!(target.disposition(), Disposition::DetachOnRelease);
        drop(source);
        assert_eq!(target.release().unwrap(), Release::Detached);
        drop(target);
        assert_eq!(detaches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_move_assignment_releases_previous_worker() {
        let first = CountingHandle::attached();
        let second = CountingHandle::attached();
        let first_waits = first.waits.clone();
        let second_waits = second.waits.clone();

        let mut guard = ScopedWorker::new(first, Disposition::WaitOnRelease);
        assert!(!guard.is_empty());
        guard = ScopedWorker::new(second, Disposition::WaitOnRelease);
        assert_eq!(first_waits.load(Ordering::SeqCst), 1);
        assert_eq!(second_waits.load(Ordering::SeqCst), 0);

        drop(guard);
        assert_eq!(second_waits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_early_manual_join_then_scope_exit() {
        let handle = CountingHandle::attached();
        let waits = handle.waits.clone();
        let detaches = handle.detaches.clone();

        {
            let mut guard = ScopedWorker::new(handle, Disposition::DetachOnRelease);
            guard.get_mut().unwrap().wait_for_completion().unwrap();
        }

        assert_eq!(waits.load(Ordering::SeqCst), 1);
        assert_eq!(detaches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_into_inner_disarms() {
        let handle = CountingHandle::attached();
        let waits = handle.waits.clone();

        let guard = ScopedWorker::new(handle, Disposition::WaitOnRelease);
        let handle = guard.into_inner().unwrap();

        assert!(handle.attached());
        assert_eq!(waits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_default_is_empty() {
        let mut guard = ScopedWorker::<CountingHandle>::default();
        assert!(guard.is_empty());
        assert!(guard.get().is_none());
        assert_eq!(guard.release().unwrap(), Release::Skipped);
    }

    #[test]
    fn test_early_return_still_joins() {
        fn work(done: Arc<AtomicBool>, bail: bool) -> std::result::Result<(), &'static str> {
            let _guard = ScopedWorker::spawn(Disposition::WaitOnRelease, move || {
                std::thread::sleep(Duration::from_millis(30));
                done.store(true, Ordering::SeqCst);
            })
            .map_err(|_| "spawn failed")?;

            if bail {
                return Err("conditions not satisfied");
            }
            Ok(())
        }

        let done = Arc::new(AtomicBool::new(false));
        assert!(work(done.clone(), true).is_err());
        assert!(done.load(Ordering::SeqCst));
    }

    #[test]
    fn test_unwinding_still_joins() {
        let done = Arc::new(AtomicBool::new(false));
        let flag = done.clone();

        let result = std::panic::catch_unwind(move || {
            let _guard = ScopedWorker::spawn(Disposition::WaitOnRelease, move || {
                std::thread::sleep(Duration::from_millis(30));
                flag.store(true, Ordering::SeqCst);
            })
            .unwrap();
            panic!("owner failed");
        });

        assert!(result.is_err());
        assert!(done.load(Ordering::SeqCst));
    }

    #[test]
    fn test_panicking_worker_reports_on_explicit_release() {
        let mut guard = ScopedWorker::<ThreadWorker<()>>::spawn(Disposition::WaitOnRelease, || {
            panic!("bad input")
        })
        .unwrap();

        match guard.release() {
            Err(WorkerError::Panicked(msg)) => assert_eq!(msg, "bad input"),
            other => panic!("unexpected release result: {other:?}"),
        }
        assert_eq!(guard.release().unwrap(), Release::Skipped);
    }

    #[test]
    fn test_panicking_worker_does_not_panic_on_drop() {
        let guard = ScopedWorker::<ThreadWorker<()>>::spawn(Disposition::WaitOnRelease, || {
            panic!("bad input")
        })
        .unwrap();
        drop(guard);
    }

    #[test]
    fn test_boxed_dyn_handle() {
        let handle: Box<dyn WorkerHandle> = Box::new(ThreadWorker::spawn(|| ()).unwrap());
        let mut guard = ScopedWorker::new(handle, Disposition::WaitOnRelease);
        assert_eq!(guard.release().unwrap(), Release::Joined);
    }
}
