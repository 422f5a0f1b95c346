//! One-shot signal between two threads.
//!
//! The detecting side holds a [`Signal`] and fires it once; the reacting
//! side blocks on the [`Listener`]. There is no shared flag to poll and no
//! spurious wakeup to guard against.

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use joinguard_core::WorkerError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;

/// Sending half. Firing consumes it, so it can fire at most once.
#[derive(Debug)]
pub struct Signal {
    tx: Sender<()>,
}

/// Receiving half.
#[derive(Debug)]
pub struct Listener {
    rx: Receiver<()>,
    fired: AtomicBool,
}

/// Create a connected signal/listener pair.
pub fn signal() -> (Signal, Listener) {
    // Capacity 1: firing never blocks, even before the listener waits.
    let (tx, rx) = bounded(1);
    (
        Signal { tx },
        Listener {
            rx,
            fired: AtomicBool::new(false),
        },
    )
}

impl Signal {
    /// Wake the listener.
    pub fn fire(self) {
        // A listener that has gone away has nobody left to wake.
        if self.tx.send(()).is_err() {
            debug!("Signal fired with no listener");
        }
    }
}

impl Listener {
    /// Block until the signal fires.
    ///
    /// Returns [`WorkerError::SignalDropped`] if the [`Signal`] was dropped
    /// without firing. Once fired, later calls return immediately.
    pub fn wait(&self) -> Result<(), WorkerError> {
        if self.has_fired() {
            return Ok(());
        }
        self.rx.recv().map_err(|_| WorkerError::SignalDropped)?;
        self.fired.store(true, Ordering::Release);
        Ok(())
    }

    /// Block for at most `timeout`; `Ok(false)` means it has not fired yet.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<bool, WorkerError> {
        if self.has_fired() {
            return Ok(true);
        }
        match self.rx.recv_timeout(timeout) {
            Ok(()) => {
                self.fired.store(true, Ordering::Release);
                Ok(true)
            }
            Err(RecvTimeoutError::Timeout) => Ok(false),
            Err(RecvTimeoutError::Disconnected) => Err(WorkerError::SignalDropped),
        }
    }

    /// Whether a wait on this listener has already observed the signal.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joinguard_core::{Disposition, ScopedWorker};
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn test_fire_wakes_listener() {
        let (signal, listener) = signal();
        let mut reactor = ScopedWorker::spawn(Disposition::WaitOnRelease, move || {
            listener.wait().is_ok()
        })
        .unwrap();

        std::thread::sleep(Duration::from_millis(20));
        signal.fire();

        assert!(reactor.get_mut().unwrap().join().unwrap());
    }

    #[test]
    fn test_dropped_signal_reports_error() {
        let (signal, listener) = signal();
        drop(signal);
        assert!(matches!(listener.wait(), Err(WorkerError::SignalDropped)));
        assert!(matches!(
            listener.wait_timeout(Duration::from_millis(10)),
            Err(WorkerError::SignalDropped)
        ));
    }

    #[test]
    fn test_wait_timeout_before_fire() {
        let (signal, listener) = signal();
        let start = Instant::now();
        assert!(!listener.wait_timeout(Duration::from_millis(20)).unwrap());
        assert!(start.elapsed() >= Duration::from_millis(20));

        signal.fire();
        assert!(listener.wait_timeout(Duration::from_millis(20)).unwrap());
        assert!(listener.has_fired());
    }

    #[test]
    fn test_repeat_wait_after_fire() {
        let (signal, listener) = signal();
        signal.fire();
        listener.wait().unwrap();
        listener.wait().unwrap();
    }

    #[test]
    fn test_listener_shared_across_threads() {
        let (signal, listener) = signal();
        let listener = Arc::new(listener);
        let shared = listener.clone();
        let mut reactor = ScopedWorker::spawn(Disposition::WaitOnRelease, move || {
            shared.wait().is_ok()
        })
        .unwrap();

        std::thread::sleep(Duration::from_millis(10));
        signal.fire();

        assert!(reactor.get_mut().unwrap().join().unwrap());
        assert!(listener.has_fired());
    }

    #[test]
    fn test_fire_without_listener_is_silent() {
        let (signal, listener) = signal();
        drop(listener);
        signal.fire();
    }
}
