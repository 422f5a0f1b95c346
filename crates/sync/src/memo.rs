//! Lazily computed value that is safe to read through `&self`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// Caches the result of an expensive computation.
///
/// The cache and its validity live behind one mutex, so two readers that
/// race on an empty cache compute the value once, not twice.
pub struct Memo<T> {
    compute: Box<dyn Fn() -> T + Send + Sync>,
    cached: Mutex<Option<T>>,
    computations: AtomicUsize,
}

impl<T: Clone> Memo<T> {
    /// Create an empty memo around `compute`.
    pub fn new(compute: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            compute: Box::new(compute),
            cached: Mutex::new(None),
            computations: AtomicUsize::new(0),
        }
    }

    /// Return the cached value, computing it first if needed.
    pub fn get(&self) -> T {
        let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(value) = cached.as_ref() {
            return value.clone();
        }

        let value = (self.compute)();
        let n = self.computations.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(computations = n, "Memo computed value");
        *cached = Some(value.clone());
        value
    }

    /// Drop the cached value; the next [`get`](Self::get) recomputes it.
    pub fn invalidate(&self) {
        self.cached.lock().unwrap_or_else(|e| e.into_inner()).take();
    }

    /// How many times the computation has run.
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::Relaxed)
    }
}

impl<T> std::fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo")
            .field("computations", &self.computations.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
