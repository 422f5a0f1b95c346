//! Errors surfaced by worker handles.

use std::any::Any;

/// Result alias for worker operations.
pub type Result<T> = std::result::Result<T, WorkerError>;

/// Errors that can occur while driving a worker.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// Wait or detach on a handle with nothing outstanding
    #[error("worker is not attached")]
    NotAttached,

    /// The worker's closure panicked
    #[error("worker panicked: {0}")]
    Panicked(String),

    /// The OS refused to start the thread
    #[error("failed to spawn worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// A one-shot signal was dropped without firing
    #[error("signal dropped before firing")]
    SignalDropped,

    /// A task result was already taken
    #[error("task result already retrieved")]
    AlreadyRetrieved,
}

impl WorkerError {
    /// Build a [`WorkerError::Panicked`] from a panic payload.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Self::Panicked(panic_message(payload.as_ref()))
    }
}

/// Extract a readable message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
