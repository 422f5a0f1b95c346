//! joinguard core types.
//!
//! This crate defines the worker handle abstraction and the scoped
//! wrapper that guarantees a background worker is either waited for or
//! detached, exactly once, when its owner goes away.

#![warn(missing_docs)]

// Identity and policy
mod id;
mod disposition;

// Handles
mod error;
mod handle;
mod thread;
mod scoped;

// Re-exports
pub use id::WorkerId;
pub use disposition::{Disposition, ParseDispositionError};
pub use error::{panic_message, Result, WorkerError};
pub use handle::WorkerHandle;
pub use thread::ThreadWorker;
pub use scoped::{Release, ScopedWorker};
