//! Coordination primitives built on joinguard-core.
//!
//! Task-based execution with an explicit launch policy, one-shot signals,
//! a condition-variable context object and a thread-safe memoized value.

#![warn(missing_docs)]

pub mod task;
pub mod signal;
pub mod coordinator;
pub mod memo;

pub use task::{spawn_async, spawn_task, Launch, TaskHandle, TaskStatus};
pub use signal::{signal, Listener, Signal};
pub use coordinator::Coordinator;
pub use memo::Memo;
