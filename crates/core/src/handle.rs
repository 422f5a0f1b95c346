//! Worker handle abstraction.

use crate::error::Result;

/// A handle to a unit of background execution.
///
/// Implementors own at most one outstanding execution. Once it has been
/// waited for or detached the handle reports `attached() == false` and
/// further calls to [`wait_for_completion`](Self::wait_for_completion) or
/// [`detach`](Self::detach) fail with
/// [`WorkerError::NotAttached`](crate::WorkerError::NotAttached).
pub trait WorkerHandle {
    /// Whether the handle still owns a running or joinable execution.
    fn attached(&self) -> bool;

    /// Block until the execution finishes.
    fn wait_for_completion(&mut self) -> Result<()>;

    /// Let the execution continue independently.
    fn detach(&mut self) -> Result<()>;
}

impl<H: WorkerHandle + ?Sized> WorkerHandle for Box<H> {
    fn attached(&self) -> bool {
        (**self).attached()
    }

    fn wait_for_completion(&mut self) -> Result<()> {
        (**self).wait_for_completion()
    }

    fn detach(&mut self) -> Result<()> {
        (**self).detach()
    }
}
