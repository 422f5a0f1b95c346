//! OS-thread backed worker.

use crate::error::{Result, WorkerError};
use crate::handle::WorkerHandle;
use crate::id::WorkerId;
use std::thread::JoinHandle;
use tracing::{debug, warn};

enum ThreadState<T> {
    Running(JoinHandle<T>),
    /// Joined; holds the value until [`ThreadWorker::join`] takes it.
    Joined(Option<T>),
    /// Joined after the closure panicked; keeps the panic message.
    Panicked(String),
    Detached,
}

/// A worker running on its own OS thread.
///
/// Unlike a bare [`JoinHandle`], a `ThreadWorker` remembers whether it was
/// joined or detached, so it can answer [`WorkerHandle::attached`] and keep
/// the closure's return value after a plain
/// [`wait_for_completion`](WorkerHandle::wait_for_completion).
pub struct ThreadWorker<T> {
    id: WorkerId,
    name: Option<String>,
    state: ThreadState<T>,
}

impl<T: Send + 'static> ThreadWorker<T> {
    /// Start `f` on a new thread.
    pub fn spawn<F>(f: F) -> Result<Self>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Self::start(None, f)
    }

    /// Start `f` on a new thread with the given name.
    pub fn spawn_named<F>(name: impl Into<String>, f: F) -> Result<Self>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Self::start(Some(name.into()), f)
    }

    fn start<F>(name: Option<String>, f: F) -> Result<Self>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let id = WorkerId::new();
        let mut builder = std::thread::Builder::new();
        if let Some(name) = &name {
            builder = builder.name(name.clone());
        }
        let handle = builder.spawn(f)?;
        debug!(worker = %id, name = name.as_deref().unwrap_or("-"), "Spawned worker thread");

        Ok(Self {
            id,
            name,
            state: ThreadState::Running(handle),
        })
    }
}

impl<T> ThreadWorker<T> {
    /// Worker identifier.
    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Thread name, if one was given.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Non-blocking check whether the closure has returned.
    ///
    /// Joined and detached workers report `true`.
    pub fn is_finished(&self) -> bool {
        match &self.state {
            ThreadState::Running(handle) => handle.is_finished(),
            ThreadState::Joined(_) | ThreadState::Panicked(_) | ThreadState::Detached => true,
        }
    }

    /// Block until the thread finishes and take its return value.
    ///
    /// If the worker was already waited for, returns the stored value once.
    /// A panic is reported on every call.
    pub fn join(&mut self) -> Result<T> {
        match std::mem::replace(&mut self.state, ThreadState::Joined(None)) {
            ThreadState::Running(handle) => {
                debug!(worker = %self.id, "Joining worker thread");
                handle.join().map_err(|payload| self.panicked(payload))
            }
            ThreadState::Joined(Some(value)) => Ok(value),
            ThreadState::Joined(None) => Err(WorkerError::AlreadyRetrieved),
            ThreadState::Panicked(message) => {
                self.state = ThreadState::Panicked(message.clone());
                Err(WorkerError::Panicked(message))
            }
            ThreadState::Detached => {
                self.state = ThreadState::Detached;
                Err(WorkerError::NotAttached)
            }
        }
    }

    fn panicked(&mut self, payload: Box<dyn std::any::Any + Send>) -> WorkerError {
        let message = crate::error::panic_message(&*payload);
        self.state = ThreadState::Panicked(message.clone());
        WorkerError::Panicked(message)
    }
}

impl<T> WorkerHandle for ThreadWorker<T> {
    fn attached(&self) -> bool {
        matches!(self.state, ThreadState::Running(_))
    }

    fn wait_for_completion(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, ThreadState::Joined(None)) {
            ThreadState::Running(handle) => {
                debug!(worker = %self.id, "Waiting for worker thread");
                let value = handle.join().map_err(|payload| self.panicked(payload))?;
                self.state = ThreadState::Joined(Some(value));
                Ok(())
            }
            other => {
                self.state = other;
                Err(WorkerError::NotAttached)
            }
        }
    }

    fn detach(&mut self) -> Result<()> {
        let ThreadState::Running(_) = self.state else {
            return Err(WorkerError::NotAttached);
        };
        // Dropping the JoinHandle detaches the thread.
        self.state = ThreadState::Detached;
        debug!(worker = %self.id, "Detached worker thread");
        Ok(())
    }
}

impl<T> Drop for ThreadWorker<T> {
    fn drop(&mut self) {
        if let ThreadState::Running(_) = self.state {
            warn!(
                worker = %self.id,
                name = self.name.as_deref().unwrap_or("-"),
                "ThreadWorker dropped while still attached; thread detached"
            );
        }
    }
}

impl<T> std::fmt::Debug for ThreadWorker<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            ThreadState::Running(_) => "running",
            ThreadState::Joined(_) => "joined",
            ThreadState::Panicked(_) => "panicked",
            ThreadState::Detached => "detached",
        };
        f.debug_struct("ThreadWorker")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &state)
            .finish()
    }
}
