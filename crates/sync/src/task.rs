//! Task-based execution.
//!
//! A [`TaskHandle`] is the result side of a closure launched with an
//! explicit [`Launch`] policy. Unlike a bare thread, it carries the
//! closure's return value back to the caller and turns a panic inside the
//! closure into [`WorkerError::Panicked`].

use joinguard_core::{
    Disposition, ScopedWorker, ThreadWorker, WorkerError, WorkerHandle, WorkerId,
};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, warn};

/// When a task's closure runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Launch {
    /// Immediately, on a new thread
    #[default]
    Async,
    /// Lazily, on the thread that first waits for the result
    Deferred,
}

/// Outcome of a bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// The result is available
    Ready,
    /// The timeout elapsed first
    Timeout,
    /// The closure has not started and will only run on `wait`/`get`
    Deferred,
}

type Outcome<T> = Result<T, WorkerError>;

enum TaskState<T> {
    Deferred(Box<dyn FnOnce() -> T + Send>),
    Running {
        worker: ScopedWorker<ThreadWorker<()>>,
        rx: Receiver<Outcome<T>>,
    },
    Ready(Outcome<T>),
    Detached,
}

/// Handle to a launched task.
///
/// Dropping the handle of an un-retrieved async task blocks until the
/// closure returns; a dropped deferred task never runs.
pub struct TaskHandle<T> {
    id: WorkerId,
    launch: Launch,
    state: TaskState<T>,
}

/// Launch `f` with the given policy.
pub fn spawn_task<T, F>(launch: Launch, f: F) -> Result<TaskHandle<T>, WorkerError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let id = WorkerId::new();
    let state = match launch {
        Launch::Deferred => TaskState::Deferred(Box::new(f)),
        Launch::Async => {
            let (tx, rx) = mpsc::channel();
            let worker = ScopedWorker::spawn(Disposition::WaitOnRelease, move || {
                let outcome = catch_unwind(AssertUnwindSafe(f)).map_err(WorkerError::from_panic);
                // The receiver may be gone if the task was detached.
                let _ = tx.send(outcome);
            })?;
            TaskState::Running { worker, rx }
        }
    };
    debug!(task = %id, launch = ?launch, "Launched task");

    Ok(TaskHandle { id, launch, state })
}

/// Launch `f` on a new thread right away.
pub fn spawn_async<T, F>(f: F) -> Result<TaskHandle<T>, WorkerError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    spawn_task(Launch::Async, f)
}

impl<T> TaskHandle<T> {
    /// Task identifier.
    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Launch policy this task was started with.
    pub fn launch(&self) -> Launch {
        self.launch
    }

    /// Whether the result is available without blocking.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, TaskState::Ready(_))
    }

    /// Wait at most `timeout` for the result.
    ///
    /// Never runs a deferred closure. A detached task reports
    /// [`TaskStatus::Ready`] since there is nothing left to wait for.
    pub fn wait_for(&mut self, timeout: Duration) -> TaskStatus {
        match &mut self.state {
            TaskState::Deferred(_) => TaskStatus::Deferred,
            TaskState::Ready(_) | TaskState::Detached => TaskStatus::Ready,
            TaskState::Running { rx, .. } => {
                let outcome = match rx.recv_timeout(timeout) {
                    Ok(outcome) => outcome,
                    Err(RecvTimeoutError::Timeout) => return TaskStatus::Timeout,
                    Err(RecvTimeoutError::Disconnected) => Err(lost_result()),
                };
                self.finish(outcome);
                TaskStatus::Ready
            }
        }
    }

    /// Block until the result is available, running a deferred closure on
    /// the calling thread.
    pub fn wait(&mut self) {
        match std::mem::replace(&mut self.state, TaskState::Detached) {
            TaskState::Deferred(f) => {
                debug!(task = %self.id, "Running deferred task on caller thread");
                let outcome = catch_unwind(AssertUnwindSafe(f)).map_err(WorkerError::from_panic);
                self.state = TaskState::Ready(outcome);
            }
            TaskState::Running { worker, rx } => {
                let outcome = rx.recv().unwrap_or_else(|_| Err(lost_result()));
                self.state = TaskState::Running { worker, rx };
                self.finish(outcome);
            }
            other => self.state = other,
        }
    }

    /// Block until the task finishes and take its result.
    pub fn get(mut self) -> Result<T, WorkerError> {
        self.wait();
        match std::mem::replace(&mut self.state, TaskState::Detached) {
            TaskState::Ready(outcome) => outcome,
            _ => Err(WorkerError::NotAttached),
        }
    }

    fn finish(&mut self, outcome: Outcome<T>) {
        if let TaskState::Running { mut worker, .. } =
            std::mem::replace(&mut self.state, TaskState::Ready(outcome))
        {
            // The closure already sent its result; joining only reaps the thread.
            if let Err(err) = worker.release() {
                warn!(task = %self.id, "Failed to reap task thread: {}", err);
            }
        }
    }
}

fn lost_result() -> WorkerError {
    WorkerError::Panicked("task thread exited without a result".to_string())
}

impl<T> WorkerHandle for TaskHandle<T> {
    fn attached(&self) -> bool {
        matches!(
            self.state,
            TaskState::Deferred(_) | TaskState::Running { .. }
        )
    }

    /// Completes the task; the result stays available through [`TaskHandle::get`].
    fn wait_for_completion(&mut self) -> joinguard_core::Result<()> {
        if !self.attached() {
            return Err(WorkerError::NotAttached);
        }
        self.wait();
        Ok(())
    }

    fn detach(&mut self) -> joinguard_core::Result<()> {
        match std::mem::replace(&mut self.state, TaskState::Detached) {
            TaskState::Deferred(_) => {
                debug!(task = %self.id, "Dropped deferred task without running it");
                Ok(())
            }
            TaskState::Running { mut worker, .. } => {
                if let Some(thread) = worker.get_mut() {
                    thread.detach()?;
                }
                debug!(task = %self.id, "Detached task thread");
                Ok(())
            }
            other => {
                self.state = other;
                Err(WorkerError::NotAttached)
            }
        }
    }
}

impl<T> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            TaskState::Deferred(_) => "deferred",
            TaskState::Running { .. } => "running",
            TaskState::Ready(_) => "ready",
            TaskState::Detached => "detached",
        };
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("launch", &self.launch)
            .field("state", &state)
            .finish()
    }
}
