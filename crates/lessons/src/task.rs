//! Task-based execution: results and panics come back through the handle.

use crate::config::TaskConfig;
use crate::report::{LessonReport, Outcome};
use anyhow::{Context, Result};
use joinguard_core::WorkerError;
use joinguard_sync::{spawn_task, TaskStatus};
use std::time::Duration;
use tracing::{debug, warn};

/// Run the lesson.
pub fn run(config: &TaskConfig) -> Result<LessonReport> {
    let mut report = LessonReport::begin("task");
    let (fail, work) = (config.fail, Duration::from_millis(config.work_ms));

    let mut task = spawn_task(config.launch, move || -> i64 {
        std::thread::sleep(work);
        if fail {
            panic!("something wrong");
        }
        10 + 41
    })
    .context("failed to launch task")?;
    report.note(format!("launched with {:?} policy", task.launch()));

    let poll = Duration::from_millis(config.poll_ms.max(1));
    let mut polls = 0_u32;
    loop {
        match task.wait_for(poll) {
            TaskStatus::Ready => break,
            TaskStatus::Timeout => polls += 1,
            TaskStatus::Deferred => {
                report.note("task is deferred; running it on the caller thread");
                break;
            }
        }
    }
    debug!(polls, "Finished polling task");
    if polls > 0 {
        report.note(format!("result not ready after {polls} poll(s)"));
    }

    let outcome = match task.get() {
        Ok(value) => {
            report.note(format!("result: {value}"));
            Outcome::Completed
        }
        Err(WorkerError::Panicked(message)) => {
            warn!(%message, "Task panicked");
            report.note("panic captured by the task handle");
            Outcome::Failed { message }
        }
        Err(err) => return Err(err.into()),
    };
    Ok(report.finish(outcome))
}
