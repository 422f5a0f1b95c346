//! Dropping a detach-on-release worker does not block.

use crate::config::DetachConfig;
use crate::report::{LessonReport, Outcome};
use anyhow::{Context, Result};
use joinguard_core::{Disposition, ScopedWorker};
use joinguard_sync::signal;
use std::time::{Duration, Instant};
use tracing::info;

/// Run the lesson.
pub fn run(config: &DetachConfig) -> Result<LessonReport> {
    let mut report = LessonReport::begin("detach");
    let work = Duration::from_millis(config.work_ms);
    let (done, listener) = signal();

    let start = Instant::now();
    {
        let _worker = ScopedWorker::spawn_named(
            "detached-sleeper",
            Disposition::DetachOnRelease,
            move || {
                std::thread::sleep(work);
                done.fire();
            },
        )
        .context("failed to start detached worker")?;
    }
    let dropped_after = start.elapsed();
    info!(?dropped_after, "Detached worker released");
    report.note(format!(
        "wrapper dropped after {:?} while the worker still had {:?} of work",
        dropped_after, work
    ));

    let finished = listener
        .wait_timeout(work * 10 + Duration::from_secs(1))
        .context("detached worker went away without reporting")?;

    let outcome = if finished {
        report.note(format!("worker reported completion after {:?}", start.elapsed()));
        Outcome::Completed
    } else {
        Outcome::Failed {
            message: "detached worker did not report back in time".to_string(),
        }
    };

    Ok(report.finish(outcome))
}
