//! Filtered collection with an early exit.
//!
//! A collector thread scans `0..=max` while the caller checks a
//! precondition on a second thread. If the check fails the function
//! returns early, and the collector's [`ScopedWorker`] applies its
//! disposition on the way out instead of leaving the thread unmanaged.

use crate::config::FilterConfig;
use crate::report::{LessonReport, Outcome};
use anyhow::{anyhow, Context, Result};
use joinguard_core::{Disposition, ScopedWorker};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Summary of the collected values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected {
    /// Number of values kept
    pub count: usize,
    /// Smallest kept value
    pub first: Option<u64>,
    /// Largest kept value
    pub last: Option<u64>,
}

/// Run the lesson.
pub fn run(config: &FilterConfig) -> Result<LessonReport> {
    let mut report = LessonReport::begin("filter");
    report.note(format!(
        "scanning 0..={} for multiples of {} (disposition: {})",
        config.max, config.step, config.disposition
    ));

    let start = Instant::now();
    let collected = collect(config)?;
    let returned_after = start.elapsed();

    let outcome = match collected {
        Some(summary) => {
            report.note(format!(
                "collected {} values ({}..={})",
                summary.count,
                summary.first.map_or("-".to_string(), |v| v.to_string()),
                summary.last.map_or("-".to_string(), |v| v.to_string()),
            ));
            Outcome::Completed
        }
        None => {
            let released = match config.disposition {
                Disposition::WaitOnRelease => "waited for the collector",
                Disposition::DetachOnRelease => "detached the collector",
            };
            report.note(format!(
                "precondition rejected; scope exit {} after {:?}",
                released, returned_after
            ));
            Outcome::Rejected
        }
    };

    Ok(report.finish(outcome))
}

/// Scan and summarize, or `None` if the precondition check rejects.
pub fn collect(config: &FilterConfig) -> Result<Option<Collected>> {
    if config.step == 0 {
        return Err(anyhow!("step must be positive"));
    }

    let (max, step) = (config.max, config.step);
    let mut collector = ScopedWorker::spawn_named("filter-collector", config.disposition, move || {
        (0..=max).filter(|i| i % step == 0).collect::<Vec<u64>>()
    })
    .context("failed to start collector")?;

    if !conditions_satisfied(config.accept, Duration::from_millis(config.check_delay_ms))? {
        info!(disposition = %config.disposition, "Conditions not satisfied; leaving early");
        return Ok(None);
    }

    let values = collector
        .get_mut()
        .ok_or_else(|| anyhow!("collector handle missing"))?
        .join()
        .context("collector failed")?;
    debug!(count = values.len(), "Collector finished");

    Ok(Some(summarize(values)?))
}

/// Run the precondition check on its own thread.
fn conditions_satisfied(accept: bool, delay: Duration) -> Result<bool> {
    let mut check = ScopedWorker::spawn_named("filter-check", Disposition::WaitOnRelease, move || {
        std::thread::sleep(delay);
        accept
    })
    .context("failed to start condition check")?;

    let ok = check
        .get_mut()
        .ok_or_else(|| anyhow!("check handle missing"))?
        .join()?;
    Ok(ok)
}

/// Summarize on a worker that owns the values.
fn summarize(values: Vec<u64>) -> Result<Collected> {
    let mut worker = ScopedWorker::spawn(Disposition::WaitOnRelease, move || Collected {
        count: values.len(),
        first: values.first().copied(),
        last: values.last().copied(),
    })?;

    let summary = worker
        .get_mut()
        .ok_or_else(|| anyhow!("summary handle missing"))?
        .join()?;
    Ok(summary)
}
