//! Detect/react hand-off between threads.
//!
//! Two reacting workers wait for a detecting thread: one on a
//! [`Coordinator`] guarding the published value, one on a one-shot
//! [`Listener`](joinguard_sync::Listener).

use crate::config::SignalConfig;
use crate::report::{LessonReport, Outcome};
use anyhow::{anyhow, Context, Result};
use joinguard_core::{Disposition, ScopedWorker};
use joinguard_sync::{signal, Coordinator};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Value published by the detecting side, or `None` if it does not fit.
pub(crate) fn compute_important_value(x: i64) -> Option<i64> {
    x.checked_mul(100)
}

/// What the value reader waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Pending,
    Published(i64),
    Abandoned,
}

/// Marks a still-pending slot as abandoned when dropped, so a reader
/// blocked on it wakes up on every exit path.
struct AbandonOnExit(Arc<Coordinator<Slot>>);

impl Drop for AbandonOnExit {
    fn drop(&mut self) {
        self.0.update(|slot| {
            if *slot == Slot::Pending {
                warn!("Hand-off left without publishing; releasing the value reader");
                *slot = Slot::Abandoned;
            }
        });
    }
}

/// Run the lesson.
pub fn run(config: &SignalConfig) -> Result<LessonReport> {
    let mut report = LessonReport::begin("signal");
    let value = compute_important_value(config.input)
        .ok_or_else(|| anyhow!("signal input {} is out of range", config.input))?;

    let published = Arc::new(Coordinator::new(Slot::Pending));
    let (start_work, listener) = signal();

    let shared = published.clone();
    let mut value_reader =
        ScopedWorker::spawn_named("value-reader", Disposition::WaitOnRelease, move || {
            let slot = *shared.wait_until(|slot| *slot != Slot::Pending);
            match slot {
                Slot::Published(value) => Some(value),
                Slot::Pending | Slot::Abandoned => None,
            }
        })
        .context("failed to start value reader")?;
    // Dropped before `value_reader`, which joins on release.
    let _abandon = AbandonOnExit(published.clone());

    let mut event_reader =
        ScopedWorker::spawn_named("event-reader", Disposition::WaitOnRelease, move || {
            listener.wait().map(|()| "start working")
        })
        .context("failed to start event reader")?;

    std::thread::sleep(Duration::from_millis(config.delay_ms));
    published.update(|slot| *slot = Slot::Published(value));
    start_work.fire();
    debug!(value, "Published value and fired signal");

    let seen = value_reader
        .get_mut()
        .ok_or_else(|| anyhow!("value reader missing"))?
        .join()?;
    report.note(format!("value reader saw {:?}", seen));

    let reaction = event_reader
        .get_mut()
        .ok_or_else(|| anyhow!("event reader missing"))?
        .join()??;
    report.note(format!("event reader: {reaction}"));

    let outcome = if seen == Some(value) {
        Outcome::Completed
    } else {
        Outcome::Failed {
            message: format!("expected {value}, reader saw {seen:?}"),
        }
    };
    Ok(report.finish(outcome))
}
