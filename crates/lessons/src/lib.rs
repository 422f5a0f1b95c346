//! Runnable scenarios built on joinguard's worker handles.

#![warn(missing_docs)]

pub mod config;
pub mod report;
pub mod filter;
pub mod detach;
pub mod handoff;
pub mod task;

pub use config::{ConfigError, DetachConfig, FilterConfig, LessonsConfig, SignalConfig, TaskConfig};
pub use report::{LessonReport, Outcome};

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// The available lessons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lesson {
    /// Filtered collection with an early exit
    Filter,
    /// Detach-on-release worker
    Detach,
    /// Detect/react hand-off
    Signal,
    /// Task-based execution
    Task,
}

impl Lesson {
    /// Every lesson, in run order.
    pub const ALL: [Lesson; 4] = [Lesson::Filter, Lesson::Detach, Lesson::Signal, Lesson::Task];

    /// Run this lesson with its section of `config`.
    pub fn run(self, config: &LessonsConfig) -> anyhow::Result<LessonReport> {
        info!(lesson = %self, "Running lesson");
        match self {
            Lesson::Filter => filter::run(&config.filter),
            Lesson::Detach => detach::run(&config.detach),
            Lesson::Signal => handoff::run(&config.signal),
            Lesson::Task => task::run(&config.task),
        }
    }
}

impl fmt::Display for Lesson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lesson::Filter => write!(f, "filter"),
            Lesson::Detach => write!(f, "detach"),
            Lesson::Signal => write!(f, "signal"),
            Lesson::Task => write!(f, "task"),
        }
    }
}

/// Run every lesson in order.
pub fn run_all(config: &LessonsConfig) -> anyhow::Result<Vec<LessonReport>> {
    Lesson::ALL.iter().map(|lesson| lesson.run(config)).collect()
}
