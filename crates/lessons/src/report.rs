//! Lesson run reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a lesson ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Ran to completion
    Completed,
    /// Left early because a precondition did not hold
    Rejected,
    /// A worker failed
    Failed {
        /// What went wrong
        message: String,
    },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Completed => write!(f, "completed"),
            Outcome::Rejected => write!(f, "rejected"),
            Outcome::Failed { message } => write!(f, "failed ({message})"),
        }
    }
}

/// Record of one lesson run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonReport {
    /// Unique run ID
    pub id: String,
    /// Lesson name
    pub lesson: String,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time (None while running)
    pub finished_at: Option<DateTime<Utc>>,
    /// Wall-clock duration in milliseconds
    pub elapsed_ms: i64,
    /// How it ended
    pub outcome: Outcome,
    /// Observations made along the way
    pub notes: Vec<String>,
}

impl LessonReport {
    /// Start a report for `lesson`.
    pub fn begin(lesson: impl Into<String>) -> Self {
        Self {
            id: format!("run_{}", ulid::Ulid::new()),
            lesson: lesson.into(),
            started_at: Utc::now(),
            finished_at: None,
            elapsed_ms: 0,
            outcome: Outcome::Completed,
            notes: Vec::new(),
        }
    }

    /// Record an observation.
    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// Stamp the end time and outcome.
    pub fn finish(mut self, outcome: Outcome) -> Self {
        let now = Utc::now();
        self.elapsed_ms = (now - self.started_at).num_milliseconds();
        self.finished_at = Some(now);
        self.outcome = outcome;
        self
    }
}

impl fmt::Display for LessonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lesson: {} ({})", self.lesson, self.id)?;
        writeln!(f, "  Outcome: {}", self.outcome)?;
        write!(f, "  Elapsed: {}ms", self.elapsed_ms)?;
        for note in &self.notes {
            write!(f, "\n  - {note}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_sets_times() {
        let mut report = LessonReport::begin("filter");
        report.note("collected 10 values");
        let report = report.finish(Outcome::Rejected);

        assert!(report.id.starts_with("run_"));
        assert_eq!(report.outcome, Outcome::Rejected);
        assert!(report.finished_at.unwrap() >= report.started_at);
        assert!(report.elapsed_ms >= 0);
    }

    #[test]
    fn test_outcome_json_shape() {
        let json = serde_json::to_value(Outcome::Failed {
            message: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["message"], "boom");

        let json = serde_json::to_value(Outcome::Completed).unwrap();
        assert_eq!(json["status"], "completed");
    }

    #[test]
    fn test_display_lists_notes() {
        let mut report = LessonReport::begin("task");
        report.note("first");
        report.note("second");
        let text = report.finish(Outcome::Completed).to_string();

        assert!(text.contains("Lesson: task"));
        assert!(text.contains("Outcome: completed"));
        assert!(text.contains("  - first\n  - second"));
    }
}
