//! Lesson configuration.

use joinguard_core::Disposition;
use joinguard_sync::Launch;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A value is out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for every lesson.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonsConfig {
    /// Filtered collection with early exit
    pub filter: FilterConfig,
    /// Detached worker
    pub detach: DetachConfig,
    /// Detect/react hand-off
    pub signal: SignalConfig,
    /// Task-based execution
    pub task: TaskConfig,
}

impl LessonsConfig {
    /// Load from a JSON file; missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.filter.step == 0 {
            return Err(ConfigError::Invalid("filter.step must be positive".to_string()));
        }
        if crate::handoff::compute_important_value(self.signal.input).is_none() {
            return Err(ConfigError::Invalid(format!(
                "signal.input {} is out of range",
                self.signal.input
            )));
        }
        Ok(())
    }
}

/// Configuration for the filter lesson.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Upper bound (inclusive) of the scanned range
    pub max: u64,
    /// Keep values divisible by this
    pub step: u64,
    /// What happens to the collector on an early exit
    pub disposition: Disposition,
    /// Outcome of the precondition check
    pub accept: bool,
    /// How long the precondition check takes
    pub check_delay_ms: u64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max: 10_000_000,
            step: 1000,
            disposition: Disposition::WaitOnRelease,
            accept: true,
            check_delay_ms: 10,
        }
    }
}

impl FilterConfig {
    /// Set the scanned range.
    pub fn with_max(mut self, max: u64) -> Self {
        self.max = max;
        self
    }

    /// Set the divisor.
    pub fn with_step(mut self, step: u64) -> Self {
        self.step = step;
        self
    }

    /// Set the collector's disposition.
    pub fn with_disposition(mut self, disposition: Disposition) -> Self {
        self.disposition = disposition;
        self
    }

    /// Make the precondition check fail.
    pub fn rejecting(mut self) -> Self {
        self.accept = false;
        self
    }
}

/// Configuration for the detach lesson.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetachConfig {
    /// How long the detached worker runs
    pub work_ms: u64,
}

impl Default for DetachConfig {
    fn default() -> Self {
        Self { work_ms: 200 }
    }
}

impl DetachConfig {
    /// Set the worker's run time.
    pub fn with_work_ms(mut self, work_ms: u64) -> Self {
        self.work_ms = work_ms;
        self
    }
}

/// Configuration for the signal lesson.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Delay before the detecting side publishes
    pub delay_ms: u64,
    /// Input to the published computation
    pub input: i64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            delay_ms: 50,
            input: 10,
        }
    }
}

impl SignalConfig {
    /// Set the publish delay.
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

/// Configuration for the task lesson.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Launch policy
    pub launch: Launch,
    /// Make the task panic
    pub fail: bool,
    /// Poll interval while waiting for the result
    pub poll_ms: u64,
    /// How long the task body runs
    pub work_ms: u64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            launch: Launch::Async,
            fail: false,
            poll_ms: 10,
            work_ms: 30,
        }
    }
}

impl TaskConfig {
    /// Set the launch policy.
    pub fn with_launch(mut self, launch: Launch) -> Self {
        self.launch = launch;
        self
    }

    /// Make the task panic.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}
