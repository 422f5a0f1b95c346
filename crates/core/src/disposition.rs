//! What a scoped worker does with its thread when released.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Release policy, fixed when a [`ScopedWorker`](crate::ScopedWorker) is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Disposition {
    /// Block until the worker finishes
    #[default]
    #[serde(rename = "wait")]
    WaitOnRelease,
    /// Let the worker keep running on its own
    #[serde(rename = "detach")]
    DetachOnRelease,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::WaitOnRelease => write!(f, "wait"),
            Disposition::DetachOnRelease => write!(f, "detach"),
        }
    }
}

/// Error returned when parsing an unknown disposition name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown disposition '{0}' (expected 'wait' or 'detach')")]
pub struct ParseDispositionError(String);

impl FromStr for Disposition {
    type Err = ParseDispositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wait" | "join" => Ok(Disposition::WaitOnRelease),
            "detach" => Ok(Disposition::DetachOnRelease),
            _ => Err(ParseDispositionError(s.to_string())),
        }
    }
}
