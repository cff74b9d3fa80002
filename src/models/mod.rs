use serde::{Deserialize, Serialize};
use std::fmt;

pub mod log_entry;
pub mod signals;
pub mod snapshot;
pub mod target;

// Re-exports for convenience
pub use log_entry::*;
pub use signals::*;
pub use snapshot::*;
pub use target::*;

/// Stock state of a target as of its last check. `Error` is only ever set by a failed fetch.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    InStock,
    OutOfStock,
    #[default]
    Unknown,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::InStock => "IN_STOCK",
            Status::OutOfStock => "OUT_OF_STOCK",
            Status::Unknown => "UNKNOWN",
            Status::Error => "ERROR",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogEvent {
    Changed,
    Failure,
}

impl LogEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogEvent::Changed => "changed",
            LogEvent::Failure => "failure",
        }
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
