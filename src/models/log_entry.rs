use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::models::{LogEvent, Status};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub event: LogEvent,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LogEntry {
    pub fn changed(at: DateTime<Utc>, status: Status) -> Self {
        Self {
            at,
            event: LogEvent::Changed,
            status,
            error: None,
        }
    }

    pub fn failure(at: DateTime<Utc>, error: String) -> Self {
        Self {
            at,
            event: LogEvent::Failure,
            status: Status::Error,
            error: Some(error),
        }
    }
}
