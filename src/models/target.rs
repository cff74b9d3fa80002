use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::models::{LogEntry, Status};

pub const MAX_ERROR_CHARS: usize = 300;
pub const MAX_SURFACED_LOG_ENTRIES: usize = 100;

/// One tracked product page together with its observation history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Target {
    pub url: String,
    pub interval_sec: u64,
    #[serde(default)]
    pub recipients: Vec<String>,

    #[serde(default)]
    pub last_checked: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_status: Status,
    #[serde(default)]
    pub previous_fingerprint: Option<String>,
    #[serde(default)]
    pub last_change: Option<DateTime<Utc>>,

    #[serde(default)]
    pub change_count: u64,
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub fail_count: u64,
    #[serde(default)]
    pub last_error: String,

    #[serde(default)]
    pub log: Vec<LogEntry>,
}

/// Caller-owned settings of a target; everything else belongs to the check pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetConfig {
    pub interval_sec: u64,
    pub recipients: Vec<String>,
}

/// Result of a successful fetch run through extraction, classification and fingerprinting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub status: Status,
    pub fingerprint: String,
}

impl Target {
    pub fn new(url: impl Into<String>, config: TargetConfig) -> Self {
        Self {
            url: url.into(),
            interval_sec: config.interval_sec,
            recipients: config.recipients,
            last_checked: None,
            last_status: Status::Unknown,
            previous_fingerprint: None,
            last_change: None,
            change_count: 0,
            success_count: 0,
            fail_count: 0,
            last_error: String::new(),
            log: Vec::new(),
        }
    }

    pub fn apply_config(&mut self, config: TargetConfig) {
        self.interval_sec = config.interval_sec;
        self.recipients = config.recipients;
    }

    /// Fold a successful observation into the record. Returns true when the
    /// content changed against an existing baseline.
    pub fn record_success(&mut self, observation: &Observation, at: DateTime<Utc>) -> bool {
        let changed = self
            .previous_fingerprint
            .as_deref()
            .is_some_and(|previous| previous != observation.fingerprint);

        if changed {
            self.last_change = Some(at);
            self.change_count += 1;
            self.log.push(LogEntry::changed(at, observation.status));
        }

        self.previous_fingerprint = Some(observation.fingerprint.clone());
        self.last_status = observation.status;
        self.last_checked = Some(at);
        self.last_error.clear();
        self.success_count += 1;

        changed
    }

    /// Fingerprint and status are left alone: a failed fetch observed nothing.
    pub fn record_failure(&mut self, error: &str, at: DateTime<Utc>) {
        let message = truncate_chars(error, MAX_ERROR_CHARS);

        self.fail_count += 1;
        self.last_checked = Some(at);
        self.log.push(LogEntry::failure(at, message.clone()));
        self.last_error = message;
    }

    /// Most recent entries first, capped at `limit`.
    pub fn recent_log(&self, limit: usize) -> Vec<LogEntry> {
        self.log.iter().rev().take(limit).cloned().collect()
    }

    /// Copy handed to callers: history trimmed to the newest
    /// `MAX_SURFACED_LOG_ENTRIES`, still oldest first.
    pub fn surfaced(&self) -> Target {
        let mut target = self.clone();
        let excess = target.log.len().saturating_sub(MAX_SURFACED_LOG_ENTRIES);
        target.log.drain(..excess);
        target
    }

    pub fn total_checks(&self) -> u64 {
        self.success_count + self.fail_count
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
