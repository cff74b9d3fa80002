use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{Status, Target};
use crate::utils::error::NotifyError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
}

impl Notification {
    pub fn stock_change(target: &Target, status: Status) -> Self {
        Self {
            subject: "Stock update".to_string(),
            body: format!("Page changed. Status: {}. URL: {}", status, target.url),
            recipients: target.recipients.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationResult {
    /// Nothing was attempted: channel off or nobody to tell.
    pub skipped: bool,
    pub delivered: usize,
    /// `(recipient, error)` for every address that could not be served.
    pub failed: Vec<(String, String)>,
}

impl NotificationResult {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }
}

/// Trait for notification channels. Delivery is best-effort: callers log the
/// outcome and carry on, so a failing channel never fails a check.
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// False when the channel is switched off or missing required settings.
    fn is_enabled(&self) -> bool;

    async fn notify(&self, notification: &Notification) -> Result<NotificationResult, NotifyError>;
}
