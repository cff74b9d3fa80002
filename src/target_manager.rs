use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::classifier::Classifier;
use crate::config::AppConfig;
use crate::extractor::Extractor;
use crate::fetcher::{HttpFetcher, PageFetcher};
use crate::fingerprint::fingerprint;
use crate::models::{LogEntry, Observation, Status, Target, TargetConfig, MAX_SURFACED_LOG_ENTRIES};
use crate::plugins::notifiers::EmailNotifier;
use crate::plugins::traits::{Notification, NotifierPlugin};
use crate::store::{JsonFileStore, TargetStore};
use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CheckOutcome {
    pub target: Target,
    /// `Error` when the fetch failed.
    pub status: Status,
    pub changed: bool,
}

/// Runs the check pipeline and owns every mutation of the target collection.
///
/// Fetching happens outside the write lock; loading, applying the observation,
/// notifying and saving happen inside it, so registrations and other checks
/// never lose updates to the whole-snapshot overwrite.
pub struct TargetManager {
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn TargetStore>,
    notifier: Arc<dyn NotifierPlugin>,
    extractor: Extractor,
    classifier: Classifier,
    write_lock: Mutex<()>,
}

impl TargetManager {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn TargetStore>,
        notifier: Arc<dyn NotifierPlugin>,
        extractor: Extractor,
        classifier: Classifier,
    ) -> Self {
        Self {
            fetcher,
            store,
            notifier,
            extractor,
            classifier,
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.fetcher)?;
        let notifier = EmailNotifier::new(config.notifications.smtp.clone());
        if !notifier.is_enabled() {
            info!("Email notifications are off");
        }

        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(JsonFileStore::new(&config.store.path)),
            Arc::new(notifier),
            Extractor::from_config(&config.detection),
            Classifier::from_config(&config.detection),
        ))
    }

    /// Start tracking `url`, or overwrite its interval and recipients while
    /// keeping counters and history.
    pub async fn register_or_update(&self, url: &str, interval_sec: u64, recipients: Vec<String>) -> Result<Target> {
        let url = url.trim();
        validate_url(url)?;
        if interval_sec == 0 {
            return Err(AppError::Validation("Interval must be greater than 0 seconds".into()));
        }

        let recipients = recipients
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();

        let _guard = self.write_lock.lock().await;
        let mut snapshot = self.store.load().await;
        let target = snapshot
            .upsert(url, TargetConfig { interval_sec, recipients })
            .surfaced();
        self.store.save(&snapshot).await?;

        info!("Tracking {} every {}s ({} recipients)", url, interval_sec, target.recipients.len());
        Ok(target)
    }

    /// Extract, classify and fingerprint one page.
    pub fn observe(&self, raw: &str) -> Observation {
        let signals = self.extractor.extract(raw);
        let status = self.classifier.classify(&signals);

        if let Some(rule) = self.classifier.matching_rule(&signals) {
            debug!("Classified as {} by rule {}", status, rule.name);
        } else {
            debug!("No rule matched, status {}", status);
        }

        Observation {
            status,
            fingerprint: fingerprint(&signals),
        }
    }

    pub async fn check_one(&self, url: &str) -> Result<CheckOutcome> {
        let url = url.trim();
        if self.store.load().await.get(url).is_none() {
            return Err(not_found(url));
        }

        let observation = self.fetcher.fetch(url).await.map(|raw| self.observe(&raw));

        let _guard = self.write_lock.lock().await;
        let mut snapshot = self.store.load().await;
        let target = snapshot.get_mut(url).ok_or_else(|| not_found(url))?;
        let at = Utc::now();

        let (status, changed) = match &observation {
            Ok(observation) => (observation.status, target.record_success(observation, at)),
            Err(e) => {
                warn!("Check of {} failed: {}", url, e);
                target.record_failure(&e.to_string(), at);
                (Status::Error, false)
            }
        };
        let target = target.surfaced();

        if changed {
            self.send_alert(&target, status).await;
        }

        self.store.save(&snapshot).await?;

        info!(
            "Checked {}: {}{}",
            url,
            status,
            if changed { " (changed)" } else { "" }
        );
        Ok(CheckOutcome { target, status, changed })
    }

    /// Check every target in URL order, one after another. Returns how many failed.
    pub async fn check_all(&self) -> Result<usize> {
        let urls = self.store.load().await.urls();
        let mut failures = 0;

        for url in &urls {
            match self.check_one(url).await {
                Ok(outcome) if outcome.status == Status::Error => failures += 1,
                Ok(_) => {}
                // Removed since the listing was taken
                Err(AppError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        info!("Checked {} targets, {} failed", urls.len(), failures);
        Ok(failures)
    }

    pub async fn list_targets(&self) -> Vec<Target> {
        self.store.load().await.all().into_iter().map(Target::surfaced).collect()
    }

    pub async fn get_target(&self, url: &str) -> Option<Target> {
        self.store.load().await.get(url.trim()).map(Target::surfaced)
    }

    /// The latest log entries of a target, newest first.
    pub async fn get_logs(&self, url: &str) -> Result<Vec<LogEntry>> {
        let url = url.trim();
        self.store
            .load()
            .await
            .get(url)
            .map(|target| target.recent_log(MAX_SURFACED_LOG_ENTRIES))
            .ok_or_else(|| not_found(url))
    }

    pub async fn remove_target(&self, url: &str) -> Result<Target> {
        let url = url.trim();
        let _guard = self.write_lock.lock().await;
        let mut snapshot = self.store.load().await;
        let removed = snapshot.remove(url).ok_or_else(|| not_found(url))?;
        self.store.save(&snapshot).await?;

        info!("Stopped tracking {}", url);
        Ok(removed.surfaced())
    }

    // Delivery problems are logged here and go no further
    async fn send_alert(&self, target: &Target, status: Status) {
        if target.recipients.is_empty() {
            debug!("Change on {} but no recipients to notify", target.url);
            return;
        }

        let notification = Notification::stock_change(target, status);
        match self.notifier.notify(&notification).await {
            Ok(result) if result.skipped => debug!("{} skipped alert for {}", self.notifier.name(), target.url),
            Ok(result) if !result.failed.is_empty() => warn!(
                "{} reached {} of {} recipients for {}",
                self.notifier.name(),
                result.delivered,
                target.recipients.len(),
                target.url
            ),
            Ok(result) => debug!("Alerted {} recipients for {}", result.delivered, target.url),
            Err(e) => warn!("{} failed for {}: {}", self.notifier.name(), target.url, e),
        }
    }
}

fn validate_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(AppError::Validation("URL must not be empty".into()));
    }

    match url::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        Ok(parsed) => Err(AppError::Validation(format!(
            "Unsupported URL scheme '{}': {}",
            parsed.scheme(),
            url
        ))),
        Err(e) => Err(AppError::Validation(format!("Invalid URL {}: {}", url, e))),
    }
}

fn not_found(url: &str) -> AppError {
    AppError::NotFound {
        resource: format!("target {}", url),
    }
}
