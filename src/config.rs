use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::classifier::{DEFAULT_IN_STOCK_PHRASES, DEFAULT_OUT_OF_STOCK_PHRASES};
use crate::extractor::{DEFAULT_CART_LABELS, DEFAULT_NOTIFY_LABELS};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Sent as `Referer` unless configured otherwise.
pub const DEFAULT_REFERER: &str = "https://www.google.com/";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub fetcher: FetcherConfig,
    pub detection: DetectionConfig,
    pub notifications: NotificationsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FetcherConfig {
    pub user_agent: String,
    pub referer: Option<String>,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_base_delay_ms: u64,
}

/// Phrase tables feeding the extractor (control labels) and the classifier (page text).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionConfig {
    pub notify_labels: Vec<String>,
    pub cart_labels: Vec<String>,
    pub out_of_stock_phrases: Vec<String>,
    pub in_stock_phrases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationsConfig {
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SmtpConfig {
    pub enabled: bool,
    pub sender: Option<String>,
    pub password: Option<String>,
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub directory: Option<String>,
    pub file_prefix: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            fetcher: FetcherConfig::default(),
            detection: DetectionConfig::default(),
            notifications: NotificationsConfig {
                smtp: SmtpConfig::default(),
            },
            logging: LoggingConfig {
                directory: None,
                file_prefix: "stock-watcher.log".to_string(),
            },
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "/tmp/stock_monitor_state.json".to_string(),
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: Some(DEFAULT_REFERER.to_string()),
            timeout_secs: 20,
            max_attempts: 3,
            retry_base_delay_ms: 5000,
        }
    }
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        let owned = |phrases: &[&str]| phrases.iter().map(|p| p.to_string()).collect();
        Self {
            notify_labels: owned(DEFAULT_NOTIFY_LABELS),
            cart_labels: owned(DEFAULT_CART_LABELS),
            out_of_stock_phrases: owned(DEFAULT_OUT_OF_STOCK_PHRASES),
            in_stock_phrases: owned(DEFAULT_IN_STOCK_PHRASES),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sender: None,
            password: None,
            host: "smtp.gmail.com".to_string(),
            port: 587,
            timeout_secs: 30,
        }
    }
}

impl SmtpConfig {
    /// Sender and credential present and the channel switched on.
    pub fn is_complete(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        self.enabled && present(&self.sender) && present(&self.password) && !self.host.is_empty()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Pick up a .env file if one is lying around; absence is fine
        dotenvy::dotenv().ok();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with built-in defaults
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::with_name("config/default").required(false))
            // Add environment-specific config
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix "STOCK_WATCHER__"
            .add_source(Environment::with_prefix("STOCK_WATCHER").separator("__"))
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.path.trim().is_empty() {
            return Err(ConfigError::Message("Store path must not be empty".into()));
        }

        // Validate fetcher configuration
        if self.fetcher.timeout_secs == 0 {
            return Err(ConfigError::Message("Fetcher timeout_secs must be greater than 0".into()));
        }

        if self.fetcher.max_attempts == 0 {
            return Err(ConfigError::Message("Fetcher max_attempts must be greater than 0".into()));
        }

        if self.fetcher.user_agent.trim().is_empty() {
            return Err(ConfigError::Message("Fetcher user_agent must not be empty".into()));
        }

        // Validate phrase tables
        let tables = [
            ("notify_labels", &self.detection.notify_labels),
            ("cart_labels", &self.detection.cart_labels),
            ("out_of_stock_phrases", &self.detection.out_of_stock_phrases),
            ("in_stock_phrases", &self.detection.in_stock_phrases),
        ];
        for (name, phrases) in tables {
            if phrases.iter().all(|p| p.trim().is_empty()) {
                return Err(ConfigError::Message(format!("Detection {} must contain at least one phrase", name)));
            }
        }

        // Validate SMTP configuration
        if self.notifications.smtp.port == 0 {
            return Err(ConfigError::Message("SMTP port must be greater than 0".into()));
        }

        Ok(())
    }
}
