use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, PRAGMA, REFERER, USER_AGENT,
};
use std::time::Duration;
use tokio_retry::RetryIf;
use tracing::{debug, warn};

use crate::config::FetcherConfig;
use crate::utils::error::{AppError, FetchError};

/// Source of raw page markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Long-lived HTTP client with a fixed browser-like identity. Forbidden and
/// Too Many Requests responses are retried with a linearly growing pause; any
/// other non-success status fails straight away.
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_attempts: u32,
    retry_base_delay: Duration,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .default_headers(identity_headers(config)?)
            .build()?;

        Ok(Self {
            client,
            timeout: config.timeout(),
            max_attempts: config.max_attempts.max(1),
            retry_base_delay: config.retry_base_delay(),
        })
    }

    /// Pauses between attempts: `base × 1`, `base × 2`, ...
    fn backoff(&self) -> impl Iterator<Item = Duration> {
        let base = self.retry_base_delay;
        (1..self.max_attempts).map(move |attempt| base * attempt)
    }

    async fn attempt(&self, url: &str) -> Result<String, FetchError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| transport_error(url, e))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        RetryIf::spawn(
            self.backoff(),
            || self.attempt(url),
            |err: &FetchError| {
                let retry = err.is_blocked();
                if retry {
                    warn!("{} answered {:?}, backing off before retrying", url, err.status());
                }
                retry
            },
        )
        .await
    }
}

fn identity_headers(config: &FetcherConfig) -> Result<HeaderMap, AppError> {
    let value = |raw: &str| {
        HeaderValue::from_str(raw).map_err(|e| AppError::Validation(format!("Invalid header value '{}': {}", raw, e)))
    };

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, value(&config.user_agent)?);
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));
    if let Some(referer) = config.referer.as_deref() {
        headers.insert(REFERER, value(referer)?);
    }

    Ok(headers)
}

fn transport_error(url: &str, err: reqwest::Error) -> FetchError {
    FetchError::Transport {
        url: url.to_string(),
        message: err.to_string(),
    }
}
