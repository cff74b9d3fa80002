use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {resource}")]
    NotFound { resource: String },
}

/// Failure to retrieve a page. Recorded on the target, never propagated out of a check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP {status} for url ({url})")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Transport { .. } => None,
        }
    }

    /// Forbidden and Too Many Requests are the only responses worth another attempt.
    pub fn is_blocked(&self) -> bool {
        matches!(self.status(), Some(403) | Some(429))
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read snapshot {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to write snapshot {path}: {message}")]
    Write { path: String, message: String },
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("invalid address {address}: {message}")]
    Address { address: String, message: String },

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
