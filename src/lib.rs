pub mod classifier;
pub mod config;
pub mod extractor;
pub mod fetcher;
pub mod fingerprint;
pub mod models;
pub mod plugins;
pub mod store;
pub mod target_manager;
pub mod utils;

// Re-export commonly used types
pub use classifier::Classifier;
pub use config::AppConfig;
pub use extractor::Extractor;
pub use fetcher::{HttpFetcher, PageFetcher};
pub use models::{LogEntry, Snapshot, Status, Target};
pub use store::{JsonFileStore, MemoryStore, TargetStore};
pub use target_manager::{CheckOutcome, TargetManager};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
