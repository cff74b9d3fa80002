use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::Snapshot;
use crate::utils::error::StoreError;

/// Whole-snapshot persistence. Reads fail soft, writes fail hard.
#[async_trait]
pub trait TargetStore: Send + Sync {
    /// Unreadable or corrupt state yields an empty snapshot.
    async fn load(&self) -> Snapshot;

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

/// Pretty-printed JSON document on disk, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Option<Snapshot>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.read_error(e)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| self.read_error(e))
    }

    fn read_error(&self, err: impl std::fmt::Display) -> StoreError {
        StoreError::Read {
            path: self.path.display().to_string(),
            message: err.to_string(),
        }
    }

    fn write_error(&self, err: impl std::fmt::Display) -> StoreError {
        StoreError::Write {
            path: self.path.display().to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl TargetStore for JsonFileStore {
    async fn load(&self) -> Snapshot {
        match self.read().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!("No snapshot at {}, starting fresh", self.path.display());
                Snapshot::default()
            }
            Err(e) => {
                warn!("{}; starting from an empty snapshot", e);
                Snapshot::default()
            }
        }
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_error(e))?;
        }

        let payload = serde_json::to_vec_pretty(snapshot).map_err(|e| self.write_error(e))?;

        // Write beside the target and rename over it so readers never see a partial file
        let temp_path = self.path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        let written = match tokio::fs::write(&temp_path, payload).await {
            Ok(()) => tokio::fs::rename(&temp_path, &self.path).await,
            Err(e) => Err(e),
        };

        // Never leave a partial or orphaned temp file behind
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(self.write_error(e));
        }

        debug!("Saved {} targets to {}", snapshot.len(), self.path.display());
        Ok(())
    }
}

/// Process-local store for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: RwLock<Snapshot>,
}

impl MemoryStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
        }
    }
}

#[async_trait]
impl TargetStore for MemoryStore {
    async fn load(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        *self.snapshot.write().await = snapshot.clone();
        Ok(())
    }
}
