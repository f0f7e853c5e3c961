//! JSON-backed metadata store for upload records
//!
//! One flat JSON array on disk, rewritten in full on every append.
//! Appends are serialized through an async mutex so concurrent uploads
//! cannot lose each other's read-modify-write; reads take no lock.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::core::error::{AppError, AppResult};
use crate::storage::backend::StorageMode;

/// One successfully stored upload.
///
/// Records are created right after the backend upload call returns,
/// never mutated and never deleted. `file_name` is not guaranteed unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub file_name: String,
    pub uploader_id: i64,
    pub storage: StorageMode,
    pub url: String,
}

/// Append-only store of [`UploadRecord`]s, insertion order significant.
pub struct MetaStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl MetaStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the backing file as an empty array if it does not exist.
    /// Called once at startup; reads never auto-create.
    pub async fn init_if_absent(&self) -> AppResult<()> {
        match tokio::fs::metadata(&self.path).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if let Some(parent) = self.path.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
                tokio::fs::write(&self.path, b"[]").await?;
                log::info!("Initialized empty metadata store at {}", self.path.display());
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns all records in insertion order.
    ///
    /// A store that has never been initialized yields an empty list; a
    /// store that exists but cannot be parsed is `StoreCorrupt`.
    pub async fn list_all(&self) -> AppResult<Vec<UploadRecord>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes).map_err(|source| AppError::StoreCorrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Appends one record: reads the full array, pushes, writes it back.
    pub async fn append(&self, record: UploadRecord) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;

        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AppError::StoreNotFound(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut records: Vec<UploadRecord> =
            serde_json::from_slice(&bytes).map_err(|source| AppError::StoreCorrupt {
                path: self.path.clone(),
                source,
            })?;

        records.push(record);

        let serialized = serde_json::to_vec_pretty(&records)?;
        tokio::fs::write(&self.path, serialized).await?;
        Ok(())
    }
}
