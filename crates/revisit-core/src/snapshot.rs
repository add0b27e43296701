//! Snapshot persistence.
//!
//! The last reconciled [`FileTree`] is the baseline for the next diff. It is
//! replaced wholesale after every successful reconciliation and never patched.

use crate::tree::FileTree;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Snapshot I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Storage for the baseline snapshot.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// The stored snapshot, or `None` when there is no usable one. A corrupt
    /// snapshot reads as `None` so the caller falls back to a full bootstrap.
    async fn load(&self) -> SnapshotResult<Option<FileTree>>;

    /// Replace the stored snapshot.
    async fn save(&self, tree: &FileTree) -> SnapshotResult<()>;
}

#[async_trait]
impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    async fn load(&self) -> SnapshotResult<Option<FileTree>> {
        (**self).load().await
    }

    async fn save(&self, tree: &FileTree) -> SnapshotResult<()> {
        (**self).save(tree).await
    }
}

fn parse_snapshot(text: &str, origin: &str) -> Option<FileTree> {
    if text.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(text) {
        Ok(tree) => Some(tree),
        Err(e) => {
            warn!(origin, error = %e, "Snapshot is corrupt, treating as missing");
            None
        }
    }
}

/// Snapshot stored as a JSON file.
///
/// Saves write a sibling `.tmp` file and rename it over the target so a
/// crash never leaves a half-written snapshot.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl SnapshotStore for JsonSnapshotStore {
    async fn load(&self) -> SnapshotResult<Option<FileTree>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No snapshot on disk");
                return Ok(None);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let origin = self.path.display().to_string();
        Ok(parse_snapshot(&text, &origin))
    }

    async fn save(&self, tree: &FileTree) -> SnapshotResult<()> {
        let json = serde_json::to_string(tree)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.io_error(e))?;
            }
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, json)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), "Snapshot saved");
        Ok(())
    }
}

/// Snapshot held in memory as serialized text.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    raw: Mutex<Option<String>>,
    saves: Mutex<usize>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with arbitrary stored text, e.g. a corrupt snapshot.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
            saves: Mutex::new(0),
        }
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }

    /// The stored snapshot, if any and parseable.
    pub fn current(&self) -> Option<FileTree> {
        self.raw
            .lock()
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self) -> SnapshotResult<Option<FileTree>> {
        let raw = self.raw.lock().clone();
        Ok(raw.and_then(|text| parse_snapshot(&text, "memory")))
    }

    async fn save(&self, tree: &FileTree) -> SnapshotResult<()> {
        let json = serde_json::to_string(tree)?;
        *self.raw.lock() = Some(json);
        *self.saves.lock() += 1;
        Ok(())
    }
}
