//! Local disk vault backed by `tokio::fs`.

use super::{VaultEntry, VaultFs};
use async_trait::async_trait;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{trace, warn};

/// Vault rooted at a directory on the local file system.
///
/// Symlinks are followed. Directory entries carry their canonical path as
/// identity so the tree builder can detect link cycles.
#[derive(Debug, Clone)]
pub struct LocalVault {
    root: PathBuf,
}

impl LocalVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a vault-relative path. Rejects paths that would
    /// escape the root.
    pub fn resolve(&self, relative: &str) -> io::Result<PathBuf> {
        let relative = Path::new(relative);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path escapes vault root: {}", relative.display()),
            ));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl VaultFs for LocalVault {
    async fn list_entries(&self, dir: &str) -> io::Result<Vec<VaultEntry>> {
        let dir_path = self.resolve(dir)?;
        trace!(dir = %dir_path.display(), "Listing directory");

        let mut reader = tokio::fs::read_dir(&dir_path).await?;
        let mut entries = Vec::new();

        while let Some(entry) = reader.next_entry().await? {
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!(dir = %dir_path.display(), name = ?raw, "Skipping entry with non UTF-8 name");
                    continue;
                }
            };

            let path = entry.path();
            // Follows symlinks; a dangling link has no metadata and is skipped.
            let metadata = match tokio::fs::metadata(&path).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            if metadata.is_dir() {
                let mut dir_entry = VaultEntry::directory(name);
                dir_entry.identity = tokio::fs::canonicalize(&path).await.ok();
                entries.push(dir_entry);
            } else {
                entries.push(VaultEntry::file(name));
            }
        }

        Ok(entries)
    }

    async fn read_to_string(&self, path: &str) -> io::Result<String> {
        let full = self.resolve(path)?;
        tokio::fs::read_to_string(full).await
    }

    async fn identity(&self, dir: &str) -> Option<PathBuf> {
        let full = self.resolve(dir).ok()?;
        tokio::fs::canonicalize(full).await.ok()
    }
}
