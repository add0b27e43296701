//! Host file access.
//!
//! The tree builder and reconciler only see the vault through [`VaultFs`],
//! addressed with vault-relative `/`-joined paths (`""` is the root). This
//! keeps the core independent of whether files come from the local disk or a
//! host-managed virtual file system.

mod local;
mod memory;

pub use local::LocalVault;
pub use memory::MemoryVault;

use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Canonical location of a directory, used to detect symlink cycles.
    pub identity: Option<PathBuf>,
}

impl VaultEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            identity: None,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            identity: None,
        }
    }

    #[must_use]
    pub fn with_identity(mut self, identity: impl Into<PathBuf>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Read access to a vault.
#[async_trait]
pub trait VaultFs: Send + Sync {
    /// List the entries of a vault-relative directory.
    async fn list_entries(&self, dir: &str) -> io::Result<Vec<VaultEntry>>;

    /// Read a vault-relative file as UTF-8 text.
    async fn read_to_string(&self, path: &str) -> io::Result<String>;

    /// Canonical identity of a vault-relative directory, if the backend has one.
    async fn identity(&self, _dir: &str) -> Option<PathBuf> {
        None
    }
}

#[async_trait]
impl<T: VaultFs + ?Sized> VaultFs for Arc<T> {
    async fn list_entries(&self, dir: &str) -> io::Result<Vec<VaultEntry>> {
        (**self).list_entries(dir).await
    }

    async fn read_to_string(&self, path: &str) -> io::Result<String> {
        (**self).read_to_string(path).await
    }

    async fn identity(&self, dir: &str) -> Option<PathBuf> {
        (**self).identity(dir).await
    }
}
