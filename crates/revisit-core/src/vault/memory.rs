//! In-memory vault.

use super::{VaultEntry, VaultFs};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::io;

/// Vault held in memory, for tests and hosts that expose a virtual file tree.
///
/// Directories are implied by file paths; empty directories can be added with
/// [`MemoryVault::with_dir`]. Paths can be marked unreadable to simulate I/O
/// failures.
#[derive(Debug, Default)]
pub struct MemoryVault {
    files: RwLock<BTreeMap<String, String>>,
    dirs: RwLock<BTreeSet<String>>,
    unreadable: RwLock<BTreeSet<String>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    #[must_use]
    pub fn with_dir(self, path: impl Into<String>) -> Self {
        self.dirs.write().insert(path.into());
        self
    }

    /// Create or overwrite a file.
    pub fn insert(&self, path: impl Into<String>, content: impl Into<String>) {
        self.files.write().insert(path.into(), content.into());
    }

    pub fn remove(&self, path: &str) -> bool {
        self.files.write().remove(path).is_some()
    }

    /// Remove a directory and everything below it.
    pub fn remove_dir(&self, dir: &str) {
        let prefix = format!("{}/", dir);
        self.files.write().retain(|path, _| !path.starts_with(&prefix));
        self.dirs
            .write()
            .retain(|path| path != dir && !path.starts_with(&prefix));
    }

    /// Make reads of a file, or listings of a directory, fail.
    pub fn set_unreadable(&self, path: impl Into<String>) {
        self.unreadable.write().insert(path.into());
    }

    pub fn set_readable(&self, path: &str) {
        self.unreadable.write().remove(path);
    }

    fn check_readable(&self, path: &str) -> io::Result<()> {
        if self.unreadable.read().contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("unreadable: {}", path),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl VaultFs for MemoryVault {
    async fn list_entries(&self, dir: &str) -> io::Result<Vec<VaultEntry>> {
        self.check_readable(dir)?;

        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        };

        let mut children: BTreeMap<String, bool> = BTreeMap::new();
        let files = self.files.read();
        let dirs = self.dirs.read();

        let all_paths = files
            .keys()
            .map(|p| (p.as_str(), false))
            .chain(dirs.iter().map(|p| (p.as_str(), true)));

        for (path, explicit_dir) in all_paths {
            let Some(rest) = path.strip_prefix(prefix.as_str()) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            match rest.split_once('/') {
                Some((child, _)) => {
                    children.insert(child.to_string(), true);
                }
                None => {
                    let is_dir = children.get(rest).copied().unwrap_or(false) || explicit_dir;
                    children.insert(rest.to_string(), is_dir);
                }
            }
        }

        let exists = dir.is_empty() || !children.is_empty() || dirs.contains(dir);
        if !exists {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such directory: {}", dir),
            ));
        }

        Ok(children
            .into_iter()
            .map(|(name, is_dir)| {
                if is_dir {
                    VaultEntry::directory(name)
                } else {
                    VaultEntry::file(name)
                }
            })
            .collect())
    }

    async fn read_to_string(&self, path: &str) -> io::Result<String> {
        self.check_readable(path)?;
        self.files.read().get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such file: {}", path))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_directories_are_implied_by_paths() {
        let vault = MemoryVault::new()
            .with_file("a.md", "")
            .with_file("dir/b.md", "")
            .with_file("dir/sub/c.md", "")
            .with_dir("empty");

        let root = vault.list_entries("").await.unwrap();
        assert_eq!(
            root,
            vec![
                VaultEntry::file("a.md"),
                VaultEntry::directory("dir"),
                VaultEntry::directory("empty"),
            ]
        );

        let dir = vault.list_entries("dir").await.unwrap();
        assert_eq!(
            dir,
            vec![VaultEntry::file("b.md"), VaultEntry::directory("sub")]
        );
        assert!(vault.list_entries("empty").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_paths_are_not_found() {
        let vault = MemoryVault::new().with_file("a.md", "");
        assert_eq!(
            vault.list_entries("nope").await.unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
        assert_eq!(
            vault.read_to_string("b.md").await.unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_unreadable_paths_fail() {
        let vault = MemoryVault::new().with_file("dir/a.md", "x");
        vault.set_unreadable("dir/a.md");
        vault.set_unreadable("dir");

        assert!(vault.read_to_string("dir/a.md").await.is_err());
        assert!(vault.list_entries("dir").await.is_err());

        vault.set_readable("dir/a.md");
        assert_eq!(vault.read_to_string("dir/a.md").await.unwrap(), "x");
    }

    #[tokio::test]
    async fn test_remove_dir_drops_descendants() {
        let vault = MemoryVault::new()
            .with_file("keep.md", "")
            .with_file("dir/a.md", "")
            .with_file("dir/sub/b.md", "");

        vault.remove_dir("dir");
        assert_eq!(
            vault.list_entries("").await.unwrap(),
            vec![VaultEntry::file("keep.md")]
        );
    }
}
