//! Builds a [`FileTree`] by walking a vault.

use super::{join_path, FileTree};
use crate::vault::VaultFs;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Errors raised while walking the vault.
#[derive(Error, Debug)]
pub enum TreeError {
    /// A directory could not be listed. The whole walk is abandoned so a
    /// transient failure is never mistaken for deleted files.
    #[error("Failed to list directory '{path}': {source}")]
    List {
        path: String,
        #[source]
        source: io::Error,
    },
}

pub type TreeResult<T> = Result<T, TreeError>;

type BuildFuture<'a> = Pin<Box<dyn Future<Output = TreeResult<FileTree>> + Send + 'a>>;

/// Depth-first vault walker.
///
/// Entries whose name starts with `.` are skipped, as are directories deeper
/// than `max_depth` and directories that resolve to one of their own
/// ancestors (symlink cycles).
pub struct TreeBuilder<'a> {
    vault: &'a dyn VaultFs,
    max_depth: usize,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(vault: &'a dyn VaultFs, max_depth: usize) -> Self {
        Self { vault, max_depth }
    }

    /// Walk the whole vault.
    pub async fn build(&self) -> TreeResult<FileTree> {
        let mut ancestors = Vec::new();
        if let Some(root) = self.vault.identity("").await {
            ancestors.push(root);
        }

        let tree = self.build_dir(String::new(), 0, &mut ancestors).await?;
        debug!(files = tree.file_paths().len(), "Built vault tree");
        Ok(tree)
    }

    fn build_dir<'b>(
        &'b self,
        dir: String,
        depth: usize,
        ancestors: &'b mut Vec<PathBuf>,
    ) -> BuildFuture<'b> {
        Box::pin(async move {
            trace!(dir = %dir, depth, "Walking directory");

            let mut entries = self
                .vault
                .list_entries(&dir)
                .await
                .map_err(|source| TreeError::List {
                    path: dir.clone(),
                    source,
                })?;
            entries.sort_by(|a, b| a.name.cmp(&b.name));

            let mut tree = FileTree::new();
            for entry in entries {
                if entry.name.starts_with('.') {
                    continue;
                }

                let path = join_path(&dir, &entry.name);
                if !entry.is_dir() {
                    tree.insert_file(entry.name);
                    continue;
                }

                if depth + 1 > self.max_depth {
                    warn!(path = %path, max_depth = self.max_depth, "Skipping directory beyond maximum depth");
                    continue;
                }

                if let Some(identity) = &entry.identity {
                    if ancestors.contains(identity) {
                        warn!(path = %path, target = %identity.display(), "Skipping directory that links back to an ancestor");
                        continue;
                    }
                }

                let pushed = entry.identity.is_some();
                if let Some(identity) = entry.identity {
                    ancestors.push(identity);
                }
                let subtree = self.build_dir(path, depth + 1, ancestors).await;
                if pushed {
                    ancestors.pop();
                }

                tree.insert_dir(entry.name, subtree?);
            }

            Ok(tree)
        })
    }
}
