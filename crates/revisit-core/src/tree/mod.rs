//! Vault tree snapshots.
//!
//! A [`FileTree`] maps each entry name to `None` (a file) or a nested tree
//! (a directory). It serializes to plain nested JSON objects:
//!
//! ```json
//! {"a.md": null, "projects": {"plan.md": null}}
//! ```

mod builder;
mod diff;

pub use builder::{TreeBuilder, TreeError, TreeResult};
pub use diff::{diff, TreeDiff};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Recursive name to subtree-or-leaf mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileTree {
    entries: BTreeMap<String, Option<FileTree>>,
}

impl FileTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_file(&mut self, name: impl Into<String>) {
        self.entries.insert(name.into(), None);
    }

    pub fn insert_dir(&mut self, name: impl Into<String>, tree: FileTree) {
        self.entries.insert(name.into(), Some(tree));
    }

    /// Entry for `name`: `Some(None)` for a file, `Some(Some(_))` for a directory.
    pub fn get(&self, name: &str) -> Option<&Option<FileTree>> {
        self.entries.get(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, Option<&FileTree>)> {
        self.entries
            .iter()
            .map(|(name, sub)| (name.as_str(), sub.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every file path in the tree, `/`-joined and sorted.
    pub fn file_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_files("", &mut out);
        out
    }

    /// Append the file paths below this tree, prefixed with `prefix`.
    pub fn collect_files(&self, prefix: &str, out: &mut Vec<String>) {
        for (name, sub) in &self.entries {
            let path = join_path(prefix, name);
            match sub {
                None => out.push(path),
                Some(tree) => tree.collect_files(&path, out),
            }
        }
    }

    /// Whether `path` names a file (not a directory) in this tree.
    pub fn contains_file(&self, path: &str) -> bool {
        let mut node = self;
        let mut parts = path.split('/').peekable();
        while let Some(part) = parts.next() {
            match (node.entries.get(part), parts.peek()) {
                (Some(None), None) => return true,
                (Some(Some(sub)), Some(_)) => node = sub,
                _ => return false,
            }
        }
        false
    }

    /// Remove the file at `path`. Directories are left in place, even when
    /// emptied. Returns whether a file was removed.
    pub fn remove_file(&mut self, path: &str) -> bool {
        match path.split_once('/') {
            None => {
                if matches!(self.entries.get(path), Some(None)) {
                    self.entries.remove(path);
                    true
                } else {
                    false
                }
            }
            Some((dir, rest)) => match self.entries.get_mut(dir) {
                Some(Some(sub)) => sub.remove_file(rest),
                _ => false,
            },
        }
    }

    /// Build a tree from `/`-joined file paths. Intermediate directories are
    /// created as needed.
    pub fn from_paths<'a, I>(paths: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut root = FileTree::new();
        for path in paths {
            root.insert_path(path);
        }
        root
    }

    fn insert_path(&mut self, path: &str) {
        match path.split_once('/') {
            None => {
                if !path.is_empty() {
                    self.insert_file(path);
                }
            }
            Some((dir, rest)) => {
                let sub = self
                    .entries
                    .entry(dir.to_string())
                    .or_insert_with(|| Some(FileTree::new()));
                if sub.is_none() {
                    *sub = Some(FileTree::new());
                }
                if let Some(tree) = sub {
                    tree.insert_path(rest);
                }
            }
        }
    }
}

/// Join a vault-relative parent path and an entry name.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}
