//! Snapshot differencing.

use super::{join_path, FileTree};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// File-level changes between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl TreeDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Compare `old` against `new`.
///
/// Both lists hold vault-relative file paths, never directories: a directory
/// that appears or disappears is expanded into the files beneath it. An entry
/// that changed between file and directory is reported as its old files
/// removed and its new files added.
pub fn diff(old: &FileTree, new: &FileTree) -> TreeDiff {
    let mut out = TreeDiff::default();
    walk("", old, new, &mut out);
    out.added.sort();
    out.removed.sort();
    out
}

fn walk(prefix: &str, old: &FileTree, new: &FileTree, out: &mut TreeDiff) {
    for (name, new_entry) in new.entries() {
        let path = join_path(prefix, name);
        match (old.get(name), new_entry) {
            (None, entry) => leaves(&path, entry, &mut out.added),
            (Some(None), None) => {}
            (Some(Some(old_dir)), Some(new_dir)) => walk(&path, old_dir, new_dir, out),
            (Some(old_entry), new_entry) => {
                warn!(path = %path, "Entry changed between file and directory");
                leaves(&path, old_entry.as_ref(), &mut out.removed);
                leaves(&path, new_entry, &mut out.added);
            }
        }
    }

    for (name, old_entry) in old.entries() {
        if new.get(name).is_none() {
            leaves(&join_path(prefix, name), old_entry, &mut out.removed);
        }
    }
}

fn leaves(path: &str, entry: Option<&FileTree>, out: &mut Vec<String>) {
    match entry {
        None => out.push(path.to_string()),
        Some(tree) => tree.collect_files(path, out),
    }
}
