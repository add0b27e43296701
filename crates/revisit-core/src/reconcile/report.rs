use crate::tree::TreeDiff;
use serde::{Deserialize, Serialize};

/// Which path a run took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    /// No usable snapshot existed; the store was populated from the full tree.
    Bootstrap,
    /// Changes since the snapshot were applied.
    Incremental,
    /// Nothing changed; neither the store nor the snapshot was touched.
    Unchanged,
}

/// A file that could not be turned into a note during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Outcome of one [`Reconciler::run`](super::Reconciler::run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub mode: ReconcileMode,
    /// On bootstrap, `added` lists every file of the tree and `removed` the
    /// stale store entries that were pruned.
    pub diff: TreeDiff,
    pub notes_added: usize,
    /// Existing notes whose tags were brought up to date during bootstrap.
    pub notes_updated: usize,
    pub notes_removed: usize,
    pub tags_added: usize,
    pub tags_removed: usize,
    pub skipped: Vec<SkippedFile>,
}

impl ReconcileReport {
    pub(crate) fn new(mode: ReconcileMode, diff: TreeDiff) -> Self {
        Self {
            mode,
            diff,
            notes_added: 0,
            notes_updated: 0,
            notes_removed: 0,
            tags_added: 0,
            tags_removed: 0,
            skipped: Vec::new(),
        }
    }

    /// Whether the run wrote anything to the store.
    pub fn mutated_store(&self) -> bool {
        self.notes_added + self.notes_updated + self.notes_removed + self.tags_added
            + self.tags_removed
            > 0
    }
}

/// Outcome of [`Reconciler::refresh_note`](super::Reconciler::refresh_note).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Not a note file (wrong extension or hidden path).
    Ignored,
    /// The file could not be read.
    Skipped(String),
    /// The note was unknown and has been inserted.
    Inserted,
    /// Tags are unchanged.
    Unchanged,
    /// Tags changed.
    Updated {
        added: Vec<String>,
        dropped: Vec<String>,
    },
}
