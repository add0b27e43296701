//! Vault to store reconciliation.
//!
//! The [`Reconciler`] brings the note store in line with the files in the
//! vault. The first run (no snapshot) bootstraps every note; later runs diff
//! the current tree against the stored snapshot and apply only the changes.
//! The snapshot is written last, after every store mutation succeeded, so an
//! interrupted run is repeated in full next time.

mod reconciler;
mod report;

pub use reconciler::Reconciler;
pub use report::{ReconcileMode, ReconcileReport, RefreshOutcome, SkippedFile};

use crate::snapshot::SnapshotError;
use crate::storage::StorageError;
use crate::tree::TreeError;
use revisit_config::RevisitConfig;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Failed to build vault tree: {0}")]
    Tree(#[from] TreeError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Store error: {0}")]
    Storage(#[from] StorageError),
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Lifecycle of a [`Reconciler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerState {
    /// No run has completed yet.
    Uninitialized,
    /// First run in progress, populating the store from scratch.
    Bootstrapping,
    /// Idle with the store in step with the last snapshot.
    Ready,
    /// Incremental run in progress.
    Reconciling,
}

/// Tuning for a [`Reconciler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerOptions {
    /// Extensions (without dot, case-insensitive) of files that become notes.
    pub note_extensions: Vec<String>,
    /// Leading lines searched for the tags header.
    pub tag_scan_lines: usize,
    /// Maximum directory depth walked.
    pub max_depth: usize,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self::from(&RevisitConfig::default())
    }
}

impl From<&RevisitConfig> for ReconcilerOptions {
    fn from(config: &RevisitConfig) -> Self {
        Self {
            note_extensions: config.vault.note_extensions.clone(),
            tag_scan_lines: config.review.tag_scan_lines,
            max_depth: config.vault.max_depth,
        }
    }
}

impl ReconcilerOptions {
    /// Whether `path` is a note file: a tracked extension and no hidden
    /// path component.
    pub fn is_note(&self, path: &str) -> bool {
        if path.split('/').any(|part| part.is_empty() || part.starts_with('.')) {
            return false;
        }
        let Some((stem, ext)) = path.rsplit('/').next().and_then(|n| n.rsplit_once('.')) else {
            return false;
        };
        !stem.is_empty()
            && self
                .note_extensions
                .iter()
                .any(|tracked| tracked.eq_ignore_ascii_case(ext))
    }
}
