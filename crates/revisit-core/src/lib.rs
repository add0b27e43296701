//! Core of the revisit note review system.
//!
//! Tracks which notes exist in a vault, when each was last reviewed and which
//! tags it carries. The [`Reconciler`] keeps the [`NoteStore`] in step with
//! the file tree: it walks the vault, diffs the result against the persisted
//! snapshot and applies additions and removals, deleting tags once their last
//! referencing note is gone.
//!
//! ## Architecture
//!
//! - [`vault`]: host file access (`VaultFs`) with local and in-memory backends
//! - [`tree`]: snapshot model, tree builder and differencer
//! - [`tags`]: `Tags: [[a]] | [[b]]` header extraction
//! - [`snapshot`]: snapshot persistence
//! - [`storage`]: the note/tag store contract and an in-memory implementation
//! - [`reconcile`]: the orchestration state machine

pub mod note;
pub mod reconcile;
pub mod snapshot;
pub mod storage;
pub mod tags;
pub mod tree;
pub mod vault;

pub use note::{Note, Tag};
pub use reconcile::{
    ReconcileError, ReconcileMode, ReconcileReport, ReconcileResult, Reconciler,
    ReconcilerOptions, ReconcilerState, RefreshOutcome, SkippedFile,
};
pub use snapshot::{JsonSnapshotStore, MemorySnapshotStore, SnapshotError, SnapshotStore};
pub use storage::{InMemoryNoteStore, NoteStore, StorageError, StorageResult};
pub use tags::{extract_all_tags, extract_tags, extract_tags_within};
pub use tree::{diff, FileTree, TreeBuilder, TreeDiff, TreeError};
pub use vault::{EntryKind, LocalVault, MemoryVault, VaultEntry, VaultFs};
