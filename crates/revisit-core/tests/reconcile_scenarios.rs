//! End-to-end reconciliation scenarios over a real directory tree.
//!
//! Each test builds a vault in a temp directory, reconciles it into an
//! in-memory store and checks the store and snapshot afterwards.

use async_trait::async_trait;
use revisit_config::RevisitConfig;
use revisit_core::storage::{InMemoryNoteStore, NoteStore, StorageError, StorageResult};
use revisit_core::{
    JsonSnapshotStore, Note, ReconcileError, ReconcileMode, Reconciler,
    ReconcilerState, SnapshotStore, Tag,
};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

fn reconciler_for(root: &Path, store: Arc<dyn NoteStore>) -> Reconciler {
    Reconciler::for_config(&RevisitConfig::for_vault(root), store)
}

async fn tags(store: &dyn NoteStore) -> Vec<String> {
    store
        .all_tags()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect()
}

async fn locations(store: &dyn NoteStore) -> Vec<String> {
    store
        .all_notes()
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.location)
        .collect()
}

#[tokio::test]
async fn test_bootstrap_two_untagged_notes() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "a.md", "first note");
    write(vault.path(), "b.md", "second note");

    let store = Arc::new(InMemoryNoteStore::new());
    let reconciler = reconciler_for(vault.path(), store.clone());

    let report = reconciler.run().await.unwrap();

    assert_eq!(report.mode, ReconcileMode::Bootstrap);
    assert_eq!(locations(store.as_ref()).await, vec!["a.md", "b.md"]);
    assert!(tags(store.as_ref()).await.is_empty());
    assert!(vault.path().join(".revisit/snapshot.json").exists());
}

#[tokio::test]
async fn test_deleted_file_is_removed_with_its_tags() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "a.md", "Tags: [[OnlyA]]\n");
    write(vault.path(), "b.md", "plain");

    let store = Arc::new(InMemoryNoteStore::new());
    let reconciler = reconciler_for(vault.path(), store.clone());
    reconciler.run().await.unwrap();
    assert_eq!(tags(store.as_ref()).await, vec!["OnlyA"]);

    std::fs::remove_file(vault.path().join("a.md")).unwrap();
    let report = reconciler.run().await.unwrap();

    assert_eq!(report.mode, ReconcileMode::Incremental);
    assert_eq!(report.diff.removed, vec!["a.md"]);
    assert!(report.diff.added.is_empty());
    assert_eq!(locations(store.as_ref()).await, vec!["b.md"]);
    assert!(tags(store.as_ref()).await.is_empty());
}

#[tokio::test]
async fn test_shared_tag_reference_counting() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "b.md", "Tags: [[Shared]]\nbody");

    let store = Arc::new(InMemoryNoteStore::new());
    let reconciler = reconciler_for(vault.path(), store.clone());
    reconciler.run().await.unwrap();

    write(vault.path(), "c.md", "Tags: [[Shared]]\nbody");
    reconciler.run().await.unwrap();
    assert_eq!(tags(store.as_ref()).await, vec!["Shared"]);

    std::fs::remove_file(vault.path().join("c.md")).unwrap();
    reconciler.run().await.unwrap();
    assert_eq!(tags(store.as_ref()).await, vec!["Shared"]);
    assert_eq!(store.count_notes_by_tag("Shared").await.unwrap(), 1);
}

#[tokio::test]
async fn test_every_tag_is_referenced_after_churn() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "one.md", "Tags: [[a]] | [[b]]");
    write(vault.path(), "dir/two.md", "Tags: [[b]] | [[c]]");
    write(vault.path(), "dir/deep/three.md", "Tags: [[c]]");

    let store = Arc::new(InMemoryNoteStore::new());
    let reconciler = reconciler_for(vault.path(), store.clone());
    reconciler.run().await.unwrap();

    std::fs::remove_dir_all(vault.path().join("dir")).unwrap();
    write(vault.path(), "four.md", "Tags: [[d]]");
    let report = reconciler.run().await.unwrap();

    assert_eq!(report.diff.added, vec!["four.md"]);
    assert_eq!(report.diff.removed, vec!["dir/deep/three.md", "dir/two.md"]);

    for tag in tags(store.as_ref()).await {
        assert!(
            store.count_notes_by_tag(&tag).await.unwrap() >= 1,
            "tag {} has no referencing note",
            tag
        );
    }
    assert_eq!(tags(store.as_ref()).await, vec!["a", "b", "d"]);
}

#[tokio::test]
async fn test_repeated_runs_are_idempotent() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "a.md", "Tags: [[x]]");
    write(vault.path(), "sub/b.md", "");

    let store = Arc::new(InMemoryNoteStore::new());
    let reconciler = reconciler_for(vault.path(), store.clone());
    reconciler.run().await.unwrap();

    let snapshot = vault.path().join(".revisit/snapshot.json");
    let before = std::fs::metadata(&snapshot).unwrap().modified().unwrap();

    let report = reconciler.run().await.unwrap();
    assert_eq!(report.mode, ReconcileMode::Unchanged);
    assert!(!report.mutated_store());
    assert_eq!(
        std::fs::metadata(&snapshot).unwrap().modified().unwrap(),
        before
    );
}

#[tokio::test]
async fn test_state_file_is_not_tracked() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "a.md", "");

    let store = Arc::new(InMemoryNoteStore::new());
    let reconciler = reconciler_for(vault.path(), store.clone());
    reconciler.run().await.unwrap();

    // The snapshot written under .revisit must not show up as a change.
    let report = reconciler.run().await.unwrap();
    assert_eq!(report.mode, ReconcileMode::Unchanged);
    assert_eq!(locations(store.as_ref()).await, vec!["a.md"]);
}

#[tokio::test]
async fn test_corrupt_snapshot_falls_back_to_bootstrap() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "a.md", "");
    write(vault.path(), ".revisit/snapshot.json", "{\"a.md\": nu");

    let store = Arc::new(InMemoryNoteStore::new());
    let reconciler = reconciler_for(vault.path(), store.clone());

    let report = reconciler.run().await.unwrap();
    assert_eq!(report.mode, ReconcileMode::Bootstrap);
    assert_eq!(locations(store.as_ref()).await, vec!["a.md"]);

    let snapshots = JsonSnapshotStore::new(vault.path().join(".revisit/snapshot.json"));
    assert!(snapshots.load().await.unwrap().is_some());
}

#[tokio::test]
async fn test_invalid_utf8_note_is_skipped() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "good.md", "Tags: [[ok]]");
    std::fs::write(vault.path().join("bad.md"), [0xff, 0xfe, 0x00]).unwrap();

    let store = Arc::new(InMemoryNoteStore::new());
    let reconciler = reconciler_for(vault.path(), store.clone());

    let report = reconciler.run().await.unwrap();
    assert_eq!(report.notes_added, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].path, "bad.md");

    // Fixed on disk: picked up by the next run without any file event.
    write(vault.path(), "bad.md", "Tags: [[fixed]]");
    let report = reconciler.run().await.unwrap();
    assert_eq!(report.mode, ReconcileMode::Incremental);
    assert_eq!(report.diff.added, vec!["bad.md"]);
    assert_eq!(report.notes_added, 1);
    assert_eq!(tags(store.as_ref()).await, vec!["fixed", "ok"]);
}

/// Store that fails every tag deletion while `fail` is set.
struct FailingTagRemoval {
    inner: InMemoryNoteStore,
    fail: AtomicBool,
}

#[async_trait]
impl NoteStore for FailingTagRemoval {
    async fn put_notes(&self, notes: Vec<Note>) -> StorageResult<usize> {
        self.inner.put_notes(notes).await
    }
    async fn put_tags(&self, tags: Vec<Tag>) -> StorageResult<usize> {
        self.inner.put_tags(tags).await
    }
    async fn get_note(&self, location: &str) -> StorageResult<Option<Note>> {
        self.inner.get_note(location).await
    }
    async fn notes_by_tag(&self, tag: &str) -> StorageResult<Vec<Note>> {
        self.inner.notes_by_tag(tag).await
    }
    async fn remove_note(&self, location: &str) -> StorageResult<bool> {
        self.inner.remove_note(location).await
    }
    async fn remove_tag(&self, title: &str) -> StorageResult<bool> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("tag table locked".into()));
        }
        self.inner.remove_tag(title).await
    }
    async fn all_notes(&self) -> StorageResult<Vec<Note>> {
        self.inner.all_notes().await
    }
    async fn all_tags(&self) -> StorageResult<Vec<Tag>> {
        self.inner.all_tags().await
    }
    async fn bookmarked_notes(&self) -> StorageResult<Vec<Note>> {
        self.inner.bookmarked_notes().await
    }
    async fn unreviewed_notes(&self, days: u32, limit: usize) -> StorageResult<Vec<Note>> {
        self.inner.unreviewed_notes(days, limit).await
    }
    async fn recently_reviewed(&self, days: u32, limit: usize) -> StorageResult<Vec<Note>> {
        self.inner.recently_reviewed(days, limit).await
    }
    async fn mark_reviewed(&self, location: &str) -> StorageResult<bool> {
        self.inner.mark_reviewed(location).await
    }
    async fn toggle_bookmark(&self, location: &str) -> StorageResult<Option<bool>> {
        self.inner.toggle_bookmark(location).await
    }
    async fn upsert_note(&self, note: Note) -> StorageResult<()> {
        self.inner.upsert_note(note).await
    }
}

#[tokio::test]
async fn test_store_failure_keeps_old_snapshot_for_retry() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "a.md", "Tags: [[Solo]]");

    let store = Arc::new(FailingTagRemoval {
        inner: InMemoryNoteStore::new(),
        fail: AtomicBool::new(false),
    });
    let reconciler = reconciler_for(vault.path(), store.clone());
    reconciler.run().await.unwrap();

    std::fs::remove_file(vault.path().join("a.md")).unwrap();
    store.fail.store(true, Ordering::SeqCst);

    let err = reconciler.run().await.unwrap_err();
    assert!(matches!(err, ReconcileError::Storage(_)));
    assert_eq!(reconciler.state(), ReconcilerState::Ready);

    // The snapshot still lists a.md, so the removal is retried.
    store.fail.store(false, Ordering::SeqCst);
    let report = reconciler.run().await.unwrap();
    assert_eq!(report.diff.removed, vec!["a.md"]);
    assert!(store.get_note("a.md").await.unwrap().is_none());
    assert!(store.all_tags().await.unwrap().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlink_loop_does_not_recurse_forever() {
    let vault = TempDir::new().unwrap();
    write(vault.path(), "dir/a.md", "");
    std::os::unix::fs::symlink(vault.path(), vault.path().join("dir/back")).unwrap();

    let store = Arc::new(InMemoryNoteStore::new());
    let reconciler = reconciler_for(vault.path(), store.clone());

    reconciler.run().await.unwrap();
    assert_eq!(locations(store.as_ref()).await, vec!["dir/a.md"]);
}
