use std::collections::BTreeSet;
use std::io;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use revisit_config::RevisitConfig;
use tracing::{debug, info, warn};

use super::report::{ReconcileMode, ReconcileReport, RefreshOutcome, SkippedFile};
use super::{ReconcileResult, ReconcilerOptions, ReconcilerState};
use crate::note::{review_epoch, Note, Tag};
use crate::snapshot::{JsonSnapshotStore, SnapshotStore};
use crate::storage::{NoteStore, StorageResult};
use crate::tags::extract_tags_within;
use crate::tree::{diff, FileTree, TreeBuilder, TreeDiff};
use crate::vault::{LocalVault, VaultFs};

/// Keeps a [`NoteStore`] in step with the files of a vault.
///
/// Runs and single-note refreshes are serialised; concurrent callers wait
/// for the one in progress.
pub struct Reconciler {
    vault: Arc<dyn VaultFs>,
    store: Arc<dyn NoteStore>,
    snapshots: Arc<dyn SnapshotStore>,
    options: ReconcilerOptions,
    state: Mutex<ReconcilerState>,
    run_lock: tokio::sync::Mutex<()>,
}

impl Reconciler {
    pub fn new(
        vault: Arc<dyn VaultFs>,
        store: Arc<dyn NoteStore>,
        snapshots: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            vault,
            store,
            snapshots,
            options: ReconcilerOptions::default(),
            state: Mutex::new(ReconcilerState::Uninitialized),
            run_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Reconciler over the local vault and snapshot file named by `config`.
    pub fn for_config(config: &RevisitConfig, store: Arc<dyn NoteStore>) -> Self {
        Self::new(
            Arc::new(LocalVault::new(&config.vault.root)),
            store,
            Arc::new(JsonSnapshotStore::new(config.snapshot_path())),
        )
        .with_options(ReconcilerOptions::from(config))
    }

    #[must_use]
    pub fn with_options(mut self, options: ReconcilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ReconcilerOptions {
        &self.options
    }

    pub fn state(&self) -> ReconcilerState {
        *self.state.lock()
    }

    pub fn store(&self) -> &Arc<dyn NoteStore> {
        &self.store
    }

    fn set_state(&self, state: ReconcilerState) {
        *self.state.lock() = state;
    }

    /// Reconcile the store with the current vault tree.
    ///
    /// On failure nothing is persisted to the snapshot, so the same changes
    /// are picked up again by the next run.
    pub async fn run(&self) -> ReconcileResult<ReconcileReport> {
        let _guard = self.run_lock.lock().await;
        let resting = self.state();

        let result = self.run_locked().await;
        match &result {
            Ok(report) => {
                self.set_state(ReconcilerState::Ready);
                info!(
                    mode = ?report.mode,
                    added = report.diff.added.len(),
                    removed = report.diff.removed.len(),
                    notes_added = report.notes_added,
                    notes_removed = report.notes_removed,
                    tags_added = report.tags_added,
                    tags_removed = report.tags_removed,
                    skipped = report.skipped.len(),
                    "Reconciliation finished"
                );
            }
            Err(e) => {
                self.set_state(resting);
                warn!(error = %e, "Reconciliation failed, snapshot left unchanged");
            }
        }
        result
    }

    async fn run_locked(&self) -> ReconcileResult<ReconcileReport> {
        let tree = TreeBuilder::new(self.vault.as_ref(), self.options.max_depth)
            .build()
            .await?;

        match self.snapshots.load().await? {
            None => {
                self.set_state(ReconcilerState::Bootstrapping);
                self.bootstrap(tree).await
            }
            Some(previous) => {
                let changes = diff(&previous, &tree);
                if changes.is_empty() {
                    debug!("Vault unchanged since last snapshot");
                    return Ok(ReconcileReport::new(ReconcileMode::Unchanged, changes));
                }
                self.set_state(ReconcilerState::Reconciling);
                self.apply(tree, changes).await
            }
        }
    }

    async fn bootstrap(&self, mut tree: FileTree) -> ReconcileResult<ReconcileReport> {
        let files = tree.file_paths();
        info!(files = files.len(), "No snapshot found, bootstrapping store");

        let paths: Vec<&str> = files
            .iter()
            .map(String::as_str)
            .filter(|p| self.options.is_note(p))
            .collect();
        let (notes, skipped) = self.read_notes(&paths, review_epoch()).await;

        let mut report = ReconcileReport::new(ReconcileMode::Bootstrap, TreeDiff::default());
        report.skipped = skipped;
        self.store_notes(notes, &mut report).await?;

        // Notes left over from an earlier store whose files are gone.
        let mut pruned = Vec::new();
        for note in self.store.all_notes().await? {
            if tree.contains_file(&note.location) {
                continue;
            }
            if let Some(tags_removed) = self.remove_note(&note.location).await? {
                report.notes_removed += 1;
                report.tags_removed += tags_removed;
                pruned.push(note.location);
            }
        }

        report.diff = TreeDiff {
            added: files,
            removed: pruned,
        };

        forget_skipped(&mut tree, &report);
        self.snapshots.save(&tree).await?;
        Ok(report)
    }

    async fn apply(
        &self,
        mut tree: FileTree,
        changes: TreeDiff,
    ) -> ReconcileResult<ReconcileReport> {
        info!(
            added = changes.added.len(),
            removed = changes.removed.len(),
            "Applying vault changes"
        );

        let mut report = ReconcileReport::new(ReconcileMode::Incremental, TreeDiff::default());

        // Added phase completes before any reference count is read.
        let paths: Vec<&str> = changes
            .added
            .iter()
            .map(String::as_str)
            .filter(|p| self.options.is_note(p))
            .collect();
        let (notes, skipped) = self.read_notes(&paths, Utc::now()).await;
        report.skipped = skipped;
        self.store_notes(notes, &mut report).await?;

        // Sequential so reference counts for shared tags never race.
        for location in &changes.removed {
            if let Some(tags_removed) = self.remove_note(location).await? {
                report.notes_removed += 1;
                report.tags_removed += tags_removed;
            }
        }

        report.diff = changes;
        forget_skipped(&mut tree, &report);
        self.snapshots.save(&tree).await?;
        Ok(report)
    }

    /// Insert notes the store does not know yet and retag known notes whose
    /// tags differ. Known notes keep their review state.
    ///
    /// Tags are inserted only for notes that are stored with them.
    async fn store_notes(
        &self,
        notes: Vec<Note>,
        report: &mut ReconcileReport,
    ) -> StorageResult<()> {
        let mut fresh = Vec::with_capacity(notes.len());
        let mut stale: Vec<(Note, Vec<String>)> = Vec::new();
        for note in notes {
            match self.store.get_note(&note.location).await? {
                None => fresh.push(note),
                Some(existing) if existing.tags != note.tags => stale.push((existing, note.tags)),
                Some(_) => {}
            }
        }

        let tags = tag_union(&fresh);
        report.notes_added += self.store.put_notes(fresh).await?;
        report.tags_added += self.store.put_tags(tags).await?;

        for (existing, tags) in stale {
            let (inserted, dropped) = self.retag(existing, tags).await?;
            report.tags_added += inserted;
            report.tags_removed += dropped;
            report.notes_updated += 1;
        }
        Ok(())
    }

    /// Read and parse notes one by one. Unreadable files are skipped.
    async fn read_notes(
        &self,
        paths: &[&str],
        last_reviewed: DateTime<Utc>,
    ) -> (Vec<Note>, Vec<SkippedFile>) {
        let mut notes = Vec::with_capacity(paths.len());
        let mut skipped = Vec::new();

        for path in paths {
            match self.vault.read_to_string(path).await {
                Ok(content) => {
                    let tags = extract_tags_within(&content, self.options.tag_scan_lines);
                    notes.push(
                        Note::new(*path)
                            .with_tags(tags)
                            .with_last_reviewed(last_reviewed),
                    );
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "Skipping unreadable note");
                    skipped.push(SkippedFile {
                        path: path.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        (notes, skipped)
    }

    /// Remove a note, deleting each of its tags that no other note references.
    ///
    /// Counts are read before the note is deleted, so a count of one means
    /// this note is the last reference. Returns the number of tags deleted,
    /// or `None` if the note was not in the store.
    async fn remove_note(&self, location: &str) -> StorageResult<Option<usize>> {
        let Some(note) = self.store.get_note(location).await? else {
            debug!(location, "Removed file had no note");
            return Ok(None);
        };

        let mut tags_removed = 0;
        for tag in &note.tags {
            if self.store.count_notes_by_tag(tag).await? <= 1 && self.store.remove_tag(tag).await? {
                debug!(tag = %tag, location, "Last reference dropped, tag removed");
                tags_removed += 1;
            }
        }

        self.store.remove_note(location).await?;
        Ok(Some(tags_removed))
    }

    /// Replace an existing note's tags, keeping its review state. New tags are
    /// inserted; dropped tags with no remaining references are deleted.
    ///
    /// Returns the number of tags inserted and deleted.
    async fn retag(&self, existing: Note, tags: Vec<String>) -> StorageResult<(usize, usize)> {
        let (added, dropped) = tag_changes(&existing.tags, &tags);
        let location = existing.location.clone();

        self.store.upsert_note(Note { tags, ..existing }).await?;

        let inserted = self
            .store
            .put_tags(added.iter().map(|t| Tag::new(t.as_str())).collect())
            .await?;

        let mut removed = 0;
        for tag in &dropped {
            if self.store.count_notes_by_tag(tag).await? == 0 && self.store.remove_tag(tag).await? {
                debug!(tag = %tag, location = %location, "Tag no longer referenced, removed");
                removed += 1;
            }
        }

        Ok((inserted, removed))
    }

    /// Re-read one note after its content changed.
    ///
    /// The note keeps its review state. Unknown notes are inserted. The
    /// snapshot is not touched; a later [`run`](Self::run) still sees the
    /// file as unchanged or newly added and handles it idempotently.
    pub async fn refresh_note(&self, location: &str) -> ReconcileResult<RefreshOutcome> {
        if !self.options.is_note(location) {
            return Ok(RefreshOutcome::Ignored);
        }

        let _guard = self.run_lock.lock().await;

        let content = match self.vault.read_to_string(location).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(location, "Refreshed note no longer exists");
                return Ok(RefreshOutcome::Skipped(e.to_string()));
            }
            Err(e) => {
                warn!(location, error = %e, "Cannot refresh note");
                return Ok(RefreshOutcome::Skipped(e.to_string()));
            }
        };
        let tags = extract_tags_within(&content, self.options.tag_scan_lines);

        let Some(existing) = self.store.get_note(location).await? else {
            let note = Note::new(location).with_tags(tags.clone());
            self.store.put_notes(vec![note]).await?;
            self.store
                .put_tags(tags.into_iter().map(Tag::from).collect())
                .await?;
            info!(location, "Inserted note on refresh");
            return Ok(RefreshOutcome::Inserted);
        };

        if existing.tags == tags {
            return Ok(RefreshOutcome::Unchanged);
        }

        let (added, dropped) = tag_changes(&existing.tags, &tags);
        self.retag(existing, tags).await?;
        info!(location, added = ?added, dropped = ?dropped, "Note tags refreshed");
        Ok(RefreshOutcome::Updated { added, dropped })
    }
}

fn tag_union(notes: &[Note]) -> Vec<Tag> {
    notes
        .iter()
        .flat_map(|n| n.tags.iter().cloned())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .map(Tag::from)
        .collect()
}

/// Drop skipped files from the tree about to be saved, so the next run
/// reports them as added and reads them again.
fn forget_skipped(tree: &mut FileTree, report: &ReconcileReport) {
    for skipped in &report.skipped {
        tree.remove_file(&skipped.path);
    }
}

fn tag_changes(old: &[String], new: &[String]) -> (Vec<String>, Vec<String>) {
    let added = new.iter().filter(|t| !old.contains(t)).cloned().collect();
    let dropped = old.iter().filter(|t| !new.contains(t)).cloned().collect();
    (added, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::MemorySnapshotStore;
    use crate::storage::InMemoryNoteStore;
    use crate::vault::MemoryVault;
    use crate::ReconcileError;
    use tracing_test::traced_test;

    struct Fixture {
        vault: Arc<MemoryVault>,
        store: Arc<InMemoryNoteStore>,
        snapshots: Arc<MemorySnapshotStore>,
        reconciler: Reconciler,
    }

    fn fixture(vault: MemoryVault) -> Fixture {
        fixture_with_snapshots(vault, MemorySnapshotStore::new())
    }

    fn fixture_with_snapshots(vault: MemoryVault, snapshots: MemorySnapshotStore) -> Fixture {
        let vault = Arc::new(vault);
        let store = Arc::new(InMemoryNoteStore::new());
        let snapshots = Arc::new(snapshots);
        let reconciler = Reconciler::new(vault.clone(), store.clone(), snapshots.clone());
        Fixture {
            vault,
            store,
            snapshots,
            reconciler,
        }
    }

    async fn tag_titles(store: &InMemoryNoteStore) -> Vec<String> {
        store
            .all_tags()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect()
    }

    #[tokio::test]
    async fn test_bootstrap_populates_store_and_snapshot() {
        let f = fixture(
            MemoryVault::new()
                .with_file("a.md", "Tags: [[Work]] | [[Urgent]]\nbody")
                .with_file("dir/b.md", "Tags: [[Work]]")
                .with_file("image.png", "binary"),
        );
        assert_eq!(f.reconciler.state(), ReconcilerState::Uninitialized);

        let report = f.reconciler.run().await.unwrap();

        assert_eq!(report.mode, ReconcileMode::Bootstrap);
        assert_eq!(report.notes_added, 2);
        assert_eq!(report.tags_added, 2);
        assert_eq!(f.store.note_count(), 2);
        assert_eq!(tag_titles(&f.store).await, vec!["Urgent", "Work"]);
        assert_eq!(f.snapshots.save_count(), 1);
        assert_eq!(f.reconciler.state(), ReconcilerState::Ready);

        let a = f.store.get_note("a.md").await.unwrap().unwrap();
        assert_eq!(a.last_reviewed, review_epoch());
        assert_eq!(a.tags, vec!["Work", "Urgent"]);
        assert_eq!(a.title, "a");
    }

    #[tokio::test]
    async fn test_second_run_is_a_no_op() {
        let f = fixture(MemoryVault::new().with_file("a.md", "Tags: [[x]]"));
        f.reconciler.run().await.unwrap();

        let report = f.reconciler.run().await.unwrap();
        assert_eq!(report.mode, ReconcileMode::Unchanged);
        assert!(report.diff.is_empty());
        assert!(!report.mutated_store());
        assert_eq!(f.snapshots.save_count(), 1);
    }

    #[tokio::test]
    async fn test_incremental_add_uses_current_time() {
        let f = fixture(MemoryVault::new().with_file("a.md", ""));
        f.reconciler.run().await.unwrap();

        f.vault.insert("new/c.md", "Tags: [[Fresh]]");
        let report = f.reconciler.run().await.unwrap();

        assert_eq!(report.mode, ReconcileMode::Incremental);
        assert_eq!(report.diff.added, vec!["new/c.md"]);
        assert_eq!(report.notes_added, 1);
        assert_eq!(report.tags_added, 1);

        let c = f.store.get_note("new/c.md").await.unwrap().unwrap();
        assert!(c.last_reviewed > review_epoch());
        assert_eq!(f.snapshots.save_count(), 2);
    }

    #[tokio::test]
    async fn test_shared_tag_survives_until_last_reference() {
        let f = fixture(MemoryVault::new().with_file("b.md", "Tags: [[Shared]]"));
        f.reconciler.run().await.unwrap();

        f.vault.insert("c.md", "Tags: [[Shared]] | [[OnlyC]]");
        f.reconciler.run().await.unwrap();
        assert_eq!(tag_titles(&f.store).await, vec!["OnlyC", "Shared"]);

        f.vault.remove("c.md");
        let report = f.reconciler.run().await.unwrap();
        assert_eq!(report.diff.removed, vec!["c.md"]);
        assert_eq!(report.tags_removed, 1);
        assert_eq!(tag_titles(&f.store).await, vec!["Shared"]);

        f.vault.remove("b.md");
        f.reconciler.run().await.unwrap();
        assert!(tag_titles(&f.store).await.is_empty());
        assert_eq!(f.store.note_count(), 0);
    }

    #[tokio::test]
    async fn test_removing_two_notes_sharing_a_tag() {
        let f = fixture(
            MemoryVault::new()
                .with_file("a.md", "Tags: [[Shared]]")
                .with_file("b.md", "Tags: [[Shared]]")
                .with_file("keep.md", ""),
        );
        f.reconciler.run().await.unwrap();

        f.vault.remove("a.md");
        f.vault.remove("b.md");
        let report = f.reconciler.run().await.unwrap();

        assert_eq!(report.notes_removed, 2);
        assert_eq!(report.tags_removed, 1);
        assert!(tag_titles(&f.store).await.is_empty());
    }

    #[traced_test]
    #[tokio::test]
    async fn test_unreadable_file_is_skipped_not_fatal() {
        let vault = MemoryVault::new()
            .with_file("ok.md", "Tags: [[t]]")
            .with_file("locked.md", "Tags: [[hidden]]");
        vault.set_unreadable("locked.md");
        let f = fixture(vault);

        let report = f.reconciler.run().await.unwrap();
        assert_eq!(report.notes_added, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, "locked.md");
        assert!(logs_contain("Skipping unreadable note"));
        assert_eq!(tag_titles(&f.store).await, vec!["t"]);
        assert_eq!(f.snapshots.save_count(), 1);
    }

    #[tokio::test]
    async fn test_skipped_file_is_retried_by_next_run() {
        let vault = MemoryVault::new()
            .with_file("ok.md", "Tags: [[t]]")
            .with_file("locked.md", "Tags: [[hidden]]");
        vault.set_unreadable("locked.md");
        let f = fixture(vault);

        f.reconciler.run().await.unwrap();
        let saved = f.snapshots.current().unwrap();
        assert!(saved.contains_file("ok.md"));
        assert!(!saved.contains_file("locked.md"));

        // Still unreadable: reported as added and skipped again.
        let report = f.reconciler.run().await.unwrap();
        assert_eq!(report.mode, ReconcileMode::Incremental);
        assert_eq!(report.diff.added, vec!["locked.md"]);
        assert_eq!(report.skipped.len(), 1);
        assert!(f.store.get_note("locked.md").await.unwrap().is_none());

        f.vault.set_readable("locked.md");
        let report = f.reconciler.run().await.unwrap();
        assert_eq!(report.diff.added, vec!["locked.md"]);
        assert_eq!(report.notes_added, 1);
        assert!(report.skipped.is_empty());
        assert_eq!(tag_titles(&f.store).await, vec!["hidden", "t"]);
        assert!(f.snapshots.current().unwrap().contains_file("locked.md"));

        let report = f.reconciler.run().await.unwrap();
        assert_eq!(report.mode, ReconcileMode::Unchanged);
    }

    #[tokio::test]
    async fn test_added_file_with_known_note_is_retagged() {
        let f = fixture(MemoryVault::new().with_file("a.md", ""));
        f.reconciler.run().await.unwrap();

        // A note stored for c.md before its file shows up in a run.
        f.store
            .put_notes(vec![Note::new("c.md")
                .with_tags(vec!["Old".into()])
                .with_bookmarked(true)])
            .await
            .unwrap();
        f.store.put_tags(vec!["Old".into()]).await.unwrap();

        f.vault.insert("c.md", "Tags: [[New]]");
        let report = f.reconciler.run().await.unwrap();

        assert_eq!(report.mode, ReconcileMode::Incremental);
        assert_eq!(report.diff.added, vec!["c.md"]);
        assert_eq!(report.notes_added, 0);
        assert_eq!(report.notes_updated, 1);
        assert_eq!(report.tags_added, 1);
        assert_eq!(report.tags_removed, 1);

        let c = f.store.get_note("c.md").await.unwrap().unwrap();
        assert_eq!(c.tags, vec!["New"]);
        assert!(c.bookmarked);
        assert_eq!(tag_titles(&f.store).await, vec!["New"]);
        for tag in tag_titles(&f.store).await {
            assert!(
                f.store.count_notes_by_tag(&tag).await.unwrap() >= 1,
                "tag {} has no referencing note",
                tag
            );
        }
    }

    #[tokio::test]
    async fn test_listing_failure_leaves_everything_untouched() {
        let f = fixture(
            MemoryVault::new()
                .with_file("a.md", "")
                .with_file("dir/b.md", ""),
        );
        f.reconciler.run().await.unwrap();

        f.vault.set_unreadable("dir");
        let err = f.reconciler.run().await.unwrap_err();
        assert!(matches!(err, ReconcileError::Tree(_)));
        assert_eq!(f.store.note_count(), 2);
        assert_eq!(f.snapshots.save_count(), 1);
        assert_eq!(f.reconciler.state(), ReconcilerState::Ready);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_bootstraps_and_prunes() {
        let f = fixture_with_snapshots(
            MemoryVault::new().with_file("a.md", "Tags: [[Keep]]"),
            MemorySnapshotStore::with_raw("{broken"),
        );
        f.store
            .put_notes(vec![Note::new("gone.md").with_tags(vec!["Old".into()])])
            .await
            .unwrap();
        f.store.put_tags(vec!["Old".into()]).await.unwrap();

        let report = f.reconciler.run().await.unwrap();

        assert_eq!(report.mode, ReconcileMode::Bootstrap);
        assert_eq!(report.diff.removed, vec!["gone.md"]);
        assert_eq!(report.notes_removed, 1);
        assert!(f.store.get_note("gone.md").await.unwrap().is_none());
        assert_eq!(tag_titles(&f.store).await, vec!["Keep"]);
        assert!(f.snapshots.current().is_some());
    }

    #[tokio::test]
    async fn test_bootstrap_keeps_review_state_of_known_notes() {
        let f = fixture(MemoryVault::new().with_file("a.md", "Tags: [[New]]"));
        f.store
            .put_notes(vec![Note::new("a.md")
                .with_tags(vec!["Old".into()])
                .with_bookmarked(true)])
            .await
            .unwrap();
        f.store.put_tags(vec!["Old".into()]).await.unwrap();

        let report = f.reconciler.run().await.unwrap();
        assert_eq!(report.notes_added, 0);
        assert_eq!(report.notes_updated, 1);

        let a = f.store.get_note("a.md").await.unwrap().unwrap();
        assert!(a.bookmarked);
        assert_eq!(a.tags, vec!["New"]);
        assert_eq!(tag_titles(&f.store).await, vec!["New"]);
    }

    #[tokio::test]
    async fn test_refresh_note_updates_tags() {
        let f = fixture(
            MemoryVault::new()
                .with_file("a.md", "Tags: [[Keep]] | [[Drop]]")
                .with_file("b.md", "Tags: [[Keep]]"),
        );
        f.reconciler.run().await.unwrap();
        f.store.toggle_bookmark("a.md").await.unwrap();

        f.vault.insert("a.md", "Tags: [[Keep]] | [[Added]]");
        let outcome = f.reconciler.refresh_note("a.md").await.unwrap();
        assert_eq!(
            outcome,
            RefreshOutcome::Updated {
                added: vec!["Added".into()],
                dropped: vec!["Drop".into()],
            }
        );

        let a = f.store.get_note("a.md").await.unwrap().unwrap();
        assert!(a.bookmarked);
        assert_eq!(a.last_reviewed, review_epoch());
        assert_eq!(tag_titles(&f.store).await, vec!["Added", "Keep"]);

        assert_eq!(
            f.reconciler.refresh_note("a.md").await.unwrap(),
            RefreshOutcome::Unchanged
        );
    }

    #[tokio::test]
    async fn test_refresh_note_edge_cases() {
        let f = fixture(MemoryVault::new().with_file("new.md", "Tags: [[T]]"));

        assert_eq!(
            f.reconciler.refresh_note("image.png").await.unwrap(),
            RefreshOutcome::Ignored
        );
        assert!(matches!(
            f.reconciler.refresh_note("missing.md").await.unwrap(),
            RefreshOutcome::Skipped(_)
        ));
        assert_eq!(
            f.reconciler.refresh_note("new.md").await.unwrap(),
            RefreshOutcome::Inserted
        );
        assert_eq!(tag_titles(&f.store).await, vec!["T"]);

        // The later bootstrap does not duplicate the refreshed note.
        let report = f.reconciler.run().await.unwrap();
        assert_eq!(report.notes_added, 0);
        assert_eq!(f.store.note_count(), 1);
    }

    #[tokio::test]
    async fn test_custom_scan_window() {
        let f = fixture(MemoryVault::new().with_file("a.md", "title\nTags: [[Second]]"));
        let reconciler = Reconciler::new(f.vault.clone(), f.store.clone(), f.snapshots.clone())
            .with_options(ReconcilerOptions {
                tag_scan_lines: 1,
                ..ReconcilerOptions::default()
            });

        reconciler.run().await.unwrap();
        let a = f.store.get_note("a.md").await.unwrap().unwrap();
        assert!(a.tags.is_empty());
    }
}
