//! NoteStore Storage Abstraction
//!
//! The store is an index over the vault's files: notes keyed by their
//! vault-relative `location`, plus the set of tag titles currently in use.
//! The markdown files remain the source of truth; the store adds review
//! state (reviewed, bookmarked, last reviewed) that files do not carry.
//!
//! # Example
//!
//! ```ignore
//! use revisit_core::storage::{NoteStore, InMemoryNoteStore};
//! use revisit_core::Note;
//!
//! async fn example(store: &dyn NoteStore) -> StorageResult<()> {
//!     store.put_notes(vec![Note::new("inbox/idea.md")]).await?;
//!     store.mark_reviewed("inbox/idea.md").await?;
//!
//!     // Due notes for the dashboard: not reviewed in 15 days, at most 10
//!     let due = store.unreviewed_notes(15, 10).await?;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::note::{Note, Tag};
use crate::storage::StorageResult;

/// Persistence contract for notes and tags.
///
/// Invariants every implementation keeps:
/// - at most one note per `location`
/// - at most one tag per `title`
///
/// Tag reference counting is the caller's job (see the reconciler); the store
/// only answers how many notes reference a tag.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Bulk insert. Notes whose location already exists are skipped.
    ///
    /// Returns the number of notes inserted.
    async fn put_notes(&self, notes: Vec<Note>) -> StorageResult<usize>;

    /// Bulk insert. Tags whose title already exists are skipped.
    ///
    /// Returns the number of tags inserted.
    async fn put_tags(&self, tags: Vec<Tag>) -> StorageResult<usize>;

    async fn get_note(&self, location: &str) -> StorageResult<Option<Note>>;

    /// Notes whose tag list contains `tag`.
    async fn notes_by_tag(&self, tag: &str) -> StorageResult<Vec<Note>>;

    /// Number of notes referencing `tag`.
    async fn count_notes_by_tag(&self, tag: &str) -> StorageResult<usize> {
        Ok(self.notes_by_tag(tag).await?.len())
    }

    /// Delete a note. Returns whether it existed.
    async fn remove_note(&self, location: &str) -> StorageResult<bool>;

    /// Delete a tag. Returns whether it existed.
    async fn remove_tag(&self, title: &str) -> StorageResult<bool>;

    async fn all_notes(&self) -> StorageResult<Vec<Note>>;

    async fn all_tags(&self) -> StorageResult<Vec<Tag>>;

    async fn bookmarked_notes(&self) -> StorageResult<Vec<Note>>;

    /// Tracked notes last reviewed at least `days` ago, most recently
    /// reviewed first, at most `limit`.
    async fn unreviewed_notes(&self, days: u32, limit: usize) -> StorageResult<Vec<Note>>;

    /// Notes reviewed within the last `days`, most recent first, at most `limit`.
    async fn recently_reviewed(&self, days: u32, limit: usize) -> StorageResult<Vec<Note>>;

    /// Mark a note reviewed now. Returns whether the note exists.
    async fn mark_reviewed(&self, location: &str) -> StorageResult<bool>;

    /// Flip a note's bookmark. Returns the new value, or `None` if the note
    /// does not exist.
    async fn toggle_bookmark(&self, location: &str) -> StorageResult<Option<bool>>;

    /// Insert or replace a note by location.
    async fn upsert_note(&self, note: Note) -> StorageResult<()>;
}

/// Boundary timestamp for "reviewed `days` ago".
pub fn review_cutoff(days: u32) -> DateTime<Utc> {
    Utc::now() - Duration::days(i64::from(days))
}

#[async_trait]
impl<T: NoteStore + ?Sized> NoteStore for std::sync::Arc<T> {
    async fn put_notes(&self, notes: Vec<Note>) -> StorageResult<usize> {
        (**self).put_notes(notes).await
    }

    async fn put_tags(&self, tags: Vec<Tag>) -> StorageResult<usize> {
        (**self).put_tags(tags).await
    }

    async fn get_note(&self, location: &str) -> StorageResult<Option<Note>> {
        (**self).get_note(location).await
    }

    async fn notes_by_tag(&self, tag: &str) -> StorageResult<Vec<Note>> {
        (**self).notes_by_tag(tag).await
    }

    async fn count_notes_by_tag(&self, tag: &str) -> StorageResult<usize> {
        (**self).count_notes_by_tag(tag).await
    }

    async fn remove_note(&self, location: &str) -> StorageResult<bool> {
        (**self).remove_note(location).await
    }

    async fn remove_tag(&self, title: &str) -> StorageResult<bool> {
        (**self).remove_tag(title).await
    }

    async fn all_notes(&self) -> StorageResult<Vec<Note>> {
        (**self).all_notes().await
    }

    async fn all_tags(&self) -> StorageResult<Vec<Tag>> {
        (**self).all_tags().await
    }

    async fn bookmarked_notes(&self) -> StorageResult<Vec<Note>> {
        (**self).bookmarked_notes().await
    }

    async fn unreviewed_notes(&self, days: u32, limit: usize) -> StorageResult<Vec<Note>> {
        (**self).unreviewed_notes(days, limit).await
    }

    async fn recently_reviewed(&self, days: u32, limit: usize) -> StorageResult<Vec<Note>> {
        (**self).recently_reviewed(days, limit).await
    }

    async fn mark_reviewed(&self, location: &str) -> StorageResult<bool> {
        (**self).mark_reviewed(location).await
    }

    async fn toggle_bookmark(&self, location: &str) -> StorageResult<Option<bool>> {
        (**self).toggle_bookmark(location).await
    }

    async fn upsert_note(&self, note: Note) -> StorageResult<()> {
        (**self).upsert_note(note).await
    }
}
