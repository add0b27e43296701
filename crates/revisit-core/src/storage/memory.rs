//! In-memory [`NoteStore`].

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::trace;

use crate::note::{Note, Tag};
use crate::storage::note_store::{review_cutoff, NoteStore};
use crate::storage::StorageResult;

#[derive(Debug, Default)]
struct Inner {
    notes: BTreeMap<String, Note>,
    tags: BTreeSet<String>,
}

/// Note store kept entirely in memory. Used by tests and short-lived hosts.
#[derive(Debug, Default)]
pub struct InMemoryNoteStore {
    inner: RwLock<Inner>,
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note_count(&self) -> usize {
        self.inner.read().notes.len()
    }

    pub fn tag_count(&self) -> usize {
        self.inner.read().tags.len()
    }

    fn newest_first(mut notes: Vec<Note>, limit: usize) -> Vec<Note> {
        notes.sort_by(|a, b| {
            b.last_reviewed
                .cmp(&a.last_reviewed)
                .then_with(|| a.location.cmp(&b.location))
        });
        notes.truncate(limit);
        notes
    }
}

#[async_trait]
impl NoteStore for InMemoryNoteStore {
    async fn put_notes(&self, notes: Vec<Note>) -> StorageResult<usize> {
        let mut inner = self.inner.write();
        let mut inserted = 0;
        for note in notes {
            if inner.notes.contains_key(&note.location) {
                trace!(location = %note.location, "Note already stored, skipping");
                continue;
            }
            inner.notes.insert(note.location.clone(), note);
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn put_tags(&self, tags: Vec<Tag>) -> StorageResult<usize> {
        let mut inner = self.inner.write();
        Ok(tags
            .into_iter()
            .filter(|tag| inner.tags.insert(tag.title.clone()))
            .count())
    }

    async fn get_note(&self, location: &str) -> StorageResult<Option<Note>> {
        Ok(self.inner.read().notes.get(location).cloned())
    }

    async fn notes_by_tag(&self, tag: &str) -> StorageResult<Vec<Note>> {
        Ok(self
            .inner
            .read()
            .notes
            .values()
            .filter(|note| note.references_tag(tag))
            .cloned()
            .collect())
    }

    async fn count_notes_by_tag(&self, tag: &str) -> StorageResult<usize> {
        Ok(self
            .inner
            .read()
            .notes
            .values()
            .filter(|note| note.references_tag(tag))
            .count())
    }

    async fn remove_note(&self, location: &str) -> StorageResult<bool> {
        Ok(self.inner.write().notes.remove(location).is_some())
    }

    async fn remove_tag(&self, title: &str) -> StorageResult<bool> {
        Ok(self.inner.write().tags.remove(title))
    }

    async fn all_notes(&self) -> StorageResult<Vec<Note>> {
        Ok(self.inner.read().notes.values().cloned().collect())
    }

    async fn all_tags(&self) -> StorageResult<Vec<Tag>> {
        Ok(self.inner.read().tags.iter().map(|t| Tag::new(t.as_str())).collect())
    }

    async fn bookmarked_notes(&self) -> StorageResult<Vec<Note>> {
        Ok(self
            .inner
            .read()
            .notes
            .values()
            .filter(|note| note.bookmarked)
            .cloned()
            .collect())
    }

    async fn unreviewed_notes(&self, days: u32, limit: usize) -> StorageResult<Vec<Note>> {
        let cutoff = review_cutoff(days);
        let due = self
            .inner
            .read()
            .notes
            .values()
            .filter(|note| note.tracked && note.last_reviewed <= cutoff)
            .cloned()
            .collect();
        Ok(Self::newest_first(due, limit))
    }

    async fn recently_reviewed(&self, days: u32, limit: usize) -> StorageResult<Vec<Note>> {
        let cutoff = review_cutoff(days);
        let recent = self
            .inner
            .read()
            .notes
            .values()
            .filter(|note| note.last_reviewed >= cutoff)
            .cloned()
            .collect();
        Ok(Self::newest_first(recent, limit))
    }

    async fn mark_reviewed(&self, location: &str) -> StorageResult<bool> {
        let mut inner = self.inner.write();
        match inner.notes.get_mut(location) {
            Some(note) => {
                note.reviewed = true;
                note.last_reviewed = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn toggle_bookmark(&self, location: &str) -> StorageResult<Option<bool>> {
        let mut inner = self.inner.write();
        Ok(inner.notes.get_mut(location).map(|note| {
            note.bookmarked = !note.bookmarked;
            note.bookmarked
        }))
    }

    async fn upsert_note(&self, note: Note) -> StorageResult<()> {
        self.inner.write().notes.insert(note.location.clone(), note);
        Ok(())
    }
}
