//! SQLite implementation of [`NoteStore`].

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use revisit_core::storage::{review_cutoff, NoteStore, StorageError, StorageResult};
use revisit_core::{Note, Tag};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::config::SqliteConfig;
use crate::connection::SqlitePool;
use crate::error::SqliteResult;

const NOTE_COLUMNS: &str = "location, title, reviewed, tracked, bookmarked, last_reviewed";

/// Note store backed by SQLite.
#[derive(Clone)]
pub struct SqliteNoteStore {
    pool: SqlitePool,
}

impl SqliteNoteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database described by `config`.
    pub fn open(config: SqliteConfig) -> SqliteResult<Self> {
        Ok(Self::new(SqlitePool::new(config)?))
    }

    /// In-memory store for tests
    pub fn memory() -> SqliteResult<Self> {
        Ok(Self::new(SqlitePool::memory()?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run `f` against the pool on the blocking thread pool.
    async fn blocking<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&SqlitePool) -> SqliteResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || f(&pool))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?
            .map_err(Into::into)
    }
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Map a row selected with [`NOTE_COLUMNS`]. Tags are loaded separately.
fn row_to_note(row: &Row<'_>) -> rusqlite::Result<Note> {
    let raw: String = row.get(5)?;
    Ok(Note {
        location: row.get(0)?,
        title: row.get(1)?,
        reviewed: row.get(2)?,
        tracked: row.get(3)?,
        bookmarked: row.get(4)?,
        last_reviewed: parse_timestamp(5, &raw)?,
        tags: Vec::new(),
    })
}

fn load_tags(conn: &Connection, location: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT tag FROM note_tags WHERE location = ?1 ORDER BY position",
    )?;
    let rows = stmt.query_map([location], |row| row.get(0))?;
    rows.collect()
}

fn insert_tags(conn: &Connection, note: &Note) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT OR IGNORE INTO note_tags (location, tag, position) VALUES (?1, ?2, ?3)",
    )?;
    for (position, tag) in note.tags.iter().enumerate() {
        stmt.execute(params![note.location, tag, position as i64])?;
    }
    Ok(())
}

/// Run a note query and attach each note's tags.
fn query_notes(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> rusqlite::Result<Vec<Note>> {
    let mut stmt = conn.prepare(sql)?;
    let mut notes = stmt
        .query_map(params, row_to_note)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for note in &mut notes {
        note.tags = load_tags(conn, &note.location)?;
    }
    Ok(notes)
}

#[async_trait]
impl NoteStore for SqliteNoteStore {
    async fn put_notes(&self, notes: Vec<Note>) -> StorageResult<usize> {
        self.blocking(move |pool| {
            pool.with_connection_mut(|conn| {
                let tx = conn.transaction()?;
                let mut inserted = 0;
                {
                    let mut stmt = tx.prepare(
                        r#"
                        INSERT INTO notes (location, title, reviewed, tracked, bookmarked, last_reviewed)
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                        ON CONFLICT(location) DO NOTHING
                        "#,
                    )?;
                    for note in &notes {
                        let changed = stmt.execute(params![
                            note.location,
                            note.title,
                            note.reviewed,
                            note.tracked,
                            note.bookmarked,
                            format_timestamp(&note.last_reviewed),
                        ])?;
                        if changed == 1 {
                            insert_tags(&tx, note)?;
                            inserted += 1;
                        }
                    }
                }
                tx.commit()?;
                debug!(requested = notes.len(), inserted, "Bulk inserted notes");
                Ok(inserted)
            })
        })
        .await
    }

    async fn put_tags(&self, tags: Vec<Tag>) -> StorageResult<usize> {
        self.blocking(move |pool| {
            pool.with_connection_mut(|conn| {
                let tx = conn.transaction()?;
                let mut inserted = 0;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO tags (title) VALUES (?1) ON CONFLICT(title) DO NOTHING",
                    )?;
                    for tag in &tags {
                        inserted += stmt.execute([&tag.title])?;
                    }
                }
                tx.commit()?;
                Ok(inserted)
            })
        })
        .await
    }

    async fn get_note(&self, location: &str) -> StorageResult<Option<Note>> {
        let location = location.to_string();
        self.blocking(move |pool| {
            pool.with_connection(|conn| {
                let sql = format!("SELECT {} FROM notes WHERE location = ?1", NOTE_COLUMNS);
                let note = conn.query_row(&sql, [&location], row_to_note).optional()?;
                match note {
                    Some(mut note) => {
                        note.tags = load_tags(conn, &note.location)?;
                        Ok(Some(note))
                    }
                    None => Ok(None),
                }
            })
        })
        .await
    }

    async fn notes_by_tag(&self, tag: &str) -> StorageResult<Vec<Note>> {
        let tag = tag.to_string();
        self.blocking(move |pool| {
            pool.with_connection(|conn| {
                let sql = format!(
                    "SELECT {} FROM notes WHERE location IN \
                     (SELECT location FROM note_tags WHERE tag = ?1) ORDER BY location",
                    NOTE_COLUMNS
                );
                Ok(query_notes(conn, &sql, [&tag])?)
            })
        })
        .await
    }

    async fn count_notes_by_tag(&self, tag: &str) -> StorageResult<usize> {
        let tag = tag.to_string();
        self.blocking(move |pool| {
            pool.with_connection(|conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM note_tags WHERE tag = ?1",
                    [&tag],
                    |row| row.get(0),
                )?;
                Ok(count as usize)
            })
        })
        .await
    }

    async fn remove_note(&self, location: &str) -> StorageResult<bool> {
        let location = location.to_string();
        self.blocking(move |pool| {
            pool.with_connection_mut(|conn| {
                let tx = conn.transaction()?;
                // Explicit so the tag rows go even with foreign keys disabled.
                tx.execute("DELETE FROM note_tags WHERE location = ?1", [&location])?;
                let removed = tx.execute("DELETE FROM notes WHERE location = ?1", [&location])?;
                tx.commit()?;
                Ok(removed > 0)
            })
        })
        .await
    }

    async fn remove_tag(&self, title: &str) -> StorageResult<bool> {
        let title = title.to_string();
        self.blocking(move |pool| {
            pool.with_connection(|conn| {
                Ok(conn.execute("DELETE FROM tags WHERE title = ?1", [&title])? > 0)
            })
        })
        .await
    }

    async fn all_notes(&self) -> StorageResult<Vec<Note>> {
        self.blocking(|pool| {
            pool.with_connection(|conn| {
                let sql = format!("SELECT {} FROM notes ORDER BY location", NOTE_COLUMNS);
                Ok(query_notes(conn, &sql, [])?)
            })
        })
        .await
    }

    async fn all_tags(&self) -> StorageResult<Vec<Tag>> {
        self.blocking(|pool| {
            pool.with_connection(|conn| {
                let mut stmt = conn.prepare("SELECT title FROM tags ORDER BY title")?;
                let tags = stmt
                    .query_map([], |row| Ok(Tag::new(row.get::<_, String>(0)?)))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(tags)
            })
        })
        .await
    }

    async fn bookmarked_notes(&self) -> StorageResult<Vec<Note>> {
        self.blocking(|pool| {
            pool.with_connection(|conn| {
                let sql = format!(
                    "SELECT {} FROM notes WHERE bookmarked = 1 ORDER BY location",
                    NOTE_COLUMNS
                );
                Ok(query_notes(conn, &sql, [])?)
            })
        })
        .await
    }

    async fn unreviewed_notes(&self, days: u32, limit: usize) -> StorageResult<Vec<Note>> {
        let cutoff = format_timestamp(&review_cutoff(days));
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.blocking(move |pool| {
            pool.with_connection(|conn| {
                let sql = format!(
                    "SELECT {} FROM notes WHERE tracked = 1 AND last_reviewed <= ?1 \
                     ORDER BY last_reviewed DESC, location ASC LIMIT ?2",
                    NOTE_COLUMNS
                );
                Ok(query_notes(conn, &sql, params![cutoff, limit])?)
            })
        })
        .await
    }

    async fn recently_reviewed(&self, days: u32, limit: usize) -> StorageResult<Vec<Note>> {
        let cutoff = format_timestamp(&review_cutoff(days));
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.blocking(move |pool| {
            pool.with_connection(|conn| {
                let sql = format!(
                    "SELECT {} FROM notes WHERE last_reviewed >= ?1 \
                     ORDER BY last_reviewed DESC, location ASC LIMIT ?2",
                    NOTE_COLUMNS
                );
                Ok(query_notes(conn, &sql, params![cutoff, limit])?)
            })
        })
        .await
    }

    async fn mark_reviewed(&self, location: &str) -> StorageResult<bool> {
        let location = location.to_string();
        let now = format_timestamp(&Utc::now());
        self.blocking(move |pool| {
            pool.with_connection(|conn| {
                let changed = conn.execute(
                    "UPDATE notes SET reviewed = 1, last_reviewed = ?2 WHERE location = ?1",
                    params![location, now],
                )?;
                Ok(changed > 0)
            })
        })
        .await
    }

    async fn toggle_bookmark(&self, location: &str) -> StorageResult<Option<bool>> {
        let location = location.to_string();
        self.blocking(move |pool| {
            pool.with_connection(|conn| {
                let flag = conn
                    .query_row(
                        "UPDATE notes SET bookmarked = NOT bookmarked WHERE location = ?1 \
                         RETURNING bookmarked",
                        [&location],
                        |row| row.get::<_, bool>(0),
                    )
                    .optional()?;
                Ok(flag)
            })
        })
        .await
    }

    async fn upsert_note(&self, note: Note) -> StorageResult<()> {
        self.blocking(move |pool| {
            pool.with_connection_mut(|conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    r#"
                    INSERT INTO notes (location, title, reviewed, tracked, bookmarked, last_reviewed)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    ON CONFLICT(location) DO UPDATE SET
                        title = excluded.title,
                        reviewed = excluded.reviewed,
                        tracked = excluded.tracked,
                        bookmarked = excluded.bookmarked,
                        last_reviewed = excluded.last_reviewed
                    "#,
                    params![
                        note.location,
                        note.title,
                        note.reviewed,
                        note.tracked,
                        note.bookmarked,
                        format_timestamp(&note.last_reviewed),
                    ],
                )?;
                tx.execute("DELETE FROM note_tags WHERE location = ?1", [&note.location])?;
                insert_tags(&tx, &note)?;
                tx.commit()?;
                Ok(())
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use revisit_core::note::review_epoch;

    fn tagged(location: &str, tags: &[&str]) -> Note {
        Note::new(location).with_tags(tags.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn test_timestamp_text_orders_chronologically() {
        let early = format_timestamp(&review_epoch());
        let late = format_timestamp(&Utc::now());
        assert_eq!(early, "1970-01-01T00:00:00.000Z");
        assert!(early < late);
        assert_eq!(parse_timestamp(0, &early).unwrap(), review_epoch());
    }

    #[tokio::test]
    async fn test_round_trip_preserves_fields_and_tag_order() {
        let store = SqliteNoteStore::memory().unwrap();
        let note = tagged("dir/a.md", &["Zeta", "Alpha", "Mid"])
            .with_bookmarked(true)
            .with_last_reviewed(review_epoch());

        store.put_notes(vec![note.clone()]).await.unwrap();
        let loaded = store.get_note("dir/a.md").await.unwrap().unwrap();
        assert_eq!(loaded, note);
    }

    #[tokio::test]
    async fn test_put_notes_skips_existing() {
        let store = SqliteNoteStore::memory().unwrap();
        assert_eq!(
            store
                .put_notes(vec![tagged("a.md", &["x"]), tagged("b.md", &[])])
                .await
                .unwrap(),
            2
        );
        assert_eq!(
            store
                .put_notes(vec![tagged("a.md", &["y"]), tagged("c.md", &[])])
                .await
                .unwrap(),
            1
        );

        let a = store.get_note("a.md").await.unwrap().unwrap();
        assert_eq!(a.tags, vec!["x"]);
        assert_eq!(store.all_notes().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_remove_note_drops_tag_links() {
        let store = SqliteNoteStore::memory().unwrap();
        store
            .put_notes(vec![tagged("a.md", &["Shared"]), tagged("b.md", &["Shared"])])
            .await
            .unwrap();
        assert_eq!(store.count_notes_by_tag("Shared").await.unwrap(), 2);

        assert!(store.remove_note("a.md").await.unwrap());
        assert!(!store.remove_note("a.md").await.unwrap());
        assert_eq!(store.count_notes_by_tag("Shared").await.unwrap(), 1);

        let remaining: Vec<String> = store
            .notes_by_tag("Shared")
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.location)
            .collect();
        assert_eq!(remaining, vec!["b.md"]);
    }

    #[tokio::test]
    async fn test_tags_table() {
        let store = SqliteNoteStore::memory().unwrap();
        assert_eq!(
            store
                .put_tags(vec!["b".into(), "a".into(), "b".into()])
                .await
                .unwrap(),
            2
        );
        assert_eq!(
            store.all_tags().await.unwrap(),
            vec![Tag::new("a"), Tag::new("b")]
        );
        assert!(store.remove_tag("a").await.unwrap());
        assert!(!store.remove_tag("a").await.unwrap());
    }

    #[tokio::test]
    async fn test_review_queries() {
        let now = Utc::now();
        let store = SqliteNoteStore::memory().unwrap();
        store
            .put_notes(vec![
                Note::new("epoch.md").with_last_reviewed(review_epoch()),
                Note::new("month.md").with_last_reviewed(now - Duration::days(30)),
                Note::new("day.md").with_last_reviewed(now - Duration::days(1)),
                Note::new("off.md")
                    .with_last_reviewed(now - Duration::days(90))
                    .with_tracked(false),
            ])
            .await
            .unwrap();

        let due: Vec<String> = store
            .unreviewed_notes(15, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.location)
            .collect();
        assert_eq!(due, vec!["month.md", "epoch.md"]);
        assert_eq!(store.unreviewed_notes(15, 1).await.unwrap().len(), 1);

        let recent: Vec<String> = store
            .recently_reviewed(7, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.location)
            .collect();
        assert_eq!(recent, vec!["day.md"]);
    }

    #[tokio::test]
    async fn test_mark_reviewed_and_toggle_bookmark() {
        let store = SqliteNoteStore::memory().unwrap();
        store
            .put_notes(vec![Note::new("a.md").with_last_reviewed(review_epoch())])
            .await
            .unwrap();

        assert!(store.mark_reviewed("a.md").await.unwrap());
        assert!(!store.mark_reviewed("nope.md").await.unwrap());
        let a = store.get_note("a.md").await.unwrap().unwrap();
        assert!(a.reviewed);
        assert!(a.last_reviewed > review_epoch());

        assert_eq!(store.toggle_bookmark("a.md").await.unwrap(), Some(true));
        assert_eq!(store.bookmarked_notes().await.unwrap().len(), 1);
        assert_eq!(store.toggle_bookmark("a.md").await.unwrap(), Some(false));
        assert_eq!(store.toggle_bookmark("nope.md").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_upsert_replaces_fields_and_tags() {
        let store = SqliteNoteStore::memory().unwrap();
        store.upsert_note(tagged("a.md", &["x", "y"])).await.unwrap();
        store
            .upsert_note(tagged("a.md", &["z"]).with_bookmarked(true))
            .await
            .unwrap();

        let a = store.get_note("a.md").await.unwrap().unwrap();
        assert_eq!(a.tags, vec!["z"]);
        assert!(a.bookmarked);
        assert_eq!(store.count_notes_by_tag("x").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_timestamp_is_reported() {
        let store = SqliteNoteStore::memory().unwrap();
        store
            .pool()
            .with_connection(|conn| {
                conn.execute(
                    "INSERT INTO notes (location, title, last_reviewed) VALUES ('bad.md', 'bad', 'yesterday')",
                    [],
                )?;
                Ok(())
            })
            .unwrap();

        let err = store.get_note("bad.md").await.unwrap_err();
        assert!(matches!(err, StorageError::Deserialization(_)));
    }
}
