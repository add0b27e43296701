//! Schema management and migrations

use crate::error::{SqliteError, SqliteResult};
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

/// Schema version - increment when making schema changes
pub const SCHEMA_VERSION: i32 = 1;

/// Apply all pending migrations
pub fn apply_migrations(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version = current_version(conn)?;
    debug!(current_version, target_version = SCHEMA_VERSION, "Checking migrations");

    if current_version > SCHEMA_VERSION {
        return Err(SqliteError::Schema(format!(
            "database schema v{} is newer than supported v{}",
            current_version, SCHEMA_VERSION
        )));
    }

    if current_version < 1 {
        info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Applying schema migrations"
        );
        apply_migration_v1(conn)?;
    }

    Ok(())
}

/// Current schema version, 0 for a fresh database
pub fn current_version(conn: &Connection) -> SqliteResult<i32> {
    let version: Option<i32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .optional()?
        .flatten();

    Ok(version.unwrap_or(0))
}

fn record_migration(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version) VALUES (?)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: notes, their ordered tags, and the tag catalog
fn apply_migration_v1(conn: &Connection) -> SqliteResult<()> {
    debug!("Applying migration v1: review schema");

    conn.execute_batch(SCHEMA_V1)
        .map_err(|e| SqliteError::Schema(format!("Failed to apply v1 schema: {}", e)))?;

    record_migration(conn, 1)?;
    info!("Migration v1 applied successfully");
    Ok(())
}

const SCHEMA_V1: &str = r#"
-- ============================================================================
-- TABLE: notes
-- ============================================================================
-- One row per note file; location is the vault-relative path.
-- last_reviewed is RFC 3339 UTC with fixed millisecond precision, so text
-- comparison orders it chronologically.

CREATE TABLE IF NOT EXISTS notes (
    location TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    reviewed INTEGER NOT NULL DEFAULT 0,
    tracked INTEGER NOT NULL DEFAULT 1,
    bookmarked INTEGER NOT NULL DEFAULT 0,
    last_reviewed TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_notes_last_reviewed ON notes(last_reviewed);
CREATE INDEX IF NOT EXISTS idx_notes_bookmarked ON notes(bookmarked);

-- ============================================================================
-- TABLE: note_tags
-- ============================================================================
-- Tags referenced by each note, in header order

CREATE TABLE IF NOT EXISTS note_tags (
    location TEXT NOT NULL REFERENCES notes(location) ON DELETE CASCADE ON UPDATE CASCADE,
    tag TEXT NOT NULL,
    position INTEGER NOT NULL,
    PRIMARY KEY (location, tag)
);

CREATE INDEX IF NOT EXISTS idx_note_tags_tag ON note_tags(tag);

-- ============================================================================
-- TABLE: tags
-- ============================================================================
-- Tags currently in use; kept in step with note_tags by the reconciler

CREATE TABLE IF NOT EXISTS tags (
    title TEXT PRIMARY KEY NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
