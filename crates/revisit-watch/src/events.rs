//! File event types.
//!
//! Paths carried by events are relative to the vault root.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// Represents a file system event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileEvent {
    /// Unique identifier for this event.
    pub id: Uuid,

    /// Kind of file event.
    pub kind: FileEventKind,

    /// Vault-relative path of the file or directory.
    pub path: PathBuf,

    /// Timestamp when the event occurred.
    pub timestamp: DateTime<Utc>,

    /// Whether this is a directory.
    pub is_dir: bool,
}

impl FileEvent {
    /// Create a new file event.
    pub fn new(kind: FileEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            path: path.into(),
            timestamp: Utc::now(),
            is_dir: false,
        }
    }

    /// Group several events into one.
    pub fn batch(events: Vec<FileEvent>) -> Self {
        Self::new(FileEventKind::Batch(events), PathBuf::new())
    }

    /// Mark the event as concerning a directory.
    #[must_use]
    pub fn with_dir(mut self, is_dir: bool) -> Self {
        self.is_dir = is_dir;
        self
    }

    /// The event itself, or the leaves of a (possibly nested) batch.
    pub fn flatten(self) -> Vec<FileEvent> {
        match self.kind {
            FileEventKind::Batch(events) => events.into_iter().flat_map(Self::flatten).collect(),
            _ => vec![self],
        }
    }

    /// `/`-joined location, as used for note keys.
    pub fn location(&self) -> Option<String> {
        location_of(&self.path)
    }

    /// Whether the event only concerns hidden entries.
    pub fn is_hidden(&self) -> bool {
        match &self.kind {
            FileEventKind::Moved { from, to } => is_hidden(from) && is_hidden(to),
            _ => is_hidden(&self.path),
        }
    }
}

/// Kinds of file events that can occur.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum FileEventKind {
    /// File or directory was created.
    Created,
    /// File or directory was modified.
    Modified,
    /// File or directory was deleted.
    Deleted,
    /// File or directory was moved/renamed.
    Moved {
        /// Original path before the move.
        from: PathBuf,
        /// New path after the move.
        to: PathBuf,
    },
    /// Multiple events occurred (used for batched operations).
    Batch(Vec<FileEvent>),
    /// Unknown event type.
    Unknown(String),
}

impl FileEventKind {
    /// Whether the event changes which files exist.
    pub fn changes_tree(&self) -> bool {
        matches!(self, Self::Created | Self::Deleted | Self::Moved { .. })
    }

    /// Get a string representation of the event kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
            Self::Moved { .. } => "moved",
            Self::Batch(_) => "batch",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Render a relative path as a `/`-joined location.
///
/// Returns `None` for absolute paths, parent references and non-UTF-8 names.
pub fn location_of(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(name) => parts.push(name.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn is_hidden(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}
