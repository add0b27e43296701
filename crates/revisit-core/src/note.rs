//! Note and tag records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked note.
///
/// `location` is the vault-relative, `/`-joined path of the file and the
/// note's identity: at most one note exists per location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub location: String,
    pub title: String,
    /// Marked done in the current review cycle.
    pub reviewed: bool,
    /// Participates in the review workflow.
    pub tracked: bool,
    pub bookmarked: bool,
    pub last_reviewed: DateTime<Utc>,
    /// Tags in order of appearance in the note's header.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Note {
    /// New tracked, unreviewed note. The title is the file name without its
    /// extension and `last_reviewed` is now.
    pub fn new(location: impl Into<String>) -> Self {
        let location = location.into();
        let title = title_from_location(&location);
        Self {
            location,
            title,
            reviewed: false,
            tracked: true,
            bookmarked: false,
            last_reviewed: Utc::now(),
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    #[must_use]
    pub fn with_last_reviewed(mut self, at: DateTime<Utc>) -> Self {
        self.last_reviewed = at;
        self
    }

    #[must_use]
    pub fn with_bookmarked(mut self, bookmarked: bool) -> Self {
        self.bookmarked = bookmarked;
        self
    }

    #[must_use]
    pub fn with_tracked(mut self, tracked: bool) -> Self {
        self.tracked = tracked;
        self
    }

    pub fn references_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Sentinel `last_reviewed` for notes discovered on first run, which makes
/// them due immediately.
pub fn review_epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

fn title_from_location(location: &str) -> String {
    let name = location.rsplit('/').next().unwrap_or(location);
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[..idx].to_string(),
        _ => name.to_string(),
    }
}

/// A tag. Exists only while at least one note references it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    pub title: String,
}

impl Tag {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl From<&str> for Tag {
    fn from(title: &str) -> Self {
        Self::new(title)
    }
}

impl From<String> for Tag {
    fn from(title: String) -> Self {
        Self { title }
    }
}
