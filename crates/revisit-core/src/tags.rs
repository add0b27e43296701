//! Tag header extraction.
//!
//! A note declares its tags on a single header line near the top of the file:
//!
//! ```text
//! Tags: [[Work]] | [[Urgent]]
//! ```
//!
//! Only the first matching line within the scanned window is honoured.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Number of leading lines searched for the tags header.
pub const DEFAULT_SCAN_LINES: usize = 10;

static TAGS_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*Tags:\s*\[\[[^\[\]]+\]\](?:\s*\|\s*\[\[[^\[\]]+\]\])*\s*$")
        .expect("tags line regex")
});

static TAG_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\[\]]+)\]\]").expect("tag token regex"));

/// Extract tags from the first [`DEFAULT_SCAN_LINES`] lines of `content`.
pub fn extract_tags(content: &str) -> Vec<String> {
    extract_tags_within(content, DEFAULT_SCAN_LINES)
}

/// Extract tags from the first `max_lines` lines of `content`.
///
/// Returns tags in order of appearance, trimmed, without duplicates. Empty if
/// no tags header is found.
pub fn extract_tags_within(content: &str, max_lines: usize) -> Vec<String> {
    let Some(line) = content
        .lines()
        .take(max_lines)
        .find(|line| TAGS_LINE_REGEX.is_match(line))
    else {
        return Vec::new();
    };

    let mut tags: Vec<String> = Vec::new();
    for cap in TAG_TOKEN_REGEX.captures_iter(line) {
        let tag = cap[1].trim();
        if tag.is_empty() || tags.iter().any(|t| t == tag) {
            continue;
        }
        tags.push(tag.to_string());
    }
    tags
}

/// Union of the tags of many documents, e.g. to seed the tag store.
pub fn extract_all_tags<'a, I>(contents: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    contents.into_iter().flat_map(extract_tags).collect()
}
