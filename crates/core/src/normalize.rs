// SPDX-License-Identifier: MIT

//! Metadata text normalization for duplicate matching.

/// Normalize a metadata field for comparison: collapse internal
/// whitespace runs to single spaces, trim, and lowercase.
///
/// Idempotent: `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Fallback duplicate key over normalized title/artist/album.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetadataKey {
    pub title: String,
    pub artist: String,
    pub album: String,
}

impl MetadataKey {
    /// Build a key, or `None` when title or artist is empty after
    /// normalization (the fallback requires both).
    pub fn new(title: &str, artist: &str, album: &str) -> Option<Self> {
        let title = normalize(title);
        let artist = normalize(artist);
        if title.is_empty() || artist.is_empty() {
            return None;
        }
        Some(Self {
            title,
            artist,
            album: normalize(album),
        })
    }
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
