// SPDX-License-Identifier: MIT

//! Import result counters, identity mappings, and the imported-items index.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Per-run identity bridge: one source row mapped to one new catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub old_id: String,
    pub new_id: String,
    /// Entity kind, e.g. `media`, `playlist`, `show`.
    pub kind: String,
    /// Display name for review output.
    #[serde(default)]
    pub name: String,
}

/// Index of everything a completed job wrote. Written on commit; the sole
/// source of truth for rollback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportedItems {
    #[serde(default)]
    pub media_ids: Vec<String>,
    #[serde(default)]
    pub playlist_ids: Vec<String>,
    #[serde(default)]
    pub smart_block_ids: Vec<String>,
    #[serde(default)]
    pub show_ids: Vec<String>,
    #[serde(default)]
    pub clock_hour_ids: Vec<String>,
    #[serde(default)]
    pub webstream_ids: Vec<String>,
}

impl ImportedItems {
    pub fn is_empty(&self) -> bool {
        self.media_ids.is_empty()
            && self.playlist_ids.is_empty()
            && self.smart_block_ids.is_empty()
            && self.show_ids.is_empty()
            && self.clock_hour_ids.is_empty()
            && self.webstream_ids.is_empty()
    }

    pub fn total(&self) -> usize {
        self.media_ids.len()
            + self.playlist_ids.len()
            + self.smart_block_ids.len()
            + self.show_ids.len()
            + self.clock_hour_ids.len()
            + self.webstream_ids.len()
    }
}

/// Outcome of an import or analysis run.
///
/// Successful runs always carry counters, even when some items were
/// skipped; item-level failures land in `skipped` and `warnings` rather
/// than failing the run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    #[serde(default)]
    pub stations_created: u64,
    #[serde(default)]
    pub media_imported: u64,
    #[serde(default)]
    pub playlists_imported: u64,
    #[serde(default)]
    pub smart_blocks_imported: u64,
    /// Shows plus clock-hour templates; both count as schedules created.
    #[serde(default)]
    pub schedules_created: u64,
    #[serde(default)]
    pub webstreams_imported: u64,
    /// Keyed skip counters, e.g. `media_download_failed`,
    /// `playlist_items_no_media`. Insertion-ordered for stable reports.
    #[serde(default)]
    pub skipped: IndexMap<String, u64>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mappings: Vec<Mapping>,
}

impl ImportResult {
    /// Bump a skip bucket by one.
    pub fn skip(&mut self, bucket: &str) {
        *self.skipped.entry(bucket.to_string()).or_insert(0) += 1;
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn total_skipped(&self) -> u64 {
        self.skipped.values().sum()
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
