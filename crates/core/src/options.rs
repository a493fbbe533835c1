// SPDX-License-Identifier: MIT

//! Per-job options bag.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Options recognized by the orchestrator plus a free-form bag for
/// adapter-specific keys (API credentials, DB coordinates, bundle paths).
///
/// Any key unknown to an adapter is ignored by it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobOptions {
    /// Selects the registered adapter.
    pub source_type: String,
    /// Reuse an existing station instead of creating a new one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_station_id: Option<String>,
    /// Associated as owner of a newly created station.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importing_user_id: Option<String>,
    #[serde(default)]
    pub skip_media: bool,
    #[serde(default)]
    pub skip_playlists: bool,
    #[serde(default)]
    pub skip_schedules: bool,
    #[serde(default)]
    pub skip_smartblocks: bool,
    #[serde(default)]
    pub skip_webstreams: bool,
    #[serde(default)]
    pub skip_users: bool,
    /// Force the two-phase analyze/review/commit workflow.
    #[serde(default)]
    pub staged_mode: bool,
    /// Fail the commit when imported media carry a zero duration.
    #[serde(default)]
    pub strict_durations: bool,
    /// Stamped in at job creation; adapters use it for provenance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    /// Adapter-specific keys: `api_url`, `api_key`, `db_host`, `db_port`,
    /// `db_name`, `db_user`, `db_password`, `backup_path`, `media_path`.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub source: HashMap<String, String>,
}

impl JobOptions {
    pub fn new(source_type: impl Into<String>) -> Self {
        Self {
            source_type: source_type.into(),
            ..Self::default()
        }
    }

    /// Look up an adapter-specific key.
    pub fn source_opt(&self, key: &str) -> Option<&str> {
        self.source.get(key).map(String::as_str)
    }

    pub fn with_source_opt(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.source.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;
