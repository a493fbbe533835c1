// SPDX-License-Identifier: MIT

//! Staged import artifact: the reviewable output of analysis.
//!
//! A staged import holds everything the analyzer found in the source,
//! classified and pre-selected, so a human can review and adjust before
//! anything is written to the catalog. `selected` flags start out as
//! default policy and become pure derivations of [`Selections`] once the
//! user submits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Review status of a staged import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagedStatus {
    Analyzing,
    Ready,
    Committed,
    Rejected,
}

impl fmt::Display for StagedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StagedStatus::Analyzing => "analyzing",
            StagedStatus::Ready => "ready",
            StagedStatus::Committed => "committed",
            StagedStatus::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

/// Severity of an analysis warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    Info,
    Warning,
}

/// Informational finding attached to a staged import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedWarning {
    /// Stable code, e.g. `duplicate_media`, `low_confidence_schedule`.
    pub code: String,
    pub severity: WarningSeverity,
    pub message: String,
}

/// Suggested user action derived from analysis findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedSuggestion {
    /// Stable action code, e.g. `skip_duplicates`, `review_schedules`.
    pub action: String,
    pub message: String,
}

/// One candidate media row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagedMedia {
    pub source_id: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub duration_ms: i64,
    /// Source-side file path.
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub file_size: i64,
    /// SHA-256 of the file bytes, hex-encoded, when the source exposes it.
    #[serde(default)]
    pub content_hash: String,
    /// Matches an existing target row.
    #[serde(default)]
    pub is_duplicate: bool,
    #[serde(default)]
    pub duplicate_of_id: String,
    /// Matches a file on local storage with no owning catalog row.
    /// Never set together with `is_duplicate`.
    #[serde(default)]
    pub orphan_match: bool,
    #[serde(default)]
    pub orphan_id: String,
    #[serde(default)]
    pub orphan_path: String,
    #[serde(default)]
    pub selected: bool,
}

/// One ordered playlist entry, referencing a media row by source id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagedPlaylistItem {
    pub media_source_id: String,
    /// `HH:MM:SS` or `HH:MM:SS.mmm`; converted to milliseconds at commit.
    #[serde(default)]
    pub fade_in: String,
    #[serde(default)]
    pub fade_out: String,
}

/// One candidate playlist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagedPlaylist {
    pub source_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub items: Vec<StagedPlaylistItem>,
    #[serde(default)]
    pub selected: bool,
}

/// One candidate smart block (criteria-driven playlist).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagedSmartBlock {
    pub source_id: String,
    pub name: String,
    /// Raw source criteria payload, preserved verbatim.
    #[serde(default)]
    pub criteria: serde_json::Value,
    #[serde(default)]
    pub selected: bool,
}

/// One candidate show with its detected recurrence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagedShow {
    pub source_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instance_count: usize,
    /// Detected iCalendar recurrence rule, empty when no pattern was found.
    #[serde(default)]
    pub rrule: String,
    /// Detection confidence in `[0, 1]`.
    #[serde(default)]
    pub confidence: f64,
    /// Human-readable pattern description, e.g. "Weekly on Monday at 08:00".
    #[serde(default)]
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtstart: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_minutes: i64,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub exception_count: usize,
    /// User-supplied override applied at commit in place of `rrule`.
    #[serde(default)]
    pub custom_rrule: String,
    /// Import as a scheduled show. Mutually exclusive with `create_clock`.
    #[serde(default)]
    pub create_show: bool,
    /// Import as an unscheduled clock-hour template.
    #[serde(default)]
    pub create_clock: bool,
    #[serde(default)]
    pub selected: bool,
}

/// One candidate webstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagedWebstream {
    pub source_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub selected: bool,
}

/// Source-side station branding, applied when commit creates a new
/// station instead of reusing one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationBranding {
    pub name: String,
    #[serde(default)]
    pub short_code: String,
    #[serde(default)]
    pub description: String,
}

/// User-submitted selection overrides, one id list per section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selections {
    #[serde(default)]
    pub media_ids: Vec<String>,
    #[serde(default)]
    pub playlist_ids: Vec<String>,
    #[serde(default)]
    pub smart_block_ids: Vec<String>,
    #[serde(default)]
    pub show_ids: Vec<String>,
    #[serde(default)]
    pub webstream_ids: Vec<String>,
    /// Shows to import with their recurrence rule. Disjoint from
    /// `shows_as_clocks`; one choice per show.
    #[serde(default)]
    pub shows_as_shows: Vec<String>,
    /// Shows to import as clock-hour templates instead.
    #[serde(default)]
    pub shows_as_clocks: Vec<String>,
    /// Per-show RRULE overrides keyed by source id.
    #[serde(default)]
    pub custom_rrules: HashMap<String, String>,
    /// When non-empty, restricts selections to source ids whose leading
    /// `<station>:` component is listed here.
    #[serde(default)]
    pub station_ids: Vec<String>,
}

impl Selections {
    /// Whether `source_id` passes the optional station filter.
    ///
    /// Source-scoped ids carry a `<station>:<local>` shape; ids without a
    /// station component always pass.
    fn passes_station_filter(&self, source_id: &str) -> bool {
        if self.station_ids.is_empty() {
            return true;
        }
        match source_id.split_once(':') {
            Some((station, _)) => self.station_ids.iter().any(|s| s == station),
            None => true,
        }
    }

    fn selects(&self, ids: &[String], source_id: &str) -> bool {
        self.passes_station_filter(source_id) && ids.iter().any(|id| id == source_id)
    }
}

/// The reviewable artifact produced by one job's analysis phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedImport {
    pub id: String,
    /// Back-reference to the owning job (1:1).
    pub job_id: String,
    pub status: StagedStatus,
    #[serde(default)]
    pub media: Vec<StagedMedia>,
    #[serde(default)]
    pub playlists: Vec<StagedPlaylist>,
    #[serde(default)]
    pub smart_blocks: Vec<StagedSmartBlock>,
    #[serde(default)]
    pub shows: Vec<StagedShow>,
    #[serde(default)]
    pub webstreams: Vec<StagedWebstream>,
    /// Branding for the station commit will create when the job has no
    /// target station configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branding: Option<StationBranding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selections: Option<Selections>,
    #[serde(default)]
    pub warnings: Vec<StagedWarning>,
    #[serde(default)]
    pub suggestions: Vec<StagedSuggestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committed_at: Option<DateTime<Utc>>,
}

impl StagedImport {
    pub fn new(id: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            job_id: job_id.into(),
            status: StagedStatus::Analyzing,
            media: Vec::new(),
            playlists: Vec::new(),
            smart_blocks: Vec::new(),
            shows: Vec::new(),
            webstreams: Vec::new(),
            branding: None,
            selections: None,
            warnings: Vec::new(),
            suggestions: Vec::new(),
            analyzed_at: None,
            committed_at: None,
        }
    }

    /// Rewrite every `selected` flag as a pure derivation of `selections`.
    ///
    /// For shows, membership in `shows_as_shows`/`shows_as_clocks` also
    /// overrides the confidence-derived show/clock choice, and
    /// `custom_rrules` overrides land on `custom_rrule`.
    pub fn apply_selections(&mut self, selections: Selections) {
        for m in &mut self.media {
            m.selected = selections.selects(&selections.media_ids, &m.source_id);
        }
        for p in &mut self.playlists {
            p.selected = selections.selects(&selections.playlist_ids, &p.source_id);
        }
        for b in &mut self.smart_blocks {
            b.selected = selections.selects(&selections.smart_block_ids, &b.source_id);
        }
        for w in &mut self.webstreams {
            w.selected = selections.selects(&selections.webstream_ids, &w.source_id);
        }
        for s in &mut self.shows {
            s.selected = selections.selects(&selections.show_ids, &s.source_id);
            if selections.shows_as_shows.iter().any(|id| id == &s.source_id) {
                s.create_show = true;
                s.create_clock = false;
            } else if selections.shows_as_clocks.iter().any(|id| id == &s.source_id) {
                s.create_show = false;
                s.create_clock = true;
            }
            if let Some(rrule) = selections.custom_rrules.get(&s.source_id) {
                s.custom_rrule = rrule.clone();
            }
        }
        self.selections = Some(selections);
    }

    /// Count of selected items across every section.
    pub fn selected_count(&self) -> usize {
        self.media.iter().filter(|m| m.selected).count()
            + self.playlists.iter().filter(|p| p.selected).count()
            + self.smart_blocks.iter().filter(|b| b.selected).count()
            + self.shows.iter().filter(|s| s.selected).count()
            + self.webstreams.iter().filter(|w| w.selected).count()
    }
}

#[cfg(test)]
#[path = "staged_tests.rs"]
mod tests;
