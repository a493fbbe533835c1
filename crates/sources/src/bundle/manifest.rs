// SPDX-License-Identifier: MIT

//! Backup bundle manifest (`backup.json`) model.
//!
//! Every section is optional; media files on disk are authoritative and
//! the manifest only enriches them with metadata, keyed by their path
//! relative to the media directory.

use airlift_core::ShowInstance;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupManifest {
    #[serde(default)]
    pub station: Option<ManifestStation>,
    #[serde(default)]
    pub users: Vec<ManifestUser>,
    #[serde(default)]
    pub media: Vec<ManifestMedia>,
    #[serde(default)]
    pub playlists: Vec<ManifestPlaylist>,
    #[serde(default)]
    pub smart_blocks: Vec<ManifestSmartBlock>,
    #[serde(default)]
    pub shows: Vec<ManifestShow>,
    #[serde(default)]
    pub webstreams: Vec<ManifestWebstream>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestStation {
    pub name: String,
    #[serde(default)]
    pub short_code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestUser {
    pub login: String,
    #[serde(default)]
    pub role: String,
}

/// Metadata for one media file, keyed by path relative to `media/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestMedia {
    pub path: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub genre: String,
    /// `HH:MM:SS` or `HH:MM:SS.mmm`.
    #[serde(default)]
    pub duration: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestPlaylist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub items: Vec<ManifestPlaylistItem>,
}

/// One playlist entry referencing a media file by its relative path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestPlaylistItem {
    pub media: String,
    #[serde(default)]
    pub fade_in: String,
    #[serde(default)]
    pub fade_out: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestSmartBlock {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub criteria: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestShow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instances: Vec<ShowInstance>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestWebstream {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
}
