// SPDX-License-Identifier: MIT

//! Backup bundle adapter: imports from an exported bundle directory
//! (`backup.json` plus media files under `media/`).
//!
//! The reference adapter for the staged workflow. Media files on disk
//! are hashed during enumeration, so duplicate detection and orphan
//! matching work on content rather than metadata alone.

mod manifest;

pub use manifest::{
    BackupManifest, ManifestMedia, ManifestPlaylist, ManifestPlaylistItem, ManifestShow,
    ManifestSmartBlock, ManifestStation, ManifestUser, ManifestWebstream,
};

use crate::analysis::{finalize_staged_import, stage_show, SourceShow};
use crate::commit::run_commit;
use crate::{
    ImportCtx, MediaFetcher, MediaStream, ProgressFn, SourceAdapter, SourceError, StagedSource,
    ValidationErrors,
};
use airlift_catalog::hash_file;
use airlift_core::{
    parse_duration_secs_lenient, IdGen, ImportResult, JobOptions, StagedImport, StagedMedia,
    StagedPlaylist, StagedPlaylistItem, StagedSmartBlock, StagedWebstream, StationBranding,
    UuidIdGen,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Source-type tag the adapter registers under.
pub const SOURCE_TYPE: &str = "bundle";

/// The manifest file expected at the bundle root.
const MANIFEST_NAME: &str = "backup.json";

/// One enumerated media file.
#[derive(Debug, Clone)]
struct MediaFile {
    /// Path relative to the media dir; doubles as the source id.
    source_id: String,
    path: PathBuf,
    size: u64,
    content_hash: String,
}

/// An opened bundle: manifest plus the enumerated media files.
///
/// Opened per job and dropped at job end.
#[derive(Debug)]
pub struct BundleSource {
    manifest: BackupManifest,
    files: Vec<MediaFile>,
}

/// Resolve the bundle root and media directory from the options bag.
fn resolve_paths(options: &JobOptions) -> Result<(PathBuf, PathBuf), SourceError> {
    let root = options
        .source_opt("backup_path")
        .ok_or_else(|| SourceError::Malformed("backup_path option is required".to_string()))?;
    let root = PathBuf::from(root);
    let media_dir = match options.source_opt("media_path") {
        Some(dir) => PathBuf::from(dir),
        None => root.join("media"),
    };
    Ok((root, media_dir))
}

impl BundleSource {
    pub async fn open(options: &JobOptions) -> Result<Self, SourceError> {
        let (root, media_dir) = resolve_paths(options)?;

        let raw = tokio::fs::read_to_string(root.join(MANIFEST_NAME))
            .await
            .map_err(|err| {
                SourceError::Malformed(format!("cannot read {MANIFEST_NAME}: {err}"))
            })?;
        let manifest: BackupManifest = serde_json::from_str(&raw)
            .map_err(|err| SourceError::Malformed(format!("invalid {MANIFEST_NAME}: {err}")))?;

        let files = enumerate_media(&media_dir).await?;
        Ok(Self { manifest, files })
    }

    fn branding(&self) -> Option<StationBranding> {
        self.manifest.station.as_ref().map(|s| StationBranding {
            name: s.name.clone(),
            short_code: s.short_code.clone(),
            description: s.description.clone(),
        })
    }

    /// Staged media rows: one per file on disk, enriched from the
    /// manifest when it lists the file.
    fn staged_media(&self) -> Vec<StagedMedia> {
        let by_path: HashMap<&str, &ManifestMedia> = self
            .manifest
            .media
            .iter()
            .map(|m| (m.path.as_str(), m))
            .collect();

        self.files
            .iter()
            .map(|file| {
                let meta = by_path.get(file.source_id.as_str());
                let title = meta
                    .map(|m| m.title.clone())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| file_stem(&file.path));
                StagedMedia {
                    source_id: file.source_id.clone(),
                    title,
                    artist: meta.map(|m| m.artist.clone()).unwrap_or_default(),
                    album: meta.map(|m| m.album.clone()).unwrap_or_default(),
                    genre: meta.map(|m| m.genre.clone()).unwrap_or_default(),
                    duration_ms: meta
                        .map(|m| parse_duration_secs_lenient(&m.duration) as i64 * 1000)
                        .unwrap_or(0),
                    file_path: file.path.to_string_lossy().to_string(),
                    file_size: file.size as i64,
                    content_hash: file.content_hash.clone(),
                    ..StagedMedia::default()
                }
            })
            .collect()
    }

    fn staged_playlists(&self) -> Vec<StagedPlaylist> {
        self.manifest
            .playlists
            .iter()
            .map(|p| StagedPlaylist {
                source_id: p.id.clone(),
                name: p.name.clone(),
                description: p.description.clone(),
                items: p
                    .items
                    .iter()
                    .map(|i| StagedPlaylistItem {
                        media_source_id: i.media.clone(),
                        fade_in: i.fade_in.clone(),
                        fade_out: i.fade_out.clone(),
                    })
                    .collect(),
                selected: false,
            })
            .collect()
    }

    fn staged_smart_blocks(&self) -> Vec<StagedSmartBlock> {
        self.manifest
            .smart_blocks
            .iter()
            .map(|b| StagedSmartBlock {
                source_id: b.id.clone(),
                name: b.name.clone(),
                criteria: b.criteria.clone(),
                selected: false,
            })
            .collect()
    }

    fn source_shows(&self) -> Vec<SourceShow> {
        self.manifest
            .shows
            .iter()
            .map(|s| SourceShow {
                source_id: s.id.clone(),
                name: s.name.clone(),
                description: s.description.clone(),
                instances: s.instances.clone(),
            })
            .collect()
    }

    fn staged_webstreams(&self) -> Vec<StagedWebstream> {
        self.manifest
            .webstreams
            .iter()
            .map(|w| StagedWebstream {
                source_id: w.id.clone(),
                name: w.name.clone(),
                description: w.description.clone(),
                url: w.url.clone(),
                selected: false,
            })
            .collect()
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Walk the media directory, hashing every file. Sorted by relative
/// path so repeated analyses enumerate identically.
async fn enumerate_media(media_dir: &Path) -> Result<Vec<MediaFile>, SourceError> {
    let mut files = Vec::new();
    if !media_dir.is_dir() {
        return Ok(files);
    }
    let mut pending = vec![media_dir.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
                continue;
            }
            let source_id = match path.strip_prefix(media_dir) {
                Ok(rel) => rel.to_string_lossy().to_string(),
                Err(_) => continue,
            };
            let size = entry.metadata().await?.len();
            let content_hash = hash_file(&path).await?;
            files.push(MediaFile {
                source_id,
                path,
                size,
                content_hash,
            });
        }
    }
    files.sort_by(|a, b| a.source_id.cmp(&b.source_id));
    Ok(files)
}

#[async_trait]
impl MediaFetcher for BundleSource {
    async fn download_file(&self, source_id: &str) -> Result<(MediaStream, u64), SourceError> {
        let file = self
            .files
            .iter()
            .find(|f| f.source_id == source_id)
            .ok_or_else(|| SourceError::Transport(format!("no such media file: {source_id}")))?;
        let handle = tokio::fs::File::open(&file.path).await?;
        Ok((Box::new(handle), file.size))
    }
}

/// Adapter over exported bundle directories.
#[derive(Debug, Clone, Default)]
pub struct BundleAdapter;

impl BundleAdapter {
    async fn build_staged(
        &self,
        ctx: &ImportCtx,
        source: &BundleSource,
        job_id: &str,
        options: &JobOptions,
    ) -> Result<StagedImport, SourceError> {
        let mut staged = StagedImport::new(UuidIdGen.next(), job_id);
        staged.branding = source.branding();

        if !options.skip_media {
            staged.media = source.staged_media();
        }
        if !options.skip_playlists {
            staged.playlists = source.staged_playlists();
        }
        if !options.skip_smartblocks {
            staged.smart_blocks = source.staged_smart_blocks();
        }
        if !options.skip_schedules {
            staged.shows = source.source_shows().into_iter().map(stage_show).collect();
        }
        if !options.skip_webstreams {
            staged.webstreams = source.staged_webstreams();
        }

        finalize_staged_import(
            &mut staged,
            ctx,
            options.target_station_id.as_deref(),
            Utc::now(),
        )
        .await?;
        Ok(staged)
    }
}

#[async_trait]
impl SourceAdapter for BundleAdapter {
    fn source_type(&self) -> &'static str {
        SOURCE_TYPE
    }

    async fn validate(&self, options: &JobOptions) -> Result<(), SourceError> {
        let mut errors = ValidationErrors::default();
        match options.source_opt("backup_path") {
            None => errors.push("backup_path option is required"),
            Some(path) => {
                let root = Path::new(path);
                if !root.is_dir() {
                    errors.push(format!("backup_path is not a directory: {path}"));
                } else if !root.join(MANIFEST_NAME).is_file() {
                    errors.push(format!("{MANIFEST_NAME} not found under {path}"));
                }
            }
        }
        errors.into_result()
    }

    async fn analyze(&self, options: &JobOptions) -> Result<ImportResult, SourceError> {
        let source = BundleSource::open(options).await?;
        let mut result = ImportResult::default();
        if !options.skip_media {
            result.media_imported = source.files.len() as u64;
        }
        if !options.skip_playlists {
            result.playlists_imported = source.manifest.playlists.len() as u64;
        }
        if !options.skip_smartblocks {
            result.smart_blocks_imported = source.manifest.smart_blocks.len() as u64;
        }
        if !options.skip_schedules {
            result.schedules_created = source.manifest.shows.len() as u64;
        }
        if !options.skip_webstreams {
            result.webstreams_imported = source.manifest.webstreams.len() as u64;
        }
        Ok(result)
    }

    async fn import(
        &self,
        ctx: &ImportCtx,
        options: &JobOptions,
        progress: &ProgressFn,
    ) -> Result<ImportResult, SourceError> {
        // Fast path: stage with default selections, then commit.
        let job_id = options.job_id.clone().unwrap_or_default();
        let source = BundleSource::open(options).await?;
        let mut staged = self.build_staged(ctx, &source, &job_id, options).await?;
        run_commit(
            ctx,
            std::sync::Arc::new(source),
            &mut staged,
            &job_id,
            SOURCE_TYPE,
            options,
            progress,
        )
        .await
    }

    fn staging(&self) -> Option<&dyn StagedSource> {
        Some(self)
    }
}

#[async_trait]
impl StagedSource for BundleAdapter {
    async fn analyze_for_staging(
        &self,
        ctx: &ImportCtx,
        job_id: &str,
        options: &JobOptions,
    ) -> Result<StagedImport, SourceError> {
        let source = BundleSource::open(options).await?;
        self.build_staged(ctx, &source, job_id, options).await
    }

    async fn commit_staged_import(
        &self,
        ctx: &ImportCtx,
        staged: &mut StagedImport,
        job_id: &str,
        options: &JobOptions,
        progress: &ProgressFn,
    ) -> Result<ImportResult, SourceError> {
        let source = BundleSource::open(options).await?;
        run_commit(
            ctx,
            std::sync::Arc::new(source),
            staged,
            job_id,
            SOURCE_TYPE,
            options,
            progress,
        )
        .await
    }
}

#[cfg(test)]
#[path = "bundle_tests.rs"]
mod tests;
