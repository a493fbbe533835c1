// SPDX-License-Identifier: MIT

//! Canned in-memory adapter for tests.
//!
//! Carries scripted sections and media bytes, optional failure
//! injection, and instruments downloads so tests can assert the
//! concurrency bound.

use crate::analysis::{finalize_staged_import, stage_show, SourceShow};
use crate::commit::run_commit;
use crate::download::content_hash;
use crate::{
    ImportCtx, MediaFetcher, MediaStream, ProgressFn, SourceAdapter, SourceError, StagedSource,
    ValidationErrors,
};
use airlift_core::{
    IdGen, ImportResult, JobOptions, ShowInstance, StagedImport, StagedMedia, StagedPlaylist,
    StagedPlaylistItem, StagedSmartBlock, StagedWebstream, StationBranding, UuidIdGen,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Source-type tag the fake registers under.
pub const SOURCE_TYPE: &str = "fake";

#[derive(Default)]
struct Inner {
    media: Vec<(StagedMedia, Vec<u8>)>,
    playlists: Vec<StagedPlaylist>,
    smart_blocks: Vec<StagedSmartBlock>,
    shows: Vec<SourceShow>,
    webstreams: Vec<StagedWebstream>,
    branding: Option<StationBranding>,
    fail_downloads: HashSet<String>,
    validate_error: Option<String>,
    download_delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    downloaded: Mutex<Vec<String>>,
}

/// Scriptable adapter with canned data.
#[derive(Clone, Default)]
pub struct FakeAdapter {
    inner: Arc<Inner>,
}

impl FakeAdapter {
    pub fn new() -> FakeAdapterBuilder {
        FakeAdapterBuilder {
            inner: Inner::default(),
        }
    }

    /// Highest number of downloads that were in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }

    /// Source ids downloaded so far, in completion order of the fetch
    /// call.
    pub fn downloaded(&self) -> Vec<String> {
        self.inner.downloaded.lock().clone()
    }
}

pub struct FakeAdapterBuilder {
    inner: Inner,
}

impl FakeAdapterBuilder {
    /// Add a media item with the given bytes; hash and size derive from
    /// the bytes.
    pub fn media(mut self, source_id: &str, title: &str, bytes: &[u8]) -> Self {
        let staged = StagedMedia {
            source_id: source_id.to_string(),
            title: title.to_string(),
            file_size: bytes.len() as i64,
            content_hash: content_hash(bytes),
            duration_ms: 180_000,
            ..StagedMedia::default()
        };
        self.inner.media.push((staged, bytes.to_vec()));
        self
    }

    /// Add a media item with full control over the staged record.
    pub fn media_record(mut self, staged: StagedMedia, bytes: &[u8]) -> Self {
        self.inner.media.push((staged, bytes.to_vec()));
        self
    }

    pub fn playlist(mut self, source_id: &str, name: &str, media_ids: &[&str]) -> Self {
        self.inner.playlists.push(StagedPlaylist {
            source_id: source_id.to_string(),
            name: name.to_string(),
            items: media_ids
                .iter()
                .map(|id| StagedPlaylistItem {
                    media_source_id: id.to_string(),
                    ..StagedPlaylistItem::default()
                })
                .collect(),
            ..StagedPlaylist::default()
        });
        self
    }

    pub fn smart_block(mut self, source_id: &str, name: &str, criteria: serde_json::Value) -> Self {
        self.inner.smart_blocks.push(StagedSmartBlock {
            source_id: source_id.to_string(),
            name: name.to_string(),
            criteria,
            ..StagedSmartBlock::default()
        });
        self
    }

    pub fn show(mut self, source_id: &str, name: &str, instances: Vec<ShowInstance>) -> Self {
        self.inner.shows.push(SourceShow {
            source_id: source_id.to_string(),
            name: name.to_string(),
            description: String::new(),
            instances,
        });
        self
    }

    pub fn webstream(mut self, source_id: &str, name: &str, url: &str) -> Self {
        self.inner.webstreams.push(StagedWebstream {
            source_id: source_id.to_string(),
            name: name.to_string(),
            url: url.to_string(),
            ..StagedWebstream::default()
        });
        self
    }

    pub fn branding(mut self, name: &str, short_code: &str) -> Self {
        self.inner.branding = Some(StationBranding {
            name: name.to_string(),
            short_code: short_code.to_string(),
            description: String::new(),
        });
        self
    }

    /// Make downloads of this source id fail with a transport error.
    pub fn failing_download(mut self, source_id: &str) -> Self {
        self.inner.fail_downloads.insert(source_id.to_string());
        self
    }

    /// Make validation fail with this message.
    pub fn invalid(mut self, message: &str) -> Self {
        self.inner.validate_error = Some(message.to_string());
        self
    }

    /// Hold each download open for this long, so concurrency is
    /// observable.
    pub fn download_delay(mut self, delay: Duration) -> Self {
        self.inner.download_delay = Some(delay);
        self
    }

    pub fn build(self) -> FakeAdapter {
        FakeAdapter {
            inner: Arc::new(self.inner),
        }
    }
}

impl FakeAdapter {
    async fn build_staged(
        &self,
        ctx: &ImportCtx,
        job_id: &str,
        options: &JobOptions,
    ) -> Result<StagedImport, SourceError> {
        let mut staged = StagedImport::new(UuidIdGen.next(), job_id);
        staged.branding = self.inner.branding.clone();

        if !options.skip_media {
            staged.media = self.inner.media.iter().map(|(m, _)| m.clone()).collect();
        }
        if !options.skip_playlists {
            staged.playlists = self.inner.playlists.clone();
        }
        if !options.skip_smartblocks {
            staged.smart_blocks = self.inner.smart_blocks.clone();
        }
        if !options.skip_schedules {
            staged.shows = self
                .inner
                .shows
                .iter()
                .cloned()
                .map(stage_show)
                .collect();
        }
        if !options.skip_webstreams {
            staged.webstreams = self.inner.webstreams.clone();
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
impl MediaFetcher for FakeAdapter {
    async fn download_file(&self, source_id: &str) -> Result<(MediaStream, u64), SourceError> {
        let current = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.inner.download_delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.inner.fail_downloads.contains(source_id) {
            return Err(SourceError::Transport(format!(
                "scripted failure for {source_id}"
            )));
        }
        let bytes = self
            .inner
            .media
            .iter()
            .find(|(m, _)| m.source_id == source_id)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| SourceError::Transport(format!("unknown media: {source_id}")))?;
        self.inner.downloaded.lock().push(source_id.to_string());
        let size = bytes.len() as u64;
        Ok((Box::new(std::io::Cursor::new(bytes)), size))
    }
}

#[async_trait]
impl SourceAdapter for FakeAdapter {
    fn source_type(&self) -> &'static str {
        SOURCE_TYPE
    }

    async fn validate(&self, _options: &JobOptions) -> Result<(), SourceError> {
        match &self.inner.validate_error {
            Some(message) => {
                let mut errors = ValidationErrors::default();
                errors.push(message.clone());
                Err(SourceError::Validation(errors))
            }
            None => Ok(()),
        }
    }

    async fn analyze(&self, _options: &JobOptions) -> Result<ImportResult, SourceError> {
        Ok(ImportResult {
            media_imported: self.inner.media.len() as u64,
            playlists_imported: self.inner.playlists.len() as u64,
            smart_blocks_imported: self.inner.smart_blocks.len() as u64,
            schedules_created: self.inner.shows.len() as u64,
            webstreams_imported: self.inner.webstreams.len() as u64,
            ..ImportResult::default()
        })
    }

    async fn import(
        &self,
        ctx: &ImportCtx,
        options: &JobOptions,
        progress: &ProgressFn,
    ) -> Result<ImportResult, SourceError> {
        let job_id = options.job_id.clone().unwrap_or_default();
        let mut staged = self.build_staged(ctx, &job_id, options).await?;
        run_commit(
            ctx,
            Arc::new(self.clone()),
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
impl StagedSource for FakeAdapter {
    async fn analyze_for_staging(
        &self,
        ctx: &ImportCtx,
        job_id: &str,
        options: &JobOptions,
    ) -> Result<StagedImport, SourceError> {
        self.build_staged(ctx, job_id, options).await
    }

    async fn commit_staged_import(
        &self,
        ctx: &ImportCtx,
        staged: &mut StagedImport,
        job_id: &str,
        options: &JobOptions,
        progress: &ProgressFn,
    ) -> Result<ImportResult, SourceError> {
        run_commit(
            ctx,
            Arc::new(self.clone()),
            staged,
            job_id,
            SOURCE_TYPE,
            options,
            progress,
        )
        .await
    }
}
