// SPDX-License-Identifier: MIT

//! The commit pipeline: replay selected staged items into the catalog.
//!
//! Media route through the bounded downloader, get hash-checked against
//! existing rows (link instead of store) or adopted from orphaned files,
//! and land as provenance-stamped rows. Dependent sections (playlists)
//! resolve media references through the per-run mapping. Commit is not
//! one transaction: every insert stands alone, item failures are counted
//! and skipped, and a partial commit stays recoverable through
//! provenance.

use crate::download::{download_all, DownloadOutcome};
use crate::verify::verify_durations;
use crate::{ImportCtx, MediaFetcher, ProgressFn, ProgressUpdate, SourceError};
use airlift_catalog::{
    ClockHour, Mount, MediaItem, Playlist, PlaylistItem, Provenance, Show, SmartBlock, Station,
    Webstream,
};
use airlift_core::{
    parse_fade_ms, IdGen, ImportResult, JobOptions, Mapping, StagedImport, StagedMedia,
    StagedStatus, UuidIdGen,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// Default mount parameters for a newly created station.
const MOUNT_FORMAT: &str = "mp3";
const MOUNT_BITRATE: i64 = 128;
const MOUNT_CHANNELS: i64 = 2;
const MOUNT_SAMPLE_RATE: i64 = 44_100;

struct CommitRun<'a> {
    ctx: &'a ImportCtx,
    ids: UuidIdGen,
    job_id: &'a str,
    source_tag: &'a str,
    station_id: String,
    result: ImportResult,
    /// source media id -> new catalog media id
    media_map: HashMap<String, String>,
    now: DateTime<Utc>,
}

impl CommitRun<'_> {
    fn provenance(&self, source_id: &str) -> Provenance {
        Provenance::new(self.job_id, self.source_tag, source_id)
    }

    fn map_media(&mut self, staged: &StagedMedia, new_id: &str) {
        self.media_map
            .insert(staged.source_id.clone(), new_id.to_string());
        self.result.mappings.push(Mapping {
            old_id: staged.source_id.clone(),
            new_id: new_id.to_string(),
            kind: "media".to_string(),
            name: staged.title.clone(),
        });
    }
}

/// Run the commit for one staged import.
///
/// Writes only `selected` items. On success the artifact is marked
/// committed; the caller persists it and records the job's imported
/// items from provenance.
pub async fn run_commit(
    ctx: &ImportCtx,
    fetcher: Arc<dyn MediaFetcher>,
    staged: &mut StagedImport,
    job_id: &str,
    source_tag: &str,
    options: &JobOptions,
    progress: &ProgressFn,
) -> Result<ImportResult, SourceError> {
    ctx.check_cancelled()?;

    let mut run = CommitRun {
        ctx,
        ids: UuidIdGen,
        job_id,
        source_tag,
        station_id: String::new(),
        result: ImportResult::default(),
        media_map: HashMap::new(),
        now: Utc::now(),
    };

    setup_station(&mut run, staged, options, progress).await?;

    if !options.skip_media {
        commit_media(&mut run, staged, fetcher, progress).await?;
    }
    if !options.skip_playlists {
        commit_playlists(&mut run, staged, progress).await?;
    }
    if !options.skip_smartblocks {
        commit_smart_blocks(&mut run, staged).await?;
    }
    if !options.skip_schedules {
        commit_shows(&mut run, staged).await?;
    }
    if !options.skip_webstreams {
        commit_webstreams(&mut run, staged).await?;
    }

    emit(progress, "commit", "verify", 1, 1, &run.result);
    verify_durations(
        &ctx.catalog,
        job_id,
        options.strict_durations,
        &mut run.result,
    )
    .await?;

    staged.status = StagedStatus::Committed;
    staged.committed_at = Some(Utc::now());

    tracing::info!(
        job_id,
        media = run.result.media_imported,
        playlists = run.result.playlists_imported,
        schedules = run.result.schedules_created,
        skipped = run.result.total_skipped(),
        "commit complete"
    );
    Ok(run.result)
}

fn emit(
    progress: &ProgressFn,
    phase: &str,
    step: &str,
    completed: u64,
    total: u64,
    result: &ImportResult,
) {
    progress(ProgressUpdate {
        phase: phase.to_string(),
        step: step.to_string(),
        completed,
        total,
        counters: vec![
            ("media_imported".to_string(), result.media_imported),
            ("skipped".to_string(), result.total_skipped()),
        ],
    });
}

/// Reuse the configured target station or create one from source
/// branding, with a default mount and the importing user as owner.
async fn setup_station(
    run: &mut CommitRun<'_>,
    staged: &StagedImport,
    options: &JobOptions,
    progress: &ProgressFn,
) -> Result<(), SourceError> {
    emit(progress, "commit", "station", 0, 1, &run.result);

    if let Some(target) = &options.target_station_id {
        // Must exist; a dangling id cannot be imported into.
        run.ctx
            .catalog
            .get_station(target)
            .await
            .map_err(|_| SourceError::Malformed(format!("no target station mapping: {target}")))?;
        run.station_id = target.clone();
        return Ok(());
    }

    let branding = staged.branding.clone().unwrap_or_default();
    let station = Station {
        id: run.ids.next(),
        name: if branding.name.is_empty() {
            "Imported Station".to_string()
        } else {
            branding.name
        },
        short_code: branding.short_code,
        description: branding.description,
        owner_user_id: options.importing_user_id.clone(),
        created_at: run.now,
    };
    run.ctx.catalog.insert_station(&station).await?;

    let mount_name = if station.short_code.is_empty() {
        station.name.clone()
    } else {
        station.short_code.clone()
    };
    let mount = Mount {
        id: run.ids.next(),
        station_id: station.id.clone(),
        name: mount_name.clone(),
        url: format!("/live/{mount_name}"),
        format: MOUNT_FORMAT.to_string(),
        bitrate: MOUNT_BITRATE,
        channels: MOUNT_CHANNELS,
        sample_rate: MOUNT_SAMPLE_RATE,
        created_at: run.now,
    };
    run.ctx.catalog.insert_mount(&mount).await?;

    run.station_id = station.id;
    run.result.stations_created += 1;
    Ok(())
}

async fn commit_media(
    run: &mut CommitRun<'_>,
    staged: &StagedImport,
    fetcher: Arc<dyn MediaFetcher>,
    progress: &ProgressFn,
) -> Result<(), SourceError> {
    let selected: Vec<&StagedMedia> = staged.media.iter().filter(|m| m.selected).collect();
    let total = selected.len() as u64;
    let mut processed = 0u64;

    // Orphan adoptions go first; nothing to download for them.
    let mut to_download: Vec<&StagedMedia> = Vec::new();
    for media in selected {
        if media.orphan_match && run.ctx.orphans.is_some() {
            run.ctx.check_cancelled()?;
            adopt_orphan(run, media).await;
            processed += 1;
            emit(progress, "commit", "media", processed, total, &run.result);
        } else {
            to_download.push(media);
        }
    }

    let by_source: HashMap<&str, &StagedMedia> = to_download
        .iter()
        .map(|m| (m.source_id.as_str(), *m))
        .collect();
    let ids: Vec<String> = to_download.iter().map(|m| m.source_id.clone()).collect();
    let mut outcomes = download_all(fetcher, ids, run.ctx.cancel.clone());

    // Results arrive in completion order; DB writes stay serial here.
    while let Some(outcome) = outcomes.recv().await {
        run.ctx.check_cancelled()?;
        if let Some(media) = by_source.get(outcome.source_id.as_str()).copied() {
            store_downloaded(run, media, outcome).await;
        }
        processed += 1;
        emit(progress, "commit", "media", processed, total, &run.result);
    }
    Ok(())
}

/// Adopt an on-disk orphan: a new row pointing at the existing storage
/// key, metadata from the staged record.
async fn adopt_orphan(run: &mut CommitRun<'_>, media: &StagedMedia) {
    let id = run.ids.next();
    let row = media_row(run, &id, media, &media.content_hash, media.file_size);
    let row = MediaItem {
        storage_key: media.orphan_id.clone(),
        url: run.ctx.store.url(&media.orphan_id),
        ..row
    };
    match run.ctx.catalog.insert_media(&row).await {
        Ok(()) => {
            run.result.skip("media_orphans_adopted");
            run.result.media_imported += 1;
            run.map_media(media, &id);
            insert_genre_tag(run, &id, &media.genre).await;
        }
        Err(err) => {
            run.result.skip("media_insert_failed");
            run.result
                .warn(format!("media {:?}: insert failed: {err}", media.title));
        }
    }
}

/// Write one downloaded file: link against an existing row with the same
/// hash, or store the bytes and mint a new storage key.
async fn store_downloaded(run: &mut CommitRun<'_>, media: &StagedMedia, outcome: DownloadOutcome) {
    if let Some((kind, message)) = &outcome.error {
        run.result.skip(kind.bucket());
        run.result.warn(format!(
            "media {:?}: download failed: {message}",
            media.title
        ));
        return;
    }

    let id = run.ids.next();
    let size = outcome.bytes.len() as i64;

    let existing = match run
        .ctx
        .catalog
        .find_media_storage_by_hash(&outcome.content_hash, &run.station_id)
        .await
    {
        Ok(existing) => existing,
        Err(err) => {
            run.result.skip("media_insert_failed");
            run.result
                .warn(format!("media {:?}: dedup lookup failed: {err}", media.title));
            return;
        }
    };

    let (storage_key, url) = match existing {
        // Identical bytes already stored: link, don't copy.
        Some(dup) => {
            run.result.skip("media_deduplicated");
            (dup.storage_key, dup.url)
        }
        None => {
            let key = match run
                .ctx
                .store
                .store(&run.station_id, &id, &outcome.bytes)
                .await
            {
                Ok(key) => key,
                Err(err) => {
                    run.result.skip("media_store_failed");
                    run.result
                        .warn(format!("media {:?}: store failed: {err}", media.title));
                    return;
                }
            };
            let url = run.ctx.store.url(&key);
            (key, url)
        }
    };

    let row = media_row(run, &id, media, &outcome.content_hash, size);
    let row = MediaItem {
        storage_key,
        url,
        ..row
    };
    match run.ctx.catalog.insert_media(&row).await {
        Ok(()) => {
            run.result.media_imported += 1;
            run.map_media(media, &id);
            insert_genre_tag(run, &id, &media.genre).await;
        }
        Err(err) => {
            run.result.skip("media_insert_failed");
            run.result
                .warn(format!("media {:?}: insert failed: {err}", media.title));
        }
    }
}

fn media_row(
    run: &CommitRun<'_>,
    id: &str,
    media: &StagedMedia,
    content_hash: &str,
    file_size: i64,
) -> MediaItem {
    let prov = run.provenance(&media.source_id);
    MediaItem {
        id: id.to_string(),
        station_id: run.station_id.clone(),
        title: media.title.clone(),
        artist: media.artist.clone(),
        album: media.album.clone(),
        genre: media.genre.clone(),
        duration_ms: media.duration_ms,
        file_size,
        content_hash: content_hash.to_string(),
        storage_key: String::new(),
        url: String::new(),
        import_job_id: prov.job_id,
        import_source: prov.source,
        import_source_id: prov.source_id,
        created_at: run.now,
    }
}

async fn insert_genre_tag(run: &mut CommitRun<'_>, media_id: &str, genre: &str) {
    if genre.is_empty() {
        return;
    }
    let tag_id = run.ids.next();
    if let Err(err) = run
        .ctx
        .catalog
        .insert_media_tag(&tag_id, media_id, "genre", genre)
        .await
    {
        run.result.skip("media_tag_insert_failed");
        run.result.warn(format!("tag link failed: {err}"));
    }
}

async fn commit_playlists(
    run: &mut CommitRun<'_>,
    staged: &StagedImport,
    progress: &ProgressFn,
) -> Result<(), SourceError> {
    let selected: Vec<_> = staged.playlists.iter().filter(|p| p.selected).collect();
    let total = selected.len() as u64;

    for (done, playlist) in selected.into_iter().enumerate() {
        run.ctx.check_cancelled()?;
        let id = run.ids.next();
        let row = Playlist {
            id: id.clone(),
            station_id: run.station_id.clone(),
            name: playlist.name.clone(),
            description: playlist.description.clone(),
            provenance: run.provenance(&playlist.source_id),
            created_at: run.now,
        };
        if let Err(err) = run.ctx.catalog.insert_playlist(&row).await {
            run.result.skip("playlist_insert_failed");
            run.result
                .warn(format!("playlist {:?}: insert failed: {err}", playlist.name));
            continue;
        }

        for (position, item) in playlist.items.iter().enumerate() {
            let Some(media_id) = run.media_map.get(&item.media_source_id).cloned() else {
                run.result.skip("playlist_items_no_media");
                continue;
            };
            let item_row = PlaylistItem {
                id: run.ids.next(),
                playlist_id: id.clone(),
                media_id,
                position: position as i64,
                fade_in_ms: parse_fade_ms(&item.fade_in) as i64,
                fade_out_ms: parse_fade_ms(&item.fade_out) as i64,
            };
            if let Err(err) = run.ctx.catalog.insert_playlist_item(&item_row).await {
                run.result.skip("playlist_item_insert_failed");
                run.result.warn(format!(
                    "playlist {:?}: item insert failed: {err}",
                    playlist.name
                ));
            }
        }

        run.result.playlists_imported += 1;
        run.result.mappings.push(Mapping {
            old_id: playlist.source_id.clone(),
            new_id: id,
            kind: "playlist".to_string(),
            name: playlist.name.clone(),
        });
        emit(
            progress,
            "commit",
            "playlists",
            done as u64 + 1,
            total,
            &run.result,
        );
    }
    Ok(())
}

async fn commit_smart_blocks(
    run: &mut CommitRun<'_>,
    staged: &StagedImport,
) -> Result<(), SourceError> {
    for block in staged.smart_blocks.iter().filter(|b| b.selected) {
        run.ctx.check_cancelled()?;
        let id = run.ids.next();
        let row = SmartBlock {
            id: id.clone(),
            station_id: run.station_id.clone(),
            name: block.name.clone(),
            criteria: block.criteria.clone(),
            // Source sequence settings are not exposed; defaults apply.
            track_order: "random".to_string(),
            track_limit: 10,
            repeat_tracks: false,
            provenance: run.provenance(&block.source_id),
            created_at: run.now,
        };
        match run.ctx.catalog.insert_smart_block(&row).await {
            Ok(()) => {
                run.result.smart_blocks_imported += 1;
                run.result.mappings.push(Mapping {
                    old_id: block.source_id.clone(),
                    new_id: id,
                    kind: "smart_block".to_string(),
                    name: block.name.clone(),
                });
            }
            Err(err) => {
                run.result.skip("smart_block_insert_failed");
                run.result
                    .warn(format!("smart block {:?}: insert failed: {err}", block.name));
            }
        }
    }
    Ok(())
}

async fn commit_shows(run: &mut CommitRun<'_>, staged: &StagedImport) -> Result<(), SourceError> {
    for show in staged.shows.iter().filter(|s| s.selected) {
        run.ctx.check_cancelled()?;
        let rrule = if show.custom_rrule.is_empty() {
            show.rrule.clone()
        } else {
            show.custom_rrule.clone()
        };
        let id = run.ids.next();

        let insert = if show.create_show && !rrule.is_empty() {
            run.ctx
                .catalog
                .insert_show(&Show {
                    id: id.clone(),
                    station_id: run.station_id.clone(),
                    name: show.name.clone(),
                    description: show.description.clone(),
                    rrule,
                    dtstart: show.dtstart,
                    timezone: show.timezone.clone(),
                    duration_minutes: show.duration_minutes,
                    provenance: run.provenance(&show.source_id),
                    created_at: run.now,
                })
                .await
                .map(|()| "show")
        } else {
            run.ctx
                .catalog
                .insert_clock_hour(&ClockHour {
                    id: id.clone(),
                    station_id: run.station_id.clone(),
                    name: show.name.clone(),
                    description: show.description.clone(),
                    provenance: run.provenance(&show.source_id),
                    created_at: run.now,
                })
                .await
                .map(|()| "clock_hour")
        };

        match insert {
            Ok(kind) => {
                run.result.schedules_created += 1;
                run.result.mappings.push(Mapping {
                    old_id: show.source_id.clone(),
                    new_id: id,
                    kind: kind.to_string(),
                    name: show.name.clone(),
                });
            }
            Err(err) => {
                run.result.skip("show_insert_failed");
                run.result
                    .warn(format!("show {:?}: insert failed: {err}", show.name));
            }
        }
    }
    Ok(())
}

async fn commit_webstreams(
    run: &mut CommitRun<'_>,
    staged: &StagedImport,
) -> Result<(), SourceError> {
    for stream in staged.webstreams.iter().filter(|w| w.selected) {
        run.ctx.check_cancelled()?;
        let id = run.ids.next();
        let row = Webstream {
            id: id.clone(),
            station_id: run.station_id.clone(),
            name: stream.name.clone(),
            description: stream.description.clone(),
            urls: vec![stream.url.clone()],
            active: true,
            provenance: run.provenance(&stream.source_id),
            created_at: run.now,
        };
        match run.ctx.catalog.insert_webstream(&row).await {
            Ok(()) => {
                run.result.webstreams_imported += 1;
                run.result.mappings.push(Mapping {
                    old_id: stream.source_id.clone(),
                    new_id: id,
                    kind: "webstream".to_string(),
                    name: stream.name.clone(),
                });
            }
            Err(err) => {
                run.result.skip("webstream_insert_failed");
                run.result
                    .warn(format!("webstream {:?}: insert failed: {err}", stream.name));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "commit_tests.rs"]
mod tests;
