// SPDX-License-Identifier: MIT

//! Shared staged-analysis passes.
//!
//! Adapters enumerate their source into raw `Staged*` rows (source order
//! preserved), then run these passes to classify duplicates and orphans,
//! detect recurrences, apply default selections, and attach warnings and
//! suggestions. The passes are deterministic on a fixed snapshot, so
//! repeated analyses converge.

use crate::{ImportCtx, SourceError};
use airlift_core::{
    detect_recurrence, MetadataKey, ShowInstance, StagedImport, StagedMedia, StagedShow,
    StagedStatus, StagedSuggestion, StagedWarning, WarningSeverity, CONFIDENCE_THRESHOLD,
};
use airlift_catalog::{Catalog, OrphanFile};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// A show as enumerated from the source: display fields plus the raw
/// instance list the recurrence detector consumes.
#[derive(Debug, Clone, Default)]
pub struct SourceShow {
    pub source_id: String,
    pub name: String,
    pub description: String,
    pub instances: Vec<ShowInstance>,
}

/// Two-stage duplicate detection against the target catalog.
///
/// Hash stage first: one query over every non-empty candidate hash.
/// Metadata fallback second, only for candidates with no hash and both a
/// title and an artist. Station-scoped when `station_id` is given.
/// Marking is idempotent: an existing `is_duplicate` is never rewritten
/// by a later match.
pub async fn detect_duplicates(
    media: &mut [StagedMedia],
    catalog: &Catalog,
    station_id: Option<&str>,
) -> Result<(), SourceError> {
    // Hash stage.
    let mut hashes: Vec<String> = Vec::new();
    for m in media.iter() {
        if !m.content_hash.is_empty() && !hashes.contains(&m.content_hash) {
            hashes.push(m.content_hash.clone());
        }
    }
    let hits = catalog.find_media_by_hashes(&hashes, station_id).await?;
    let mut by_hash: HashMap<&str, &str> = HashMap::new();
    for hit in &hits {
        // Oldest row wins; the query returns rows created_at ascending.
        by_hash.entry(hit.content_hash.as_str()).or_insert(&hit.id);
    }
    for m in media.iter_mut() {
        if m.is_duplicate || m.content_hash.is_empty() {
            continue;
        }
        if let Some(existing) = by_hash.get(m.content_hash.as_str()) {
            m.is_duplicate = true;
            m.duplicate_of_id = existing.to_string();
        }
    }

    // Metadata fallback, one query per distinct normalized key.
    let mut by_key: HashMap<MetadataKey, Option<String>> = HashMap::new();
    for i in 0..media.len() {
        if media[i].is_duplicate || !media[i].content_hash.is_empty() {
            continue;
        }
        let Some(key) = MetadataKey::new(&media[i].title, &media[i].artist, &media[i].album)
        else {
            continue;
        };
        let existing = match by_key.get(&key) {
            Some(cached) => cached.clone(),
            None => {
                let found = catalog.find_media_by_metadata(&key, station_id).await?;
                by_key.insert(key, found.clone());
                found
            }
        };
        if let Some(existing) = existing {
            media[i].is_duplicate = true;
            media[i].duplicate_of_id = existing;
        }
    }

    Ok(())
}

/// Mark non-duplicate candidates whose content hash matches an orphaned
/// file on local storage. Adoption itself happens at commit.
pub fn match_orphans(media: &mut [StagedMedia], orphans: &HashMap<String, OrphanFile>) {
    for m in media.iter_mut() {
        if m.is_duplicate || m.content_hash.is_empty() {
            continue;
        }
        if let Some(orphan) = orphans.get(&m.content_hash) {
            m.orphan_match = true;
            m.orphan_id = orphan.id.clone();
            m.orphan_path = orphan.path.clone();
        }
    }
}

/// Run the recurrence detector over one enumerated show.
pub fn stage_show(show: SourceShow) -> StagedShow {
    let mut staged = StagedShow {
        source_id: show.source_id,
        name: show.name,
        description: show.description,
        instance_count: show.instances.len(),
        timezone: "UTC".to_string(),
        ..StagedShow::default()
    };
    if let Some(result) = detect_recurrence(&show.instances) {
        staged.rrule = result.rrule;
        staged.confidence = result.confidence;
        staged.pattern = result.description;
        staged.dtstart = Some(result.dtstart);
        staged.duration_minutes = result.duration_minutes;
        staged.timezone = result.timezone;
        staged.exception_count = result.exception_count;
    }
    staged
}

/// Default selection policy: every non-duplicate media item, every
/// playlist, smart block and webstream; shows import with their RRULE
/// when detection was confident, as clock templates otherwise.
pub fn apply_default_selections(staged: &mut StagedImport) {
    for m in &mut staged.media {
        m.selected = !m.is_duplicate;
    }
    for p in &mut staged.playlists {
        p.selected = true;
    }
    for b in &mut staged.smart_blocks {
        b.selected = true;
    }
    for w in &mut staged.webstreams {
        w.selected = true;
    }
    for s in &mut staged.shows {
        s.selected = true;
        s.create_show = !s.rrule.is_empty() && s.confidence >= CONFIDENCE_THRESHOLD;
        s.create_clock = !s.create_show;
    }
}

/// Attach analysis warnings: duplicates, low-confidence or undetected
/// schedules, empty playlists.
pub fn build_warnings(staged: &mut StagedImport) {
    let duplicates = staged.media.iter().filter(|m| m.is_duplicate).count();
    if duplicates > 0 {
        staged.warnings.push(StagedWarning {
            code: "duplicate_media".to_string(),
            severity: WarningSeverity::Warning,
            message: format!("{duplicates} media items already exist in the target library"),
        });
    }

    for show in &staged.shows {
        if !show.rrule.is_empty() && show.confidence < CONFIDENCE_THRESHOLD {
            staged.warnings.push(StagedWarning {
                code: "low_confidence_schedule".to_string(),
                severity: WarningSeverity::Warning,
                message: format!(
                    "show {:?} matched {} with confidence {:.2}",
                    show.name, show.pattern, show.confidence
                ),
            });
        } else if show.rrule.is_empty() && show.instance_count > 0 {
            staged.warnings.push(StagedWarning {
                code: "no_schedule_pattern".to_string(),
                severity: WarningSeverity::Warning,
                message: format!(
                    "show {:?} has {} instances but no detectable pattern",
                    show.name, show.instance_count
                ),
            });
        }
    }

    for playlist in &staged.playlists {
        if playlist.items.is_empty() {
            staged.warnings.push(StagedWarning {
                code: "empty_playlists".to_string(),
                severity: WarningSeverity::Info,
                message: format!("playlist {:?} has no items", playlist.name),
            });
        }
    }
}

/// Attach suggested user actions derived from the warnings.
pub fn build_suggestions(staged: &mut StagedImport) {
    if staged.media.iter().any(|m| m.is_duplicate) {
        staged.suggestions.push(StagedSuggestion {
            action: "skip_duplicates".to_string(),
            message: "Duplicate media are deselected by default; review before committing"
                .to_string(),
        });
    }
    if staged
        .shows
        .iter()
        .any(|s| s.rrule.is_empty() || s.confidence < CONFIDENCE_THRESHOLD)
    {
        staged.suggestions.push(StagedSuggestion {
            action: "review_schedules".to_string(),
            message: "Some show schedules were not detected confidently; review the show list"
                .to_string(),
        });
    }
}

/// Run every analysis pass over a freshly enumerated artifact and mark
/// it ready for review.
pub async fn finalize_staged_import(
    staged: &mut StagedImport,
    ctx: &ImportCtx,
    station_id: Option<&str>,
    analyzed_at: DateTime<Utc>,
) -> Result<(), SourceError> {
    ctx.check_cancelled()?;
    detect_duplicates(&mut staged.media, &ctx.catalog, station_id).await?;

    if let Some(scanner) = &ctx.orphans {
        ctx.check_cancelled()?;
        let orphans = scanner.build_orphan_hash_map().await?;
        match_orphans(&mut staged.media, &orphans);
    }

    apply_default_selections(staged);
    build_warnings(staged);
    build_suggestions(staged);

    staged.analyzed_at = Some(analyzed_at);
    staged.status = StagedStatus::Ready;
    Ok(())
}

#[cfg(test)]
#[path = "analysis_tests.rs"]
mod tests;
