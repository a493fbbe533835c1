//! Full staged commit, provenance accounting, and the rollback law:
//! commit followed by rollback leaves the catalog indistinguishable
//! from the pre-commit state in every provenance-stamped table.

use crate::prelude::*;
use airlift_core::{JobStatus, Selections, StagedStatus};

fn full_manifest() -> serde_json::Value {
    serde_json::json!({
        "station": {"name": "Radio One", "short_code": "r1"},
        "users": [{"login": "dj", "role": "admin"}],
        "media": [
            {"path": "one.mp3", "title": "Track One", "artist": "Artist A",
             "album": "Album A", "genre": "jazz", "duration": "00:03:30"},
            {"path": "two.mp3", "title": "Track Two", "artist": "Artist B",
             "album": "Album B", "genre": "rock", "duration": "00:04:00"}
        ],
        "playlists": [
            {"id": "p1", "name": "Morning",
             "items": [{"media": "one.mp3", "fade_in": "00:00:01"},
                        {"media": "two.mp3", "fade_out": "00:00:02"}]}
        ],
        "smart_blocks": [{"id": "b1", "name": "Jazz Mix", "criteria": {"genre": "jazz"}}],
        "shows": [
            {"id": "sh1", "name": "Breakfast", "instances": [
                {"starts_at": "2024-01-01T08:00:00Z", "ends_at": "2024-01-01T09:00:00Z", "timezone": "UTC"},
                {"starts_at": "2024-01-08T08:00:00Z", "ends_at": "2024-01-08T09:00:00Z", "timezone": "UTC"},
                {"starts_at": "2024-01-15T08:00:00Z", "ends_at": "2024-01-15T09:00:00Z", "timezone": "UTC"},
                {"starts_at": "2024-01-22T08:00:00Z", "ends_at": "2024-01-22T09:00:00Z", "timezone": "UTC"}
            ]}
        ],
        "webstreams": [{"id": "w1", "name": "Relay", "url": "http://stream.example/live"}]
    })
}

const MEDIA: &[(&str, &[u8])] = &[
    ("one.mp3", b"bytes of track one"),
    ("two.mp3", b"bytes of track two"),
];

async fn committed_job(h: &SpecHarness) -> String {
    let job = h.service.create_staged_job(h.options()).await.unwrap();
    h.service.start_staged_job(&job.id).await.unwrap();
    wait_for_status(&h.service, &job.id, JobStatus::Staged).await;
    let staged_id = h.service.get_job(&job.id).unwrap().staged_import_id.unwrap();

    h.service.commit_staged_import(&staged_id).await.unwrap();
    wait_for_status(&h.service, &job.id, JobStatus::Completed).await;
    job.id
}

#[tokio::test]
async fn commit_writes_every_selected_section() {
    let h = harness(full_manifest(), MEDIA).await;
    let job_id = committed_job(&h).await;

    let job = h.service.get_job(&job_id).unwrap();
    let result = job.result.unwrap();
    assert_eq!(result.stations_created, 1);
    assert_eq!(result.media_imported, 2);
    assert_eq!(result.playlists_imported, 1);
    assert_eq!(result.smart_blocks_imported, 1);
    assert_eq!(result.schedules_created, 1);
    assert_eq!(result.webstreams_imported, 1);

    // The detected RRULE landed on the show row.
    let (rrule,): (String,) = sqlx::query_as("SELECT rrule FROM shows")
        .fetch_one(h.catalog.pool())
        .await
        .unwrap();
    assert_eq!(rrule, "FREQ=WEEKLY;BYDAY=MO;BYHOUR=8;BYMINUTE=0");

    // ImportedItems enumerates exactly the provenance-stamped rows.
    let imported = job.imported.unwrap();
    let rebuilt = h.catalog.imported_items_for_job(&job_id).await.unwrap();
    assert_eq!(imported, rebuilt);
    assert_eq!(imported.total(), 6);
}

#[tokio::test]
async fn commit_then_rollback_restores_pre_commit_state() {
    let h = harness(full_manifest(), MEDIA).await;
    let job_id = committed_job(&h).await;

    let deleted = h.service.rollback_import(&job_id).await.unwrap();
    assert!(deleted >= 6);

    assert_eq!(
        h.service.get_job(&job_id).unwrap().status,
        JobStatus::RolledBack
    );

    // No provenance-stamped table still holds a row for the job.
    for table in [
        "media_items",
        "playlists",
        "smart_blocks",
        "shows",
        "clock_hours",
        "webstreams",
    ] {
        assert_eq!(
            h.catalog.count_rows_for_job(table, &job_id).await.unwrap(),
            0,
            "{table} still holds rows for {job_id}"
        );
    }
    // Child tables emptied with their parents.
    for table in ["playlist_items", "media_tag_links"] {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        let (count,): (i64,) = sqlx::query_as(&sql)
            .fetch_one(h.catalog.pool())
            .await
            .unwrap();
        assert_eq!(count, 0, "{table} not empty after rollback");
    }
    // Stations are shared infrastructure and survive.
    let (stations,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stations")
        .fetch_one(h.catalog.pool())
        .await
        .unwrap();
    assert_eq!(stations, 1);
}

#[tokio::test]
async fn redo_after_rollback_reimports_the_catalog() {
    let h = harness(full_manifest(), MEDIA).await;
    let job_id = committed_job(&h).await;
    h.service.rollback_import(&job_id).await.unwrap();

    let redo = h.service.clone_job_for_redo(&job_id).await.unwrap();
    assert_eq!(redo.redo_of_job_id.as_deref(), Some(job_id.as_str()));
    assert_eq!(redo.status, JobStatus::Analyzing);

    h.service.start_staged_job(&redo.id).await.unwrap();
    wait_for_status(&h.service, &redo.id, JobStatus::Staged).await;
    let staged_id = h.service.get_job(&redo.id).unwrap().staged_import_id.unwrap();
    h.service.commit_staged_import(&staged_id).await.unwrap();
    wait_for_status(&h.service, &redo.id, JobStatus::Completed).await;

    let rebuilt = h.catalog.imported_items_for_job(&redo.id).await.unwrap();
    assert_eq!(rebuilt.media_ids.len(), 2);
}

#[tokio::test]
async fn selections_narrow_the_commit() {
    let h = harness(full_manifest(), MEDIA).await;
    let job = h.service.create_staged_job(h.options()).await.unwrap();
    h.service.start_staged_job(&job.id).await.unwrap();
    wait_for_status(&h.service, &job.id, JobStatus::Staged).await;
    let staged_id = h.service.get_job(&job.id).unwrap().staged_import_id.unwrap();

    // Keep one media item and the playlist; drop everything else.
    h.service
        .update_selections(
            &staged_id,
            Selections {
                media_ids: vec!["one.mp3".to_string()],
                playlist_ids: vec!["p1".to_string()],
                ..Selections::default()
            },
        )
        .await
        .unwrap();

    h.service.commit_staged_import(&staged_id).await.unwrap();
    wait_for_status(&h.service, &job.id, JobStatus::Completed).await;

    let result = h.service.get_job(&job.id).unwrap().result.unwrap();
    assert_eq!(result.media_imported, 1);
    assert_eq!(result.playlists_imported, 1);
    assert_eq!(result.webstreams_imported, 0);
    assert_eq!(result.schedules_created, 0);
    // The playlist's second entry had no imported media to point at.
    assert_eq!(result.skipped.get("playlist_items_no_media"), Some(&1));

    let staged = h.service.get_staged_import(&staged_id).await.unwrap();
    assert_eq!(staged.status, StagedStatus::Committed);
}
