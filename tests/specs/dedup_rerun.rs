//! Re-running analysis against a populated catalog: duplicates by hash,
//! orphan adoption from files already on blob storage.

use crate::prelude::*;
use airlift_core::JobStatus;

fn manifest_with_media() -> serde_json::Value {
    serde_json::json!({
        "station": {"name": "Radio One", "short_code": "r1"},
        "media": [
            {"path": "one.mp3", "title": "Track One", "artist": "Artist A", "duration": "00:03:00"},
            {"path": "two.mp3", "title": "Track Two", "artist": "Artist B", "duration": "00:04:00"}
        ]
    })
}

const MEDIA: &[(&str, &[u8])] = &[
    ("one.mp3", b"bytes of track one"),
    ("two.mp3", b"bytes of track two"),
];

async fn run_staged_to_completion(h: &SpecHarness) -> String {
    let job = h.service.create_staged_job(h.options()).await.unwrap();
    h.service.start_staged_job(&job.id).await.unwrap();
    wait_for_status(&h.service, &job.id, JobStatus::Staged).await;
    let staged_id = h.service.get_job(&job.id).unwrap().staged_import_id.unwrap();
    h.service.commit_staged_import(&staged_id).await.unwrap();
    wait_for_status(&h.service, &job.id, JobStatus::Completed).await;
    job.id
}

#[tokio::test]
async fn second_analysis_flags_committed_media_as_duplicates() {
    let h = harness(manifest_with_media(), MEDIA).await;
    run_staged_to_completion(&h).await;

    // Same bundle again: everything already lives in the catalog.
    let job = h.service.create_staged_job(h.options()).await.unwrap();
    h.service.start_staged_job(&job.id).await.unwrap();
    wait_for_status(&h.service, &job.id, JobStatus::Staged).await;
    let staged_id = h.service.get_job(&job.id).unwrap().staged_import_id.unwrap();

    let staged = h.service.get_staged_import(&staged_id).await.unwrap();
    assert!(staged.media.iter().all(|m| m.is_duplicate));
    assert!(staged.media.iter().all(|m| !m.duplicate_of_id.is_empty()));
    // Duplicates are deselected by default and the warning says so.
    assert!(staged.media.iter().all(|m| !m.selected));
    assert!(staged.warnings.iter().any(|w| w.code == "duplicate_media"));
    assert!(staged
        .suggestions
        .iter()
        .any(|s| s.action == "skip_duplicates"));
}

#[tokio::test]
async fn committing_only_duplicates_writes_no_media() {
    let h = harness(manifest_with_media(), MEDIA).await;
    run_staged_to_completion(&h).await;

    let job = h.service.create_staged_job(h.options()).await.unwrap();
    h.service.start_staged_job(&job.id).await.unwrap();
    wait_for_status(&h.service, &job.id, JobStatus::Staged).await;
    let staged_id = h.service.get_job(&job.id).unwrap().staged_import_id.unwrap();

    // Default selections already excluded the duplicates.
    h.service.commit_staged_import(&staged_id).await.unwrap();
    wait_for_status(&h.service, &job.id, JobStatus::Completed).await;

    let result = h.service.get_job(&job.id).unwrap().result.unwrap();
    assert_eq!(result.media_imported, 0);
}

#[tokio::test]
async fn files_on_storage_without_rows_are_adopted_as_orphans() {
    let h = harness(manifest_with_media(), MEDIA).await;

    // Drop the file bytes onto blob storage with no owning row, as a
    // previous half-finished migration would leave them.
    let legacy = h.blob_dir.path().join("legacy");
    tokio::fs::create_dir_all(&legacy).await.unwrap();
    tokio::fs::write(legacy.join("one.mp3"), b"bytes of track one")
        .await
        .unwrap();

    let job = h.service.create_staged_job(h.options()).await.unwrap();
    h.service.start_staged_job(&job.id).await.unwrap();
    wait_for_status(&h.service, &job.id, JobStatus::Staged).await;
    let staged_id = h.service.get_job(&job.id).unwrap().staged_import_id.unwrap();

    let staged = h.service.get_staged_import(&staged_id).await.unwrap();
    let one = staged
        .media
        .iter()
        .find(|m| m.source_id == "one.mp3")
        .unwrap();
    assert!(one.orphan_match);
    assert_eq!(one.orphan_id, "legacy/one.mp3");
    let two = staged
        .media
        .iter()
        .find(|m| m.source_id == "two.mp3")
        .unwrap();
    assert!(!two.orphan_match);

    h.service.commit_staged_import(&staged_id).await.unwrap();
    wait_for_status(&h.service, &job.id, JobStatus::Completed).await;

    let result = h.service.get_job(&job.id).unwrap().result.unwrap();
    assert_eq!(result.media_imported, 2);
    assert_eq!(result.skipped.get("media_orphans_adopted"), Some(&1));

    // The adopted row points at the pre-existing storage key.
    let items = h.catalog.imported_items_for_job(&job.id).await.unwrap();
    let mut keys = Vec::new();
    for id in &items.media_ids {
        keys.push(h.catalog.get_media(id).await.unwrap().storage_key);
    }
    assert!(keys.contains(&"legacy/one.mp3".to_string()));
}
