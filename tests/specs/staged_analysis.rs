//! Staged analysis over a real bundle directory.

use crate::prelude::*;
use airlift_core::{JobStatus, StagedStatus};

#[tokio::test]
async fn staged_job_reaches_staged_with_ready_artifact() {
    // One station, one user, two media files.
    let h = harness(
        station_manifest(),
        &[("one.mp3", b"bytes of one"), ("two.mp3", b"bytes of two")],
    )
    .await;

    let job = h.service.create_staged_job(h.options()).await.unwrap();
    assert_eq!(job.status, JobStatus::Analyzing);

    h.service.start_staged_job(&job.id).await.unwrap();
    wait_for_status(&h.service, &job.id, JobStatus::Staged).await;

    let staged_id = h
        .service
        .get_job(&job.id)
        .unwrap()
        .staged_import_id
        .expect("job carries a staged import id");
    assert!(!staged_id.is_empty());

    let staged = h.service.get_staged_import(&staged_id).await.unwrap();
    assert_eq!(staged.status, StagedStatus::Ready);
    assert_eq!(staged.media.len(), 2);
    assert!(staged.media.iter().all(|m| m.selected));
    assert!(staged.media.iter().all(|m| !m.content_hash.is_empty()));
    assert_eq!(
        staged.branding.as_ref().map(|b| b.name.as_str()),
        Some("Radio One")
    );
}

#[tokio::test]
async fn analysis_twice_converges_on_a_fixed_snapshot() {
    let h = harness(
        station_manifest(),
        &[("one.mp3", b"bytes of one"), ("two.mp3", b"bytes of two")],
    )
    .await;

    let mut staged_ids = Vec::new();
    for _ in 0..2 {
        let job = h.service.create_staged_job(h.options()).await.unwrap();
        h.service.start_staged_job(&job.id).await.unwrap();
        wait_for_status(&h.service, &job.id, JobStatus::Staged).await;
        staged_ids.push(h.service.get_job(&job.id).unwrap().staged_import_id.unwrap());
    }

    let first = h.service.get_staged_import(&staged_ids[0]).await.unwrap();
    let second = h.service.get_staged_import(&staged_ids[1]).await.unwrap();

    assert_eq!(first.media.len(), second.media.len());
    for (a, b) in first.media.iter().zip(&second.media) {
        assert_eq!(a.source_id, b.source_id);
        assert_eq!(a.content_hash, b.content_hash);
        assert_eq!(a.is_duplicate, b.is_duplicate);
        assert_eq!(a.orphan_match, b.orphan_match);
    }
    assert_eq!(first.warnings.len(), second.warnings.len());
}

#[tokio::test]
async fn rejecting_the_artifact_cancels_the_job() {
    let h = harness(station_manifest(), &[("one.mp3", b"bytes of one")]).await;

    let job = h.service.create_staged_job(h.options()).await.unwrap();
    h.service.start_staged_job(&job.id).await.unwrap();
    wait_for_status(&h.service, &job.id, JobStatus::Staged).await;
    let staged_id = h.service.get_job(&job.id).unwrap().staged_import_id.unwrap();

    h.service.reject_staged_import(&staged_id).await.unwrap();

    assert_eq!(
        h.service.get_job(&job.id).unwrap().status,
        JobStatus::Cancelled
    );
    let staged = h.service.get_staged_import(&staged_id).await.unwrap();
    assert_eq!(staged.status, StagedStatus::Rejected);
    assert!(h
        .catalog
        .imported_items_for_job(&job.id)
        .await
        .unwrap()
        .is_empty());
}
