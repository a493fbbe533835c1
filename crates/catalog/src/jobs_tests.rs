// SPDX-License-Identifier: MIT

use super::*;
use airlift_core::{JobOptions, JobStatus, StagedMedia, StagedStatus};

fn job(id: &str) -> Job {
    Job::new(id, JobOptions::new("bundle"), Utc::now())
}

#[tokio::test]
async fn save_and_load_jobs() {
    let catalog = Catalog::open_in_memory().await.unwrap();
    catalog.save_job(&job("job-1")).await.unwrap();
    catalog.save_job(&job("job-2")).await.unwrap();

    let jobs = catalog.load_jobs().await.unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].id, "job-1");
    assert_eq!(jobs[0].status, JobStatus::Pending);
}

#[tokio::test]
async fn save_job_upserts() {
    let catalog = Catalog::open_in_memory().await.unwrap();
    let mut j = job("job-1");
    catalog.save_job(&j).await.unwrap();

    j.status = JobStatus::Running;
    j.error = Some("midway".to_string());
    catalog.save_job(&j).await.unwrap();

    let jobs = catalog.load_jobs().await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, JobStatus::Running);
    assert_eq!(jobs[0].error.as_deref(), Some("midway"));
}

#[tokio::test]
async fn delete_job_row_removes_it() {
    let catalog = Catalog::open_in_memory().await.unwrap();
    catalog.save_job(&job("job-1")).await.unwrap();
    catalog.delete_job_row("job-1").await.unwrap();
    assert!(catalog.load_jobs().await.unwrap().is_empty());
}

#[tokio::test]
async fn staged_import_round_trip() {
    let catalog = Catalog::open_in_memory().await.unwrap();
    let mut staged = StagedImport::new("staged-1", "job-1");
    staged.media.push(StagedMedia {
        source_id: "src-1".to_string(),
        title: "Track".to_string(),
        ..StagedMedia::default()
    });
    staged.status = StagedStatus::Ready;
    catalog.save_staged_import(&staged).await.unwrap();

    let loaded = catalog.load_staged_import("staged-1").await.unwrap();
    assert_eq!(loaded.job_id, "job-1");
    assert_eq!(loaded.status, StagedStatus::Ready);
    assert_eq!(loaded.media.len(), 1);
}

#[tokio::test]
async fn staged_import_missing_is_not_found() {
    let catalog = Catalog::open_in_memory().await.unwrap();
    let err = catalog.load_staged_import("nope").await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
}

#[tokio::test]
async fn staged_import_delete() {
    let catalog = Catalog::open_in_memory().await.unwrap();
    let staged = StagedImport::new("staged-1", "job-1");
    catalog.save_staged_import(&staged).await.unwrap();
    catalog.delete_staged_import("staged-1").await.unwrap();
    assert!(catalog.load_staged_import("staged-1").await.is_err());
}
