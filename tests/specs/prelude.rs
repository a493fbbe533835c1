//! Shared fixtures: bundle directories on disk and a fully wired
//! service.

use airlift_catalog::{Catalog, FsBlobStore, FsOrphanScanner};
use airlift_core::{JobOptions, JobStatus};
use airlift_engine::MigrationService;
use airlift_sources::BundleAdapter;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub struct SpecHarness {
    pub service: MigrationService,
    pub catalog: Catalog,
    pub bundle_dir: TempDir,
    pub blob_dir: TempDir,
}

impl SpecHarness {
    pub fn options(&self) -> JobOptions {
        JobOptions::new("bundle").with_source_opt(
            "backup_path",
            self.bundle_dir.path().to_string_lossy().to_string(),
        )
    }
}

/// Write a bundle directory with the given manifest and media files.
pub async fn write_bundle(
    dir: &TempDir,
    manifest: serde_json::Value,
    media: &[(&str, &[u8])],
) {
    tokio::fs::write(
        dir.path().join("backup.json"),
        serde_json::to_vec_pretty(&manifest).unwrap(),
    )
    .await
    .unwrap();
    let media_dir = dir.path().join("media");
    tokio::fs::create_dir_all(&media_dir).await.unwrap();
    for (name, bytes) in media {
        tokio::fs::write(media_dir.join(name), bytes).await.unwrap();
    }
}

/// A manifest with one station and one user, as a backup export would
/// carry.
pub fn station_manifest() -> serde_json::Value {
    serde_json::json!({
        "station": {"name": "Radio One", "short_code": "r1"},
        "users": [{"login": "dj", "role": "admin"}]
    })
}

/// Spin up a catalog, blob store, orphan scanner, and service with the
/// bundle adapter registered.
pub async fn harness(manifest: serde_json::Value, media: &[(&str, &[u8])]) -> SpecHarness {
    let bundle_dir = tempfile::tempdir().unwrap();
    write_bundle(&bundle_dir, manifest, media).await;

    let blob_dir = tempfile::tempdir().unwrap();
    let catalog = Catalog::open_in_memory().await.unwrap();
    let store = Arc::new(FsBlobStore::new(blob_dir.path(), "http://media.example"));
    let scanner = Arc::new(FsOrphanScanner::new(blob_dir.path(), catalog.clone()));

    let service = MigrationService::new(catalog.clone(), store).with_orphans(scanner);
    service.register_adapter(Arc::new(BundleAdapter));

    SpecHarness {
        service,
        catalog,
        bundle_dir,
        blob_dir,
    }
}

/// Poll `get_job` until it reaches `status`, within 3 seconds.
pub async fn wait_for_status(service: &MigrationService, job_id: &str, status: JobStatus) {
    for _ in 0..300 {
        if let Some(job) = service.get_job(job_id) {
            if job.status == status {
                return;
            }
            assert!(
                !(job.status.is_terminal() && job.status != status),
                "job ended {} while waiting for {status} (error: {:?})",
                job.status,
                job.error
            );
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} never reached {status} within 3s");
}
