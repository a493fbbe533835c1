// SPDX-License-Identifier: MIT

use super::*;
use crate::fake::FakeAdapter;
use std::time::Duration;

fn adapter_with_tracks(count: usize) -> FakeAdapter {
    let mut builder = FakeAdapter::new().download_delay(Duration::from_millis(25));
    for i in 0..count {
        builder = builder.media(
            &format!("src-{i}"),
            &format!("Track {i}"),
            format!("bytes of track {i}").as_bytes(),
        );
    }
    builder.build()
}

async fn drain(mut rx: tokio::sync::mpsc::Receiver<DownloadOutcome>) -> Vec<DownloadOutcome> {
    let mut outcomes = Vec::new();
    while let Some(outcome) = rx.recv().await {
        outcomes.push(outcome);
    }
    outcomes
}

#[tokio::test]
async fn downloads_all_and_hashes_content() {
    let adapter = adapter_with_tracks(3);
    let ids = vec!["src-0".to_string(), "src-1".to_string(), "src-2".to_string()];

    let rx = download_all(Arc::new(adapter), ids, CancellationToken::new());
    let outcomes = drain(rx).await;

    assert_eq!(outcomes.len(), 3);
    for outcome in &outcomes {
        assert!(outcome.error.is_none());
        let expected = content_hash(&outcome.bytes);
        assert_eq!(outcome.content_hash, expected);
        assert!(!outcome.bytes.is_empty());
    }
}

#[tokio::test]
async fn concurrency_never_exceeds_the_bound() {
    let adapter = adapter_with_tracks(40);
    let ids: Vec<String> = (0..40).map(|i| format!("src-{i}")).collect();

    let rx = download_all(Arc::new(adapter.clone()), ids, CancellationToken::new());
    let outcomes = drain(rx).await;

    assert_eq!(outcomes.len(), 40);
    let max = adapter.max_in_flight();
    assert!(
        max <= MAX_CONCURRENT_DOWNLOADS,
        "observed {max} concurrent downloads"
    );
    // With a per-download delay the pool actually fills up.
    assert!(max > 1, "downloads never overlapped");
}

#[tokio::test]
async fn transport_failure_reports_download_kind() {
    let adapter = FakeAdapter::new()
        .media("good", "Good", b"good bytes")
        .failing_download("bad")
        .build();
    let ids = vec!["good".to_string(), "bad".to_string()];

    let outcomes = drain(download_all(Arc::new(adapter), ids, CancellationToken::new())).await;
    assert_eq!(outcomes.len(), 2);

    let bad = outcomes
        .iter()
        .find(|o| o.source_id == "bad")
        .expect("bad outcome present");
    let (kind, message) = bad.error.as_ref().expect("bad download errored");
    assert_eq!(*kind, DownloadErrorKind::Download);
    assert!(message.contains("scripted failure"));
    assert!(bad.bytes.is_empty());

    let good = outcomes.iter().find(|o| o.source_id == "good").unwrap();
    assert!(good.error.is_none());
}

#[tokio::test]
async fn cancelled_downloads_report_download_kind() {
    let adapter = adapter_with_tracks(4);
    let ids: Vec<String> = (0..4).map(|i| format!("src-{i}")).collect();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let outcomes = drain(download_all(Arc::new(adapter), ids, cancel)).await;

    assert_eq!(outcomes.len(), 4);
    for outcome in &outcomes {
        let (kind, message) = outcome.error.as_ref().expect("cancelled outcome");
        assert_eq!(*kind, DownloadErrorKind::Download);
        assert_eq!(message, "cancelled");
    }
}

#[tokio::test]
async fn empty_input_closes_immediately() {
    let adapter = adapter_with_tracks(0);
    let outcomes = drain(download_all(
        Arc::new(adapter),
        Vec::new(),
        CancellationToken::new(),
    ))
    .await;
    assert!(outcomes.is_empty());
}

#[test]
fn error_kind_buckets() {
    assert_eq!(DownloadErrorKind::Download.bucket(), "media_download_failed");
    assert_eq!(DownloadErrorKind::Read.bucket(), "media_read_failed");
}
