// SPDX-License-Identifier: MIT

//! Bounded-parallel media downloads with streamed content hashing.
//!
//! A semaphore caps in-flight fetches at [`MAX_CONCURRENT_DOWNLOADS`].
//! Each worker streams its file into a buffer while folding the bytes
//! into a SHA-256 hasher, then emits an outcome on a shared channel.
//! Outcomes arrive in completion order; the channel closes once every
//! worker is done. The consumer side stays serial.

use crate::MediaFetcher;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

/// Upper bound on concurrent in-flight fetches.
pub const MAX_CONCURRENT_DOWNLOADS: usize = 12;

/// Where a failed download went wrong: fetching vs buffering/hashing.
/// Each kind feeds a distinct skip bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadErrorKind {
    Download,
    Read,
}

impl DownloadErrorKind {
    /// Skip-counter bucket for this error kind.
    pub fn bucket(self) -> &'static str {
        match self {
            DownloadErrorKind::Download => "media_download_failed",
            DownloadErrorKind::Read => "media_read_failed",
        }
    }
}

/// Result of one download attempt, successful or not.
#[derive(Debug)]
pub struct DownloadOutcome {
    pub source_id: String,
    pub bytes: Vec<u8>,
    /// SHA-256 of `bytes`, hex-encoded. Empty on error.
    pub content_hash: String,
    pub error: Option<(DownloadErrorKind, String)>,
}

impl DownloadOutcome {
    fn failed(source_id: String, kind: DownloadErrorKind, message: String) -> Self {
        Self {
            source_id,
            bytes: Vec::new(),
            content_hash: String::new(),
            error: Some((kind, message)),
        }
    }
}

/// Fetch every source id with bounded parallelism.
///
/// Returns the receiving end of the outcome channel; it yields results
/// in completion order and closes after the last worker finishes.
/// Workers check the cancellation token before fetching and between
/// read chunks; a cancelled worker reports a `Download` error.
pub fn download_all(
    fetcher: Arc<dyn MediaFetcher>,
    source_ids: Vec<String>,
    cancel: CancellationToken,
) -> mpsc::Receiver<DownloadOutcome> {
    let (tx, rx) = mpsc::channel(source_ids.len().max(1));
    let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_DOWNLOADS));

    for source_id in source_ids {
        let fetcher = Arc::clone(&fetcher);
        let semaphore = Arc::clone(&semaphore);
        let cancel = cancel.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            // Closed semaphore cannot happen; we never close it.
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            let outcome = fetch_one(fetcher.as_ref(), &source_id, &cancel).await;
            let _ = tx.send(outcome).await;
        });
    }

    rx
}

async fn fetch_one(
    fetcher: &dyn MediaFetcher,
    source_id: &str,
    cancel: &CancellationToken,
) -> DownloadOutcome {
    if cancel.is_cancelled() {
        return DownloadOutcome::failed(
            source_id.to_string(),
            DownloadErrorKind::Download,
            "cancelled".to_string(),
        );
    }

    let (mut stream, size) = match fetcher.download_file(source_id).await {
        Ok(pair) => pair,
        Err(err) => {
            return DownloadOutcome::failed(
                source_id.to_string(),
                DownloadErrorKind::Download,
                err.to_string(),
            );
        }
    };

    let mut bytes = Vec::with_capacity(size as usize);
    let mut hasher = Sha256::new();
    let mut chunk = vec![0u8; 64 * 1024];
    loop {
        if cancel.is_cancelled() {
            return DownloadOutcome::failed(
                source_id.to_string(),
                DownloadErrorKind::Download,
                "cancelled".to_string(),
            );
        }
        match stream.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                hasher.update(&chunk[..n]);
                bytes.extend_from_slice(&chunk[..n]);
            }
            Err(err) => {
                return DownloadOutcome::failed(
                    source_id.to_string(),
                    DownloadErrorKind::Read,
                    err.to_string(),
                );
            }
        }
    }

    DownloadOutcome {
        source_id: source_id.to_string(),
        content_hash: format!("{:x}", hasher.finalize()),
        bytes,
        error: None,
    }
}

/// Hash a byte slice the same way the download path does.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
#[path = "download_tests.rs"]
mod tests;
