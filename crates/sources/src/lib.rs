// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! airlift-sources: the source-adapter contract plus the shared machinery
//! adapters build on: staged analysis passes, the commit pipeline, the
//! bounded concurrent downloader, and the duration verifier.

pub mod analysis;
pub mod bundle;
pub mod commit;
pub mod download;
pub mod verify;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod fake;

use airlift_catalog::{BlobStore, Catalog, CatalogError, OrphanScanner};
use airlift_core::{ImportResult, JobOptions, StagedImport};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub use bundle::BundleAdapter;

/// Default per-request timeout for source HTTP calls, in seconds.
pub const SOURCE_HTTP_TIMEOUT_SECS: u64 = 30;

/// Option failures collected during [`SourceAdapter::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub errors: Vec<String>,
}

impl ValidationErrors {
    pub fn push(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok(())` when no errors were collected.
    pub fn into_result(self) -> Result<(), SourceError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(SourceError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.errors.join("; "))
    }
}

/// Errors from source adapters and the shared import machinery.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("invalid options: {0}")]
    Validation(ValidationErrors),
    #[error("source transport error: {0}")]
    Transport(String),
    #[error("source io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("malformed source data: {0}")]
    Malformed(String),
    #[error("import cancelled")]
    Cancelled,
}

impl SourceError {
    /// Whether this failure was a cooperative cancellation rather than an
    /// actual error.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SourceError::Cancelled)
    }
}

/// Shared handles an adapter operation runs against.
///
/// Built by the orchestrator per job; the cancellation token is the
/// job's and must be checked at every I/O boundary.
#[derive(Clone)]
pub struct ImportCtx {
    pub catalog: Catalog,
    pub store: Arc<dyn BlobStore>,
    /// Orphan adoption is skipped when no scanner is configured.
    pub orphans: Option<Arc<dyn OrphanScanner>>,
    pub cancel: CancellationToken,
}

impl ImportCtx {
    pub fn new(catalog: Catalog, store: Arc<dyn BlobStore>) -> Self {
        Self {
            catalog,
            store,
            orphans: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_orphans(mut self, orphans: Arc<dyn OrphanScanner>) -> Self {
        self.orphans = Some(orphans);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Error out if the job was cancelled.
    pub fn check_cancelled(&self) -> Result<(), SourceError> {
        if self.cancel.is_cancelled() {
            Err(SourceError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Progress tick emitted from inside a running import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressUpdate {
    pub phase: String,
    pub step: String,
    pub completed: u64,
    pub total: u64,
    pub counters: Vec<(String, u64)>,
}

/// Non-blocking progress callback handed to adapter operations.
pub type ProgressFn = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

/// A callback that drops progress on the floor.
pub fn noop_progress() -> ProgressFn {
    Arc::new(|_| {})
}

/// Streaming media payload from a source.
pub type MediaStream = Box<dyn tokio::io::AsyncRead + Send + Unpin>;

/// Streaming fetch of media files by source id.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Returns the byte stream and the expected size, when known.
    async fn download_file(&self, source_id: &str) -> Result<(MediaStream, u64), SourceError>;
}

/// One pluggable source system.
///
/// Adapters are registered with the orchestrator by source-type tag at
/// startup. The staged pair is optional: an adapter returning `None`
/// from [`staging`](SourceAdapter::staging) can only serve non-staged
/// jobs.
#[async_trait]
pub trait SourceAdapter: Send + Sync + 'static {
    /// Tag this adapter registers under (`options.source_type`).
    fn source_type(&self) -> &'static str;

    /// Reject unusable options before any work starts.
    async fn validate(&self, options: &JobOptions) -> Result<(), SourceError>;

    /// Quick prospective counts, no writes.
    async fn analyze(&self, options: &JobOptions) -> Result<ImportResult, SourceError>;

    /// Non-staged fast path: enumerate, resolve, and write in one run.
    async fn import(
        &self,
        ctx: &ImportCtx,
        options: &JobOptions,
        progress: &ProgressFn,
    ) -> Result<ImportResult, SourceError>;

    /// Two-phase support, when the adapter implements it.
    fn staging(&self) -> Option<&dyn StagedSource> {
        None
    }
}

/// The two-phase analyze/commit capability.
#[async_trait]
pub trait StagedSource: Send + Sync {
    /// Enumerate and classify everything into a reviewable artifact.
    /// Must be deterministic on a fixed source snapshot.
    async fn analyze_for_staging(
        &self,
        ctx: &ImportCtx,
        job_id: &str,
        options: &JobOptions,
    ) -> Result<StagedImport, SourceError>;

    /// Replay the selected items into the catalog.
    async fn commit_staged_import(
        &self,
        ctx: &ImportCtx,
        staged: &mut StagedImport,
        job_id: &str,
        options: &JobOptions,
        progress: &ProgressFn,
    ) -> Result<ImportResult, SourceError>;
}
