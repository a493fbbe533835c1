// SPDX-License-Identifier: MIT

//! Blob storage interface for media bytes.

use crate::error::CatalogError;
use async_trait::async_trait;
use std::path::PathBuf;

/// Storage backend for media file bytes.
///
/// Keys are opaque to callers; the catalog persists them on media rows
/// and derives public URLs from them.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Store the bytes for one media row; returns the storage key.
    async fn store(
        &self,
        station_id: &str,
        media_id: &str,
        bytes: &[u8],
    ) -> Result<String, CatalogError>;

    /// Public URL for a stored key.
    fn url(&self, key: &str) -> String;
}

/// Filesystem-backed blob store: keys are `<station>/<media>` paths under
/// a root directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    base_url: String,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn store(
        &self,
        station_id: &str,
        media_id: &str,
        bytes: &[u8],
    ) -> Result<String, CatalogError> {
        let key = format!("{station_id}/{media_id}");
        let path = self.root.join(&key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(key = %key, size = bytes.len(), "stored media blob");
        Ok(key)
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
