// SPDX-License-Identifier: MIT

//! Orphan scanning: files present in blob storage with no owning
//! catalog row.
//!
//! The commit pipeline adopts orphans instead of re-downloading when a
//! staged item's content hash matches one.

use crate::db::Catalog;
use crate::error::CatalogError;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

/// One orphaned file: its storage key and absolute location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanFile {
    /// Storage key relative to the blob root; what an adopting media row
    /// points at.
    pub id: String,
    pub path: String,
}

/// Index of on-disk files without catalog rows, keyed by content hash.
#[async_trait]
pub trait OrphanScanner: Send + Sync + 'static {
    async fn build_orphan_hash_map(&self) -> Result<HashMap<String, OrphanFile>, CatalogError>;
}

/// Scans a blob-store root, hashing every file whose storage key is not
/// already owned by a media row.
pub struct FsOrphanScanner {
    root: PathBuf,
    catalog: Catalog,
}

impl FsOrphanScanner {
    pub fn new(root: impl Into<PathBuf>, catalog: Catalog) -> Self {
        Self {
            root: root.into(),
            catalog,
        }
    }
}

/// SHA-256 of a file's bytes, hex-encoded, streamed in 64 KiB chunks.
pub async fn hash_file(path: &Path) -> Result<String, std::io::Error> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[async_trait]
impl OrphanScanner for FsOrphanScanner {
    async fn build_orphan_hash_map(&self) -> Result<HashMap<String, OrphanFile>, CatalogError> {
        let known: std::collections::HashSet<String> =
            self.catalog.known_storage_keys().await?.into_iter().collect();

        let mut orphans = HashMap::new();
        if !self.root.is_dir() {
            return Ok(orphans);
        }

        // Iterative walk; async fns cannot recurse without boxing.
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }
                let key = match path.strip_prefix(&self.root) {
                    Ok(rel) => rel.to_string_lossy().to_string(),
                    Err(_) => continue,
                };
                if known.contains(&key) {
                    continue;
                }
                let hash = hash_file(&path).await?;
                orphans.insert(
                    hash,
                    OrphanFile {
                        id: key,
                        path: path.to_string_lossy().to_string(),
                    },
                );
            }
        }

        tracing::debug!(count = orphans.len(), "orphan scan complete");
        Ok(orphans)
    }
}

#[cfg(test)]
#[path = "orphan_tests.rs"]
mod tests;
