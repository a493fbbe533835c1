// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! airlift-catalog: SQLite-backed target catalog with provenance-stamped
//! writes, duplicate lookups, job persistence, ordered rollback, blob
//! storage, and orphan scanning.

pub mod db;
pub mod entities;
pub mod error;
pub mod jobs;
pub mod media;
pub mod orphan;
pub mod rollback;
mod schema;
pub mod store;

pub use db::Catalog;
pub use entities::{ClockHour, Mount, Playlist, PlaylistItem, Show, SmartBlock, Station, Webstream};
pub use error::CatalogError;
pub use media::{HashHit, MediaItem, Provenance, StorageRef};
pub use orphan::{hash_file, FsOrphanScanner, OrphanFile, OrphanScanner};
pub use store::{BlobStore, FsBlobStore};
