// SPDX-License-Identifier: MIT

//! Media rows: provenance-stamped inserts and duplicate lookups.

use crate::db::Catalog;
use crate::error::CatalogError;
use airlift_core::MetadataKey;
use chrono::{DateTime, Utc};
use sqlx::QueryBuilder;

/// Provenance triple stamped on every row a commit writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    pub job_id: String,
    pub source: String,
    pub source_id: String,
}

impl Provenance {
    pub fn new(
        job_id: impl Into<String>,
        source: impl Into<String>,
        source_id: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            source: source.into(),
            source_id: source_id.into(),
        }
    }
}

/// One media row as written to the catalog.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct MediaItem {
    pub id: String,
    pub station_id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub duration_ms: i64,
    pub file_size: i64,
    pub content_hash: String,
    pub storage_key: String,
    pub url: String,
    pub import_job_id: String,
    pub import_source: String,
    pub import_source_id: String,
    pub created_at: DateTime<Utc>,
}

/// A hash-stage duplicate hit: existing row id per content hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HashHit {
    pub id: String,
    pub content_hash: String,
}

/// Storage coordinates of an existing row, for hash-linking at commit.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StorageRef {
    pub id: String,
    pub storage_key: String,
    pub url: String,
}

impl Catalog {
    pub async fn insert_media(&self, item: &MediaItem) -> Result<(), CatalogError> {
        sqlx::query(
            "INSERT INTO media_items (
                id, station_id, title, artist, album, genre, duration_ms,
                file_size, content_hash, storage_key, url,
                import_job_id, import_source, import_source_id, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&item.id)
        .bind(&item.station_id)
        .bind(&item.title)
        .bind(&item.artist)
        .bind(&item.album)
        .bind(&item.genre)
        .bind(item.duration_ms)
        .bind(item.file_size)
        .bind(&item.content_hash)
        .bind(&item.storage_key)
        .bind(&item.url)
        .bind(&item.import_job_id)
        .bind(&item.import_source)
        .bind(&item.import_source_id)
        .bind(item.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Record a tag link (genre, mood, ...) against a media row.
    pub async fn insert_media_tag(
        &self,
        id: &str,
        media_id: &str,
        kind: &str,
        value: &str,
    ) -> Result<(), CatalogError> {
        sqlx::query("INSERT INTO media_tag_links (id, media_id, kind, value) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(media_id)
            .bind(kind)
            .bind(value)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    pub async fn get_media(&self, id: &str) -> Result<MediaItem, CatalogError> {
        sqlx::query_as::<_, MediaItem>("SELECT * FROM media_items WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| CatalogError::not_found("media item", id))
    }

    /// Hash-stage duplicate lookup: one query over every candidate hash,
    /// optionally scoped to a station.
    pub async fn find_media_by_hashes(
        &self,
        hashes: &[String],
        station_id: Option<&str>,
    ) -> Result<Vec<HashHit>, CatalogError> {
        if hashes.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("SELECT id, content_hash FROM media_items WHERE content_hash IN (");
        let mut separated = qb.separated(", ");
        for hash in hashes {
            separated.push_bind(hash);
        }
        qb.push(")");
        if let Some(station) = station_id {
            qb.push(" AND station_id = ").push_bind(station);
        }
        qb.push(" ORDER BY created_at ASC");
        Ok(qb.build_query_as::<HashHit>().fetch_all(self.pool()).await?)
    }

    /// Metadata-fallback duplicate lookup over normalized
    /// (title, artist, album), oldest row first.
    ///
    /// The stored columns are normalized in SQL. The triple-REPLACE
    /// collapses runs of up to eight consecutive spaces; longer runs
    /// survive partially (upstream-compatible behavior).
    pub async fn find_media_by_metadata(
        &self,
        key: &MetadataKey,
        station_id: Option<&str>,
    ) -> Result<Option<String>, CatalogError> {
        const NORM_TITLE: &str =
            "LOWER(TRIM(REPLACE(REPLACE(REPLACE(title,'  ',' '),'  ',' '),'  ',' ')))";
        const NORM_ARTIST: &str =
            "LOWER(TRIM(REPLACE(REPLACE(REPLACE(artist,'  ',' '),'  ',' '),'  ',' ')))";
        const NORM_ALBUM: &str =
            "LOWER(TRIM(REPLACE(REPLACE(REPLACE(album,'  ',' '),'  ',' '),'  ',' ')))";

        let mut qb: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new(format!("SELECT id FROM media_items WHERE {NORM_TITLE} = "));
        qb.push_bind(&key.title);
        qb.push(format!(" AND {NORM_ARTIST} = "));
        qb.push_bind(&key.artist);
        qb.push(format!(" AND {NORM_ALBUM} = "));
        qb.push_bind(&key.album);
        if let Some(station) = station_id {
            qb.push(" AND station_id = ").push_bind(station);
        }
        qb.push(" ORDER BY created_at ASC LIMIT 1");

        let id: Option<(String,)> = qb.build_query_as().fetch_optional(self.pool()).await?;
        Ok(id.map(|(id,)| id))
    }

    /// Existing row with this content hash in the station, for storage
    /// linking at commit time.
    pub async fn find_media_storage_by_hash(
        &self,
        content_hash: &str,
        station_id: &str,
    ) -> Result<Option<StorageRef>, CatalogError> {
        Ok(sqlx::query_as::<_, StorageRef>(
            "SELECT id, storage_key, url FROM media_items
             WHERE content_hash = ? AND station_id = ?
             ORDER BY created_at ASC LIMIT 1",
        )
        .bind(content_hash)
        .bind(station_id)
        .fetch_optional(self.pool())
        .await?)
    }

    /// Storage keys of every known media row. Orphan scanning subtracts
    /// these from what it finds on disk.
    pub async fn known_storage_keys(&self) -> Result<Vec<String>, CatalogError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT storage_key FROM media_items WHERE storage_key != ''")
                .fetch_all(self.pool())
                .await?;
        Ok(rows.into_iter().map(|(key,)| key).collect())
    }

    /// Count media rows written by a job, split into zero-duration and
    /// total. Input to the duration verifier.
    pub async fn media_duration_counts(&self, job_id: &str) -> Result<(i64, i64), CatalogError> {
        let (zero, total): (i64, i64) = sqlx::query_as(
            "SELECT
                COALESCE(SUM(CASE WHEN duration_ms = 0 THEN 1 ELSE 0 END), 0),
                COUNT(*)
             FROM media_items WHERE import_job_id = ?",
        )
        .bind(job_id)
        .fetch_one(self.pool())
        .await?;
        Ok((zero, total))
    }
}

#[cfg(test)]
#[path = "media_tests.rs"]
mod tests;
