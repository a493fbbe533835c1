// SPDX-License-Identifier: MIT

//! Remaining catalog entities: stations, mounts, playlists, smart blocks,
//! shows, clock hours, webstreams.

use crate::db::Catalog;
use crate::error::CatalogError;
use crate::media::Provenance;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub short_code: String,
    pub description: String,
    pub owner_user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Streaming endpoint attached to a station.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Mount {
    pub id: String,
    pub station_id: String,
    pub name: String,
    pub url: String,
    pub format: String,
    pub bitrate: i64,
    pub channels: i64,
    pub sample_rate: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct Playlist {
    pub id: String,
    pub station_id: String,
    pub name: String,
    pub description: String,
    pub provenance: Provenance,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct PlaylistItem {
    pub id: String,
    pub playlist_id: String,
    pub media_id: String,
    pub position: i64,
    pub fade_in_ms: i64,
    pub fade_out_ms: i64,
}

#[derive(Debug, Clone, Default)]
pub struct SmartBlock {
    pub id: String,
    pub station_id: String,
    pub name: String,
    /// Raw source criteria, preserved verbatim as JSON.
    pub criteria: serde_json::Value,
    pub track_order: String,
    pub track_limit: i64,
    pub repeat_tracks: bool,
    pub provenance: Provenance,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct Show {
    pub id: String,
    pub station_id: String,
    pub name: String,
    pub description: String,
    pub rrule: String,
    pub dtstart: Option<DateTime<Utc>>,
    pub timezone: String,
    pub duration_minutes: i64,
    pub provenance: Provenance,
    pub created_at: DateTime<Utc>,
}

/// A 60-minute programming template without a concrete schedule.
#[derive(Debug, Clone, Default)]
pub struct ClockHour {
    pub id: String,
    pub station_id: String,
    pub name: String,
    pub description: String,
    pub provenance: Provenance,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct Webstream {
    pub id: String,
    pub station_id: String,
    pub name: String,
    pub description: String,
    pub urls: Vec<String>,
    pub active: bool,
    pub provenance: Provenance,
    pub created_at: DateTime<Utc>,
}

impl Catalog {
    pub async fn insert_station(&self, station: &Station) -> Result<(), CatalogError> {
        sqlx::query(
            "INSERT INTO stations (id, name, short_code, description, owner_user_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&station.id)
        .bind(&station.name)
        .bind(&station.short_code)
        .bind(&station.description)
        .bind(&station.owner_user_id)
        .bind(station.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn get_station(&self, id: &str) -> Result<Station, CatalogError> {
        sqlx::query_as::<_, Station>("SELECT * FROM stations WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| CatalogError::not_found("station", id))
    }

    pub async fn insert_mount(&self, mount: &Mount) -> Result<(), CatalogError> {
        sqlx::query(
            "INSERT INTO mounts (id, station_id, name, url, format, bitrate,
                                 channels, sample_rate, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&mount.id)
        .bind(&mount.station_id)
        .bind(&mount.name)
        .bind(&mount.url)
        .bind(&mount.format)
        .bind(mount.bitrate)
        .bind(mount.channels)
        .bind(mount.sample_rate)
        .bind(mount.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn insert_playlist(&self, playlist: &Playlist) -> Result<(), CatalogError> {
        sqlx::query(
            "INSERT INTO playlists (id, station_id, name, description,
                import_job_id, import_source, import_source_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&playlist.id)
        .bind(&playlist.station_id)
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(&playlist.provenance.job_id)
        .bind(&playlist.provenance.source)
        .bind(&playlist.provenance.source_id)
        .bind(playlist.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn insert_playlist_item(&self, item: &PlaylistItem) -> Result<(), CatalogError> {
        sqlx::query(
            "INSERT INTO playlist_items (id, playlist_id, media_id, position,
                                         fade_in_ms, fade_out_ms)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&item.id)
        .bind(&item.playlist_id)
        .bind(&item.media_id)
        .bind(item.position)
        .bind(item.fade_in_ms)
        .bind(item.fade_out_ms)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn insert_smart_block(&self, block: &SmartBlock) -> Result<(), CatalogError> {
        sqlx::query(
            "INSERT INTO smart_blocks (id, station_id, name, criteria, track_order,
                track_limit, repeat_tracks,
                import_job_id, import_source, import_source_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&block.id)
        .bind(&block.station_id)
        .bind(&block.name)
        .bind(block.criteria.to_string())
        .bind(&block.track_order)
        .bind(block.track_limit)
        .bind(block.repeat_tracks)
        .bind(&block.provenance.job_id)
        .bind(&block.provenance.source)
        .bind(&block.provenance.source_id)
        .bind(block.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn insert_show(&self, show: &Show) -> Result<(), CatalogError> {
        sqlx::query(
            "INSERT INTO shows (id, station_id, name, description, rrule, dtstart,
                timezone, duration_minutes,
                import_job_id, import_source, import_source_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&show.id)
        .bind(&show.station_id)
        .bind(&show.name)
        .bind(&show.description)
        .bind(&show.rrule)
        .bind(show.dtstart)
        .bind(&show.timezone)
        .bind(show.duration_minutes)
        .bind(&show.provenance.job_id)
        .bind(&show.provenance.source)
        .bind(&show.provenance.source_id)
        .bind(show.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn insert_clock_hour(&self, clock: &ClockHour) -> Result<(), CatalogError> {
        sqlx::query(
            "INSERT INTO clock_hours (id, station_id, name, description,
                import_job_id, import_source, import_source_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&clock.id)
        .bind(&clock.station_id)
        .bind(&clock.name)
        .bind(&clock.description)
        .bind(&clock.provenance.job_id)
        .bind(&clock.provenance.source)
        .bind(&clock.provenance.source_id)
        .bind(clock.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn insert_webstream(&self, stream: &Webstream) -> Result<(), CatalogError> {
        sqlx::query(
            "INSERT INTO webstreams (id, station_id, name, description, urls, active,
                import_job_id, import_source, import_source_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&stream.id)
        .bind(&stream.station_id)
        .bind(&stream.name)
        .bind(&stream.description)
        .bind(serde_json::to_string(&stream.urls)?)
        .bind(stream.active)
        .bind(&stream.provenance.job_id)
        .bind(&stream.provenance.source)
        .bind(&stream.provenance.source_id)
        .bind(stream.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Row count in a provenance-stamped table for one job. Test and
    /// verification helper.
    pub async fn count_rows_for_job(
        &self,
        table: &str,
        job_id: &str,
    ) -> Result<i64, CatalogError> {
        let sql = format!("SELECT COUNT(*) FROM {table} WHERE import_job_id = ?");
        let (count,): (i64,) = sqlx::query_as(&sql)
            .bind(job_id)
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }
}
