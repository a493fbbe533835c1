// SPDX-License-Identifier: MIT

//! Provenance-driven deletion: per-job rollback and full reset.

use crate::db::Catalog;
use crate::error::CatalogError;
use crate::schema::RESET_ORDER;
use airlift_core::ImportedItems;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

/// Delete rows from `table` where `column` is in `ids`. Returns rows
/// affected. No-op for an empty id list.
async fn delete_in(
    conn: &mut SqliteConnection,
    table: &str,
    column: &str,
    ids: &[String],
) -> Result<u64, sqlx::Error> {
    if ids.is_empty() {
        return Ok(0);
    }
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("DELETE FROM {table} WHERE {column} IN ("));
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(id);
    }
    qb.push(")");
    Ok(qb.build().execute(conn).await?.rows_affected())
}

impl Catalog {
    /// Delete everything a job wrote, in FK-dependency order, inside one
    /// transaction. Returns the total number of rows deleted.
    ///
    /// Stations are shared infrastructure and are never deleted here.
    pub async fn rollback_items(&self, items: &ImportedItems) -> Result<u64, CatalogError> {
        let mut tx = self.pool().begin().await?;
        let mut deleted = 0u64;

        deleted += delete_in(&mut tx, "webstreams", "id", &items.webstream_ids).await?;
        deleted += delete_in(&mut tx, "clock_hours", "id", &items.clock_hour_ids).await?;
        deleted += delete_in(&mut tx, "show_instances", "show_id", &items.show_ids).await?;
        deleted += delete_in(&mut tx, "shows", "id", &items.show_ids).await?;
        deleted += delete_in(&mut tx, "playlist_items", "playlist_id", &items.playlist_ids).await?;
        deleted += delete_in(&mut tx, "playlists", "id", &items.playlist_ids).await?;
        deleted += delete_in(&mut tx, "smart_blocks", "id", &items.smart_block_ids).await?;
        deleted += delete_in(&mut tx, "media_tag_links", "media_id", &items.media_ids).await?;
        deleted += delete_in(&mut tx, "media_items", "id", &items.media_ids).await?;

        tx.commit().await?;
        Ok(deleted)
    }

    /// Reconstruct a job's imported-items index from provenance columns.
    ///
    /// Fallback for jobs whose persisted index is missing.
    pub async fn imported_items_for_job(
        &self,
        job_id: &str,
    ) -> Result<ImportedItems, CatalogError> {
        async fn ids_for(
            catalog: &Catalog,
            table: &str,
            job_id: &str,
        ) -> Result<Vec<String>, CatalogError> {
            let sql = format!("SELECT id FROM {table} WHERE import_job_id = ?");
            let rows: Vec<(String,)> = sqlx::query_as(&sql)
                .bind(job_id)
                .fetch_all(catalog.pool())
                .await?;
            Ok(rows.into_iter().map(|(id,)| id).collect())
        }

        Ok(ImportedItems {
            media_ids: ids_for(self, "media_items", job_id).await?,
            playlist_ids: ids_for(self, "playlists", job_id).await?,
            smart_block_ids: ids_for(self, "smart_blocks", job_id).await?,
            show_ids: ids_for(self, "shows", job_id).await?,
            clock_hour_ids: ids_for(self, "clock_hours", job_id).await?,
            webstream_ids: ids_for(self, "webstreams", job_id).await?,
        })
    }

    /// Truncate every catalog table in FK-safe order. Destructive,
    /// last-resort. Job history is preserved.
    pub async fn reset_imported_data(&self) -> Result<u64, CatalogError> {
        let mut tx = self.pool().begin().await?;
        let mut deleted = 0u64;
        for table in RESET_ORDER {
            let sql = format!("DELETE FROM {table}");
            deleted += sqlx::query(&sql).execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;
        Ok(deleted)
    }
}

#[cfg(test)]
#[path = "rollback_tests.rs"]
mod tests;
