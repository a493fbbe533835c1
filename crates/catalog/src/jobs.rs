// SPDX-License-Identifier: MIT

//! Job and staged-import persistence.
//!
//! Both live in dedicated tables with the full record serialized as a
//! JSON blob; status is mirrored into its own column so recovery and
//! listing can filter without deserializing.

use crate::db::Catalog;
use crate::error::CatalogError;
use airlift_core::{Job, StagedImport};
use chrono::Utc;

impl Catalog {
    /// Insert or update a job row.
    pub async fn save_job(&self, job: &Job) -> Result<(), CatalogError> {
        let data = serde_json::to_string(job)?;
        sqlx::query(
            "INSERT INTO jobs (id, source_type, status, data, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 status = excluded.status,
                 data = excluded.data,
                 updated_at = excluded.updated_at",
        )
        .bind(&job.id)
        .bind(&job.source_type)
        .bind(job.status.to_string())
        .bind(data)
        .bind(job.created_at)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Load every persisted job, oldest first.
    pub async fn load_jobs(&self) -> Result<Vec<Job>, CatalogError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT data FROM jobs ORDER BY created_at ASC")
                .fetch_all(self.pool())
                .await?;
        let mut jobs = Vec::with_capacity(rows.len());
        for (data,) in rows {
            jobs.push(serde_json::from_str(&data)?);
        }
        Ok(jobs)
    }

    pub async fn delete_job_row(&self, id: &str) -> Result<(), CatalogError> {
        sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Insert or update a staged import row.
    pub async fn save_staged_import(&self, staged: &StagedImport) -> Result<(), CatalogError> {
        let data = serde_json::to_string(staged)?;
        sqlx::query(
            "INSERT INTO staged_imports (id, job_id, status, data, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 status = excluded.status,
                 data = excluded.data,
                 updated_at = excluded.updated_at",
        )
        .bind(&staged.id)
        .bind(&staged.job_id)
        .bind(staged.status.to_string())
        .bind(data)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn load_staged_import(&self, id: &str) -> Result<StagedImport, CatalogError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM staged_imports WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        match row {
            Some((data,)) => Ok(serde_json::from_str(&data)?),
            None => Err(CatalogError::not_found("staged import", id)),
        }
    }

    pub async fn delete_staged_import(&self, id: &str) -> Result<(), CatalogError> {
        sqlx::query("DELETE FROM staged_imports WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
