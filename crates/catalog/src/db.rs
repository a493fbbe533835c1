// SPDX-License-Identifier: MIT

//! Catalog handle: connection pool plus schema bootstrap.

use crate::error::CatalogError;
use crate::schema::SCHEMA;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

/// Handle to the target catalog database.
///
/// Cheap to clone; all clones share one pool.
#[derive(Clone)]
pub struct Catalog {
    pool: SqlitePool,
}

impl Catalog {
    /// Open (and bootstrap) a catalog at the given SQLite file path.
    pub async fn open(path: &Path) -> Result<Self, CatalogError> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))
            .map_err(sqlx::Error::from)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        let catalog = Self { pool };
        catalog.bootstrap().await?;
        Ok(catalog)
    }

    /// Open an in-memory catalog.
    ///
    /// The pool is pinned to one connection: each SQLite `:memory:`
    /// connection is its own database.
    pub async fn open_in_memory() -> Result<Self, CatalogError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(sqlx::Error::from)?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let catalog = Self { pool };
        catalog.bootstrap().await?;
        Ok(catalog)
    }

    async fn bootstrap(&self) -> Result<(), CatalogError> {
        for ddl in SCHEMA {
            sqlx::query(ddl).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
