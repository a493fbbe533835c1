// SPDX-License-Identifier: MIT

//! Event payloads published on the migration bus.

use crate::job::JobStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The single bus topic every lifecycle and progress event publishes to.
pub const MIGRATION_TOPIC: &str = "migration";

/// One bus payload: job id, status, plus free-form contextual fields
/// (`progress`, `percentage`, `result`, `error`, `staged_id`,
/// `items_deleted`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationEvent {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

impl MigrationEvent {
    pub fn new(job_id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            job_id: job_id.into(),
            status,
            fields: serde_json::Map::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
