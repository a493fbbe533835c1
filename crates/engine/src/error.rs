// SPDX-License-Identifier: MIT

//! Error types for the migration service.

use airlift_catalog::CatalogError;
use thiserror::Error;

/// Errors surfaced synchronously from service operations.
///
/// Failures inside a running job never surface here; they land on the
/// job record as a terminal status plus error text.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("unknown source type: {0}")]
    UnknownSource(String),
    #[error("job not found: {0}")]
    JobNotFound(String),
    #[error("staged import not found: {0}")]
    StagedNotFound(String),
    #[error("job {job_id} is {actual}; {action} requires {required}")]
    InvalidState {
        job_id: String,
        action: &'static str,
        required: &'static str,
        actual: String,
    },
    #[error("staged import {staged_id} is {actual}; {action} requires {required}")]
    InvalidStagedState {
        staged_id: String,
        action: &'static str,
        required: &'static str,
        actual: String,
    },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("adapter {0} does not support staged imports")]
    StagingUnsupported(String),
    #[error("job {0} is running; delete is forbidden")]
    JobRunning(String),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}
