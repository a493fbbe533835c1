// SPDX-License-Identifier: MIT

//! Migration job record and status state machine.

use crate::anomaly::AnomalyReport;
use crate::options::JobOptions;
use crate::progress::ProgressSnapshot;
use crate::result::{ImportResult, ImportedItems};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a migration job.
///
/// Legal transitions:
///
/// ```text
/// Pending   → Running → {Completed, Failed, Cancelled}
/// Analyzing → Staged  → Running → {Completed, Failed, Cancelled}
///                  \→ Rejected
/// Completed → RolledBack
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Analyzing,
    Staged,
    Running,
    Completed,
    Failed,
    Cancelled,
    Rejected,
    RolledBack,
}

impl JobStatus {
    /// Check whether a transition from `self` to `next` is legal.
    pub fn can_transition(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Analyzing, Staged)
                | (Analyzing, Failed)
                | (Staged, Running)
                | (Staged, Rejected)
                | (Staged, Cancelled)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Cancelled)
                | (Completed, RolledBack)
        )
    }

    /// Terminal states never transition again, except `Completed → RolledBack`.
    pub fn is_terminal(self) -> bool {
        use JobStatus::*;
        matches!(self, Completed | Failed | Cancelled | Rejected | RolledBack)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Analyzing => "analyzing",
            JobStatus::Staged => "staged",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Rejected => "rejected",
            JobStatus::RolledBack => "rolled_back",
        };
        write!(f, "{}", s)
    }
}

/// One migration attempt.
///
/// Owned exclusively by the orchestrator; the background task running the
/// job is its only writer. External readers receive clones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    /// Tag of the registered source adapter this job reads from.
    pub source_type: String,
    pub options: JobOptions,
    pub status: JobStatus,
    /// True when this job runs the two-phase analyze/commit workflow.
    #[serde(default)]
    pub staged_mode: bool,
    #[serde(default)]
    pub progress: ProgressSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ImportResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomalies: Option<AnomalyReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Staged import produced by analysis (staged jobs only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staged_import_id: Option<String>,
    /// Job this one was cloned from, when created via redo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redo_of_job_id: Option<String>,
    /// Index of every row a completed commit wrote. Sole input to rollback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported: Option<ImportedItems>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a new job in `Pending` (non-staged fast path).
    pub fn new(id: impl Into<String>, options: JobOptions, created_at: DateTime<Utc>) -> Self {
        Self::with_status(id, options, JobStatus::Pending, false, created_at)
    }

    /// Create a new staged-mode job in `Analyzing`.
    pub fn new_staged(
        id: impl Into<String>,
        options: JobOptions,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::with_status(id, options, JobStatus::Analyzing, true, created_at)
    }

    fn with_status(
        id: impl Into<String>,
        options: JobOptions,
        status: JobStatus,
        staged_mode: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            source_type: options.source_type.clone(),
            options,
            status,
            staged_mode,
            progress: ProgressSnapshot::default(),
            result: None,
            anomalies: None,
            error: None,
            staged_import_id: None,
            redo_of_job_id: None,
            imported: None,
            created_at,
            started_at: None,
            completed_at: None,
        }
    }

    /// Whether the job may be deleted (anything but `Running`).
    pub fn is_deletable(&self) -> bool {
        self.status != JobStatus::Running
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
