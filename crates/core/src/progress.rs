// SPDX-License-Identifier: MIT

//! Job progress snapshot with bounded step history and ETA estimation.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Step history is bounded so long media imports cannot grow a job record
/// without limit.
pub const MAX_STEP_HISTORY: usize = 50;

/// One `(phase, step)` transition, kept for UI replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEntry {
    pub phase: String,
    pub step: String,
    pub at_ms: u64,
}

/// Point-in-time view of a running job's progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub current_step: String,
    #[serde(default)]
    pub total_steps: u64,
    #[serde(default)]
    pub completed_steps: u64,
    #[serde(default)]
    pub percentage: f64,
    /// Free-form counters (media downloaded, playlists written, ...).
    #[serde(default)]
    pub counters: IndexMap<String, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_remaining_secs: Option<u64>,
    /// Distinct `(phase, step)` transitions, capped at [`MAX_STEP_HISTORY`].
    #[serde(default)]
    pub step_history: Vec<StepEntry>,
}

impl ProgressSnapshot {
    /// Record a progress tick.
    ///
    /// Percentage derives from `completed/total`; the step history extends
    /// only when the `(phase, step)` pair actually changes, and never past
    /// [`MAX_STEP_HISTORY`] entries.
    pub fn record(
        &mut self,
        phase: &str,
        step: &str,
        completed_steps: u64,
        total_steps: u64,
        now: DateTime<Utc>,
    ) {
        if self.start_time.is_none() {
            self.start_time = Some(now);
        }

        let changed = self.phase != phase || self.current_step != step;
        if changed && self.step_history.len() < MAX_STEP_HISTORY {
            self.step_history.push(StepEntry {
                phase: phase.to_string(),
                step: step.to_string(),
                at_ms: now.timestamp_millis().max(0) as u64,
            });
        }

        self.phase = phase.to_string();
        self.current_step = step.to_string();
        self.completed_steps = completed_steps;
        self.total_steps = total_steps;
        self.percentage = if total_steps == 0 {
            0.0
        } else {
            (completed_steps as f64 / total_steps as f64) * 100.0
        };
        self.estimated_remaining_secs = self
            .start_time
            .and_then(|start| estimate_remaining_secs(start, now, completed_steps, total_steps));
    }

    pub fn set_counter(&mut self, key: &str, value: u64) {
        self.counters.insert(key.to_string(), value);
    }
}

/// Estimate remaining seconds from elapsed time and completed/total counts.
///
/// Returns `None` until at least one step completes.
pub fn estimate_remaining_secs(
    start: DateTime<Utc>,
    now: DateTime<Utc>,
    completed: u64,
    total: u64,
) -> Option<u64> {
    if completed == 0 || total <= completed {
        return if total == completed && total > 0 {
            Some(0)
        } else {
            None
        };
    }
    let elapsed = (now - start).num_seconds().max(0) as f64;
    let per_step = elapsed / completed as f64;
    Some((per_step * (total - completed) as f64).round() as u64)
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
