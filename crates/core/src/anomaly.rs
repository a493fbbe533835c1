// SPDX-License-Identifier: MIT

//! Anomaly classification: folds skip counters and warnings into a
//! user-facing report.

use crate::result::ImportResult;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum example strings retained per bucket.
const MAX_EXAMPLES: usize = 5;

/// Coarse classes a skipped entry or warning can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyClass {
    SkippedEntities,
    Duration,
    DuplicateResolution,
    MissingLinks,
}

impl fmt::Display for AnomalyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnomalyClass::SkippedEntities => "skipped_entities",
            AnomalyClass::Duration => "duration",
            AnomalyClass::DuplicateResolution => "duplicate_resolution",
            AnomalyClass::MissingLinks => "missing_links",
        };
        write!(f, "{}", s)
    }
}

/// Running count plus a bounded sample of example strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyBucket {
    pub count: u64,
    #[serde(default)]
    pub examples: Vec<String>,
}

impl AnomalyBucket {
    fn add(&mut self, count: u64, example: &str) {
        self.count += count;
        if self.examples.len() < MAX_EXAMPLES {
            self.examples.push(example.to_string());
        }
    }
}

/// Normalized anomaly report produced after a commit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub classes: IndexMap<AnomalyClass, AnomalyBucket>,
}

impl AnomalyReport {
    pub fn total(&self) -> u64 {
        self.classes.values().map(|b| b.count).sum()
    }

    fn add(&mut self, class: AnomalyClass, count: u64, example: &str) {
        self.classes.entry(class).or_default().add(count, example);
    }
}

/// Classes matched by a skipped-counter key or warning string.
///
/// Case-insensitive substring matching; one entry can emit several classes.
fn classify_token(text: &str) -> Vec<AnomalyClass> {
    let lower = text.to_lowercase();
    let mut classes = Vec::new();
    if lower.contains("duration") {
        classes.push(AnomalyClass::Duration);
    }
    if lower.contains("duplicate") || lower.contains("deduplic") {
        classes.push(AnomalyClass::DuplicateResolution);
    }
    if lower.contains("missing")
        || lower.contains("not_found")
        || lower.contains("not found")
        || lower.contains("no_station")
        || lower.contains("no target station mapping")
        || lower.contains("orphan")
        || lower.contains("link")
    {
        classes.push(AnomalyClass::MissingLinks);
    }
    classes
}

/// Fold a result's skip counters and warnings into an [`AnomalyReport`].
///
/// Returns `None` when nothing anomalous happened.
pub fn classify(result: &ImportResult) -> Option<AnomalyReport> {
    let mut report = AnomalyReport::default();

    for (key, &count) in &result.skipped {
        if key.is_empty() || count == 0 {
            continue;
        }
        let example = format!("{}: {}", key, count);
        // Every non-empty skipped key counts as a skipped entity.
        report.add(AnomalyClass::SkippedEntities, count, &example);
        for class in classify_token(key) {
            report.add(class, count, &example);
        }
    }

    for warning in &result.warnings {
        if warning.is_empty() {
            continue;
        }
        let lower = warning.to_lowercase();
        if lower.contains("skip") || lower.contains("failed") {
            report.add(AnomalyClass::SkippedEntities, 1, warning);
        }
        for class in classify_token(warning) {
            report.add(class, 1, warning);
        }
    }

    if report.total() == 0 {
        None
    } else {
        Some(report)
    }
}

#[cfg(test)]
#[path = "anomaly_tests.rs"]
mod tests;
