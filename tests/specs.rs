//! Behavioral specifications for the migration orchestrator.
//!
//! These tests are end-to-end: a real bundle directory on disk, a real
//! SQLite catalog, and the full service driving the bundle adapter.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/staged_analysis.rs"]
mod staged_analysis;

#[path = "specs/commit_rollback.rs"]
mod commit_rollback;

#[path = "specs/dedup_rerun.rs"]
mod dedup_rerun;
