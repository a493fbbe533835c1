// SPDX-License-Identifier: MIT

use super::*;
use crate::clock::{Clock, FakeClock};

#[test]
fn record_sets_percentage_and_start_time() {
    let clock = FakeClock::new();
    let mut progress = ProgressSnapshot::default();

    progress.record("media", "downloading", 25, 100, clock.now());

    assert_eq!(progress.phase, "media");
    assert_eq!(progress.current_step, "downloading");
    assert!((progress.percentage - 25.0).abs() < f64::EPSILON);
    assert!(progress.start_time.is_some());
}

#[test]
fn zero_total_means_zero_percent() {
    let clock = FakeClock::new();
    let mut progress = ProgressSnapshot::default();
    progress.record("media", "enumerating", 0, 0, clock.now());
    assert_eq!(progress.percentage, 0.0);
}

#[test]
fn history_appends_only_on_distinct_transitions() {
    let clock = FakeClock::new();
    let mut progress = ProgressSnapshot::default();

    progress.record("media", "downloading", 1, 10, clock.now());
    progress.record("media", "downloading", 2, 10, clock.now());
    progress.record("media", "downloading", 3, 10, clock.now());
    progress.record("media", "writing", 4, 10, clock.now());
    progress.record("playlists", "writing", 5, 10, clock.now());

    let entries: Vec<(&str, &str)> = progress
        .step_history
        .iter()
        .map(|e| (e.phase.as_str(), e.step.as_str()))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("media", "downloading"),
            ("media", "writing"),
            ("playlists", "writing"),
        ]
    );
}

#[test]
fn history_never_exceeds_cap() {
    let clock = FakeClock::new();
    let mut progress = ProgressSnapshot::default();

    for i in 0..(MAX_STEP_HISTORY + 20) {
        progress.record("media", &format!("step-{i}"), i as u64, 100, clock.now());
    }

    assert_eq!(progress.step_history.len(), MAX_STEP_HISTORY);
    // Later transitions still update the live fields.
    assert_eq!(
        progress.current_step,
        format!("step-{}", MAX_STEP_HISTORY + 19)
    );
}

#[test]
fn eta_scales_with_elapsed_time() {
    let clock = FakeClock::new();
    let start = clock.now();
    clock.advance_ms(10_000);

    // 10s for 10 of 100 steps -> 90s remaining.
    assert_eq!(
        estimate_remaining_secs(start, clock.now(), 10, 100),
        Some(90)
    );
}

#[test]
fn eta_unknown_before_first_step() {
    let clock = FakeClock::new();
    let start = clock.now();
    clock.advance_ms(5_000);
    assert_eq!(estimate_remaining_secs(start, clock.now(), 0, 100), None);
}

#[test]
fn eta_zero_when_done() {
    let clock = FakeClock::new();
    let start = clock.now();
    clock.advance_ms(5_000);
    assert_eq!(estimate_remaining_secs(start, clock.now(), 50, 50), Some(0));
}

#[test]
fn counters_overwrite_by_key() {
    let mut progress = ProgressSnapshot::default();
    progress.set_counter("media_downloaded", 3);
    progress.set_counter("media_downloaded", 4);
    assert_eq!(progress.counters["media_downloaded"], 4);
}
