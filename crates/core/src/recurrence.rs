// SPDX-License-Identifier: MIT

//! Recurrence detection: derive an iCalendar RRULE from show instances.
//!
//! Instances are grouped by local weekday and start time; the dominant
//! group(s) become the pattern and everything else counts as exceptions.
//! The emitted RRULE uses the `FREQ=DAILY|WEEKLY`, `BYDAY`, `BYHOUR`,
//! `BYMINUTE` subset.
//!
//! The daily-vs-weekly split uses a coarse heuristic (instances spanning
//! five or more distinct weekdays classify as daily), which can read a
//! Mon–Fri show as daily. Kept for compatibility with upstream behavior.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Minimum instances before a pattern is considered at all.
const MIN_INSTANCES: usize = 3;

/// A show is imported with its RRULE when detection confidence reaches
/// this threshold; below it the default is a clock-hour template.
pub const CONFIDENCE_THRESHOLD: f64 = 0.75;

/// One concrete airing of a show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowInstance {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// IANA zone name, e.g. `Europe/Berlin`. Empty or unknown falls back
    /// to UTC.
    #[serde(default)]
    pub timezone: String,
}

/// Output of the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceResult {
    pub rrule: String,
    /// `matched_count / total_instances`, in `[0, 1]`.
    pub confidence: f64,
    /// Human-readable pattern, e.g. "Weekly on Monday at 08:00".
    pub description: String,
    pub dtstart: DateTime<Utc>,
    pub duration_minutes: i64,
    pub timezone: String,
    pub matched_count: usize,
    pub exception_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pattern {
    weekday: Weekday,
    hour: u32,
    minute: u32,
}

/// Two-letter iCalendar abbreviation for a weekday.
fn byday(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "SU",
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "Sunday",
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
    }
}

fn resolve_tz(name: &str) -> Tz {
    name.parse().unwrap_or(Tz::UTC)
}

/// Detect a recurrence pattern across a set of show instances.
///
/// Returns `None` when the pattern is undetermined: fewer than three
/// instances, or no day-time group with at least two members.
pub fn detect(instances: &[ShowInstance]) -> Option<RecurrenceResult> {
    if instances.len() < MIN_INSTANCES {
        return None;
    }

    let mut sorted: Vec<&ShowInstance> = instances.iter().collect();
    sorted.sort_by_key(|i| i.starts_at);

    let total_secs: i64 = sorted
        .iter()
        .map(|i| (i.ends_at - i.starts_at).num_seconds().max(0))
        .sum();
    let avg_secs = total_secs / sorted.len() as i64;

    // Group by local "<Weekday>-HH:MM", preserving first-encounter order so
    // tied patterns emit BYDAY entries deterministically.
    let mut groups: IndexMap<String, (Pattern, usize)> = IndexMap::new();
    let mut seen_weekdays: BTreeSet<u32> = BTreeSet::new();
    for instance in &sorted {
        let tz = resolve_tz(&instance.timezone);
        let local = instance.starts_at.with_timezone(&tz);
        seen_weekdays.insert(local.weekday().num_days_from_sunday());
        let pattern = Pattern {
            weekday: local.weekday(),
            hour: local.hour(),
            minute: local.minute(),
        };
        let key = format!(
            "{}-{:02}:{:02}",
            weekday_name(pattern.weekday),
            pattern.hour,
            pattern.minute
        );
        groups.entry(key).or_insert((pattern, 0)).1 += 1;
    }

    let best_count = groups.values().map(|(_, n)| *n).max()?;
    if best_count < 2 {
        return None;
    }
    let tied: Vec<Pattern> = groups
        .values()
        .filter(|(_, n)| *n == best_count)
        .map(|(p, _)| *p)
        .collect();

    let first = tied[0];
    let pattern_weekdays: BTreeSet<u32> = tied
        .iter()
        .map(|p| p.weekday.num_days_from_sunday())
        .collect();

    let daily = seen_weekdays.len() >= 5 || pattern_weekdays.len() == 7;
    let (rrule, description) = if daily {
        (
            format!("FREQ=DAILY;BYHOUR={};BYMINUTE={}", first.hour, first.minute),
            format!("Daily at {:02}:{:02}", first.hour, first.minute),
        )
    } else {
        // Distinct weekdays in encounter order.
        let mut days: Vec<Weekday> = Vec::new();
        for p in &tied {
            if !days.contains(&p.weekday) {
                days.push(p.weekday);
            }
        }
        let abbrevs: Vec<&str> = days.iter().map(|d| byday(*d)).collect();
        let names: Vec<&str> = days.iter().map(|d| weekday_name(*d)).collect();
        (
            format!(
                "FREQ=WEEKLY;BYDAY={};BYHOUR={};BYMINUTE={}",
                abbrevs.join(","),
                first.hour,
                first.minute
            ),
            format!(
                "Weekly on {} at {:02}:{:02}",
                names.join(", "),
                first.hour,
                first.minute
            ),
        )
    };

    // Tied groups are disjoint, so this never exceeds the instance count.
    let matched_count = best_count * tied.len();
    let exception_count = sorted.len() - matched_count;
    let first_instance = sorted[0];
    let timezone = if first_instance.timezone.is_empty() {
        "UTC".to_string()
    } else {
        first_instance.timezone.clone()
    };

    Some(RecurrenceResult {
        rrule,
        confidence: matched_count as f64 / sorted.len() as f64,
        description,
        dtstart: first_instance.starts_at,
        duration_minutes: avg_secs / 60,
        timezone,
        matched_count,
        exception_count,
    })
}

/// Build a UTC timestamp helper for tests and fixtures.
pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(y, mo, d, h, mi, 0) {
        chrono::LocalResult::Single(t) => t,
        _ => DateTime::<Utc>::UNIX_EPOCH,
    }
}

#[cfg(test)]
#[path = "recurrence_tests.rs"]
mod tests;
