// SPDX-License-Identifier: MIT

//! Duration string handling.
//!
//! Source systems exchange track lengths and fades as `HH:MM:SS` or
//! `HH:MM:SS.mmm` strings. Parsing discards the millisecond part; callers
//! with non-fatal fields use [`parse_duration_secs_lenient`], which maps
//! malformed input to zero.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationParseError {
    #[error("invalid duration string: {0:?}")]
    Invalid(String),
}

/// Parse `HH:MM:SS` or `HH:MM:SS.mmm` into whole seconds.
///
/// Milliseconds are discarded. Hours are unbounded; minutes and seconds
/// must be below 60.
pub fn parse_duration_secs(s: &str) -> Result<u64, DurationParseError> {
    let invalid = || DurationParseError::Invalid(s.to_string());

    let base = match s.split_once('.') {
        Some((base, millis)) => {
            if millis.is_empty() || millis.len() > 3 || !millis.bytes().all(|b| b.is_ascii_digit())
            {
                return Err(invalid());
            }
            base
        }
        None => s,
    };

    let mut parts = base.split(':');
    let (h, m, sec) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(m), Some(s), None) => (h, m, s),
        _ => return Err(invalid()),
    };
    let h: u64 = h.parse().map_err(|_| invalid())?;
    let m: u64 = m.parse().map_err(|_| invalid())?;
    let sec: u64 = sec.parse().map_err(|_| invalid())?;
    if m >= 60 || sec >= 60 {
        return Err(invalid());
    }
    Ok(h * 3600 + m * 60 + sec)
}

/// Lenient variant for non-fatal fields: malformed input becomes zero.
pub fn parse_duration_secs_lenient(s: &str) -> u64 {
    parse_duration_secs(s).unwrap_or(0)
}

/// Parse a fade string into milliseconds (seconds resolution).
pub fn parse_fade_ms(s: &str) -> u64 {
    parse_duration_secs_lenient(s) * 1000
}

/// Format whole seconds as `HH:MM:SS`.
pub fn format_duration_secs(secs: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

#[cfg(test)]
#[path = "duration_tests.rs"]
mod tests;
