//! Input handling for caller-supplied windows.

use std::num::NonZeroU32;

use chrono::{DateTime, Utc};
use wakeup_fitness_client::TimeRange;
use wakeup_fitness_client::utils::parse_instant;

use crate::{McpError, McpResult};

/// Resolve an optional day count, rejecting zero.
pub fn parse_days(days: Option<u32>, default: NonZeroU32) -> McpResult<NonZeroU32> {
    match days {
        None => Ok(default),
        Some(d) => NonZeroU32::new(d)
            .ok_or_else(|| McpError::Validation("days must be at least 1".into())),
    }
}

/// Resolve optional bounds into a window.
///
/// A missing `end` is `now`; a missing `start` is `default_days` before `end`.
pub fn parse_range(
    start: Option<&str>,
    end: Option<&str>,
    default_days: NonZeroU32,
    now: DateTime<Utc>,
) -> McpResult<TimeRange> {
    let end = match end {
        Some(s) => parse_bound("end", s)?,
        None => now,
    };
    let start = match start {
        Some(s) => parse_bound("start", s)?,
        None => TimeRange::trailing_days(default_days.get(), end).start(),
    };
    TimeRange::new(start, end).map_err(|e| McpError::Validation(e.to_string()))
}

fn parse_bound(name: &str, s: &str) -> McpResult<DateTime<Utc>> {
    parse_instant(s).ok_or_else(|| McpError::Validation(format!("invalid {name}: {s}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn week() -> NonZeroU32 {
        NonZeroU32::new(7).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 9, 0, 0).unwrap()
    }

    #[test]
    fn parse_days_defaults_and_rejects_zero() {
        assert_eq!(parse_days(None, week()).unwrap().get(), 7);
        assert_eq!(parse_days(Some(30), week()).unwrap().get(), 30);
        assert!(matches!(
            parse_days(Some(0), week()),
            Err(McpError::Validation(_))
        ));
    }

    #[test]
    fn parse_range_defaults_to_trailing_window() {
        let range = parse_range(None, None, week(), now()).unwrap();
        assert_eq!(range.end(), now());
        assert_eq!(range.start(), Utc.with_ymd_and_hms(2025, 6, 8, 9, 0, 0).unwrap());
    }

    #[test]
    fn parse_range_anchors_missing_start_on_end() {
        let range = parse_range(None, Some("2025-01-10"), week(), now()).unwrap();
        assert_eq!(range.start(), Utc.with_ymd_and_hms(2025, 1, 3, 0, 0, 0).unwrap());
    }

    #[test]
    fn parse_range_accepts_explicit_bounds() {
        let range = parse_range(
            Some("2025-01-01"),
            Some("2025-01-02T12:00:00Z"),
            week(),
            now(),
        )
        .unwrap();
        assert_eq!(range.start(), Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(range.end(), Utc.with_ymd_and_hms(2025, 1, 2, 12, 0, 0).unwrap());
    }

    #[test]
    fn parse_range_rejects_bad_input() {
        assert!(parse_range(Some("yesterday"), None, week(), now()).is_err());
        let inverted = parse_range(Some("2025-02-01"), Some("2025-01-01"), week(), now());
        assert!(matches!(inverted, Err(McpError::Validation(_))));
    }
}
