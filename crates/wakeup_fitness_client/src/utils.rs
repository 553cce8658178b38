//! Time conversions shared by the HTTP adapter and the caller surfaces.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub const MILLIS_PER_HOUR: f64 = 3_600_000.0;
pub const NANOS_PER_MILLI: i64 = 1_000_000;

pub fn millis_to_nanos(millis: i64) -> i64 {
    millis.saturating_mul(NANOS_PER_MILLI)
}

pub fn nanos_to_millis(nanos: i64) -> i64 {
    nanos / NANOS_PER_MILLI
}

pub fn millis_to_hours(millis: u64) -> f64 {
    millis as f64 / MILLIS_PER_HOUR
}

/// Parse a caller-supplied instant.
///
/// Accepts:
/// - YYYY-MM-DD -> midnight UTC of that day
/// - RFC3339 datetime -> converted to UTC
/// - Naive datetime YYYY-MM-DDTHH:MM:SS -> taken as UTC
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|ndt| ndt.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(ndt.and_utc());
    }
    None
}
