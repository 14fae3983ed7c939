//! Parsing helpers for the reporting service's compact timestamp formats.
//!
//! Statement timestamps carry no timezone annotation and are always
//! interpreted as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Parses a `YYYYMMDD;HHMMSS` timestamp, falling back to RFC 3339 for the
/// occasional payload that uses ISO datetimes instead.
pub fn parse_flex_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y%m%d;%H%M%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parses a `YYYYMMDD` date as UTC midnight.
pub fn parse_flex_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(value.trim(), "%Y%m%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
