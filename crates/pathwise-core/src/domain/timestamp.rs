//! Timestamp parsing and day arithmetic.
//!
//! Snapshots arrive from several producers, so deadlines may carry an offset,
//! be naive wall-clock times, or be bare dates. Everything is normalized to
//! UTC on the way in.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer};

const MICROS_PER_DAY: i64 = 86_400_000_000;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a timestamp in any of the accepted snapshot formats.
///
/// Accepted, in order: RFC 3339 with an offset (converted to UTC), naive
/// date-times with `T` or space separators (taken as UTC), and bare
/// `YYYY-MM-DD` dates (midnight UTC).
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Serde adapter for required timestamp fields.
///
/// # Errors
///
/// Fails when the value is not a string in one of the formats [`parse`] accepts.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw:?}")))
}

/// Serde adapter for optional timestamp fields (`null` or absent is `None`).
///
/// # Errors
///
/// Fails when a present value is not a string in one of the formats [`parse`] accepts.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw:?}"))),
    }
}

/// Whole days in `delta`, rounded toward negative infinity.
///
/// A deadline two hours in the past is `-1` days away, while the same
/// deadline measured as "time since" is `0` days.
pub fn whole_days(delta: TimeDelta) -> i64 {
    match delta.num_microseconds() {
        Some(micros) => micros.div_euclid(MICROS_PER_DAY),
        // Beyond microsecond range; sub-day precision no longer matters.
        None => delta.num_days(),
    }
}

/// Whole days from `from` to `to` (see [`whole_days`]).
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    whole_days(to - from)
}
