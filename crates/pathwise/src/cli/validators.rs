//! CLI input validation functions.
//!
//! These validators are used by clap's `value_parser` attribute to validate
//! user input at parse time, providing immediate feedback for invalid values.

use chrono::{DateTime, Utc};
use pathwise_core::domain::timestamp;

/// Validate an analysis clock reading.
///
/// Accepts the same formats as snapshot timestamps: RFC 3339, naive
/// date-times (taken as UTC) and bare dates.
pub fn validate_now(s: &str) -> Result<DateTime<Utc>, String> {
    timestamp::parse(s).ok_or_else(|| {
        format!("Invalid timestamp: '{s}'. Expected RFC 3339 (e.g., 2024-01-15T09:00:00Z) or YYYY-MM-DD")
    })
}
