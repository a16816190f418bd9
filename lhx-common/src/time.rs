//! Timestamp utilities

use chrono::{DateTime, Datelike, Utc};

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Convert Unix seconds to a UTC timestamp, `None` if out of range
pub fn from_unix_seconds(seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(seconds, 0)
}

/// Calendar month bucket, e.g. `2016-01`
pub fn month_key(at: &DateTime<Utc>) -> String {
    format!("{:04}-{:02}", at.year(), at.month())
}
