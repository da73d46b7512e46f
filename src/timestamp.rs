//! UTC timestamps for sink entries

use chrono::{DateTime, Utc};

/// `strftime` pattern used for every sink entry
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Current UTC time, second precision, e.g. `2024-05-01 13:07:42 UTC`
pub fn utc_now() -> String {
    format_utc(Utc::now())
}

/// Format a specific instant the same way as [`utc_now`]
pub fn format_utc(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}
