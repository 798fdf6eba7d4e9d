use chrono::{DateTime, Utc};

/// Returns current timestamp in seconds (Unix epoch)
pub fn current_timestamp_seconds() -> i64 {
    Utc::now().timestamp()
}

/// Formats an epoch-seconds timestamp as `YYYY-MM-DD HH:MM:SS` (UTC) for
/// read responses.
pub fn format_timestamp(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}
