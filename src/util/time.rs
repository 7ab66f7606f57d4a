use chrono::{DateTime, Local};

/// Current local wall-clock time.
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Record id for a save made at `at`, e.g. `2026-10-17_153012_045`.
///
/// Ids of the same length sort lexicographically in chronological order.
pub fn record_id(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%d_%H%M%S_%3f").to_string()
}

/// Human readable form used in record summaries.
pub fn display_timestamp(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}
