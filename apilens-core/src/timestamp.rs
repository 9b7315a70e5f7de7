//! ISO-8601 timestamp handling for access-log records.
//!
//! Instants keep the offset they were written with: ordering compares the
//! underlying instant, while hour bucketing and rendering use the wall clock
//! as written. No timezone conversion happens anywhere.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Utc};

/// A parsed log instant.
pub type Instant = DateTime<FixedOffset>;

/// Render format used in reports: `<date>T<time>Z`.
pub const REPORT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 date-time. A trailing `Z` means `+00:00`; timestamps
/// without an offset are read as `+00:00`. Surrounding whitespace is not
/// accepted. Returns `None` on any failure.
pub fn parse_timestamp(text: &str) -> Option<Instant> {
    let normalized;
    let text = match text.strip_suffix('Z') {
        Some(stripped) => {
            normalized = format!("{stripped}+00:00");
            normalized.as_str()
        }
        None => text,
    };

    for fmt in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(text, fmt) {
            return Some(ts);
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc().with_timezone(&Utc.fix()));
        }
    }
    None
}

/// Render an instant the way the report shows it.
pub fn format_timestamp(ts: &Instant) -> String {
    ts.format(REPORT_FORMAT).to_string()
}

/// `"HH:00"` bucket key for the hourly distribution.
pub fn hour_bucket(ts: &Instant) -> String {
    ts.format("%H:00").to_string()
}
