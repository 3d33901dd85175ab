//! Text codec for the last-verified timestamp.
//!
//! Timestamps are written as local time, `YYYY-MM-DD HH:MM:SS`. Older data
//! may hold a bare `YYYY-MM-DD`, which reads as midnight of that day.

use chrono::{NaiveDate, NaiveDateTime};

/// Format written by this tool.
pub const CURRENT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date-only format accepted for reading.
pub const LEGACY_FORMAT: &str = "%Y-%m-%d";

/// A stored timestamp that cannot be understood.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TimestampError {
    /// The stored bytes are not UTF-8.
    #[error("timestamp is not valid UTF-8")]
    NotUtf8,

    /// The text matches neither accepted format.
    #[error("unrecognized timestamp '{0}'")]
    Unrecognized(String),
}

/// Render a timestamp in [`CURRENT_FORMAT`].
#[must_use]
pub fn format(timestamp: NaiveDateTime) -> String {
    timestamp.format(CURRENT_FORMAT).to_string()
}

/// Parse a stored timestamp in either accepted format.
///
/// A colon selects the current format; anything else is read as a legacy
/// date.
///
/// # Errors
///
/// Returns [`TimestampError`] if the value matches neither format.
pub fn parse(raw: &[u8]) -> Result<NaiveDateTime, TimestampError> {
    let text = std::str::from_utf8(raw).map_err(|_| TimestampError::NotUtf8)?;
    let text = text.trim_end_matches('\0').trim();

    let parsed = if text.contains(':') {
        NaiveDateTime::parse_from_str(text, CURRENT_FORMAT).ok()
    } else {
        NaiveDate::parse_from_str(text, LEGACY_FORMAT)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    };
    parsed.ok_or_else(|| TimestampError::Unrecognized(text.to_string()))
}
