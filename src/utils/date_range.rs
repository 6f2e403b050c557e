//! Inclusive date-range checks over `YYYY-MM-DDTHH:MM:SS` timestamps (no timezone).

use crate::error::{EventError, Result};
use chrono::NaiveDateTime;
use std::fmt;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parses a timestamp exactly; surrounding whitespace is a parse error.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    // chrono skips whitespace before numeric fields on its own
    if value.trim() != value {
        return Err(EventError::ParseError(format!(
            "'{}' has surrounding whitespace (expected YYYY-MM-DDTHH:MM:SS)",
            value
        )));
    }
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|e| {
        EventError::ParseError(format!(
            "'{}' is not a valid timestamp (expected YYYY-MM-DDTHH:MM:SS): {}",
            value, e
        ))
    })
}

pub fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Reports whether `event_ts` lies in `[range_start, range_end]`.
/// All three inputs must parse; malformed input is a `ParseError`.
pub fn within(event_ts: &str, range_start: &str, range_end: &str) -> Result<bool> {
    let event = parse_timestamp(event_ts)?;
    let start = parse_timestamp(range_start)?;
    let end = parse_timestamp(range_end)?;
    Ok(start <= event && event <= end)
}

/// A parsed, inclusive query range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    /// Parses both bounds. A start later than the end is rejected with `InvalidRange`.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start_ts = parse_timestamp(start)?;
        let end_ts = parse_timestamp(end)?;
        if start_ts > end_ts {
            return Err(EventError::InvalidRange(format!(
                "range start {} is after range end {}",
                start, end
            )));
        }
        Ok(Self {
            start: start_ts,
            end: end_ts,
        })
    }

    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        self.start <= *ts && *ts <= self.end
    }

    /// Canonical cache key: both bounds re-formatted and joined with `_`,
    /// so differently written but equal instants share one entry.
    pub fn cache_key(&self) -> String {
        format!(
            "{}_{}",
            format_timestamp(&self.start),
            format_timestamp(&self.end)
        )
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} .. {}]",
            format_timestamp(&self.start),
            format_timestamp(&self.end)
        )
    }
}

/// Serde adapter for `NaiveDateTime` fields in the fixed timestamp format.
pub mod timestamp_format {
    use super::{format_timestamp, parse_timestamp};
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}
