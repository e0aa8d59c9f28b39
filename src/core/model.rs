// RouterLog - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no platform
// dependencies. These types are the shared vocabulary across all layers.

use crate::util::constants;
use crate::util::error::ParseError;
use chrono::{DateTime, Utc};
use serde::Serialize;

// =============================================================================
// Log Entry
// =============================================================================

/// One structured `{timestamp, message}` record derived from a raw log line.
///
/// Sequences of entries produced or persisted anywhere in the crate are
/// ordered non-decreasing by `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Absolute instant of the event.
    pub timestamp: DateTime<Utc>,

    /// Line content after the timestamp prefix, trimmed. May be empty.
    pub message: String,
}

impl LogEntry {
    pub fn new(timestamp: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
        }
    }
}

/// Stable ascending sort by timestamp. Equal timestamps keep input order.
pub fn sort_by_timestamp(entries: &mut [LogEntry]) {
    entries.sort_by_key(|e| e.timestamp);
}

// =============================================================================
// Line formats
// =============================================================================

/// How the prefix of a line is turned into an instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampKind {
    /// A chrono pattern without offset, read as local wall-clock time.
    Local { pattern: String },

    /// RFC 3339 / ISO 8601 with an explicit UTC offset.
    Rfc3339,
}

/// Per-source description of a raw line: where the prefix ends and how to
/// read it. The device and the persisted store use different widths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFormat {
    /// Number of characters (not bytes) in the timestamp prefix.
    pub prefix_width: usize,

    /// Interpretation of the prefix.
    pub timestamp: TimestampKind,
}

impl LineFormat {
    /// Native Fritz!Box format: `"14.10.26 17:24:01 DSL ist verfügbar"`.
    pub fn device() -> Self {
        Self::device_with(
            constants::DEVICE_PREFIX_WIDTH,
            constants::DEVICE_TIMESTAMP_FORMAT,
        )
    }

    /// A device format with a custom width and chrono pattern.
    pub fn device_with(prefix_width: usize, pattern: &str) -> Self {
        Self {
            prefix_width,
            timestamp: TimestampKind::Local {
                pattern: pattern.to_string(),
            },
        }
    }

    /// Format written by `parser::to_text` into the local store.
    pub fn persisted() -> Self {
        Self::persisted_with(constants::PERSISTED_PREFIX_WIDTH)
    }

    pub fn persisted_with(prefix_width: usize) -> Self {
        Self {
            prefix_width,
            timestamp: TimestampKind::Rfc3339,
        }
    }
}

// =============================================================================
// Parse result
// =============================================================================

/// Result of parsing a batch of lines under the skip policy.
#[derive(Debug, Default)]
pub struct ParseResult {
    /// Successfully parsed entries, sorted ascending by timestamp.
    pub entries: Vec<LogEntry>,

    /// Lines that were dropped (capped at MAX_PARSE_ERRORS_PER_BATCH).
    pub errors: Vec<ParseError>,

    /// Number of dropped lines, including those beyond the error cap.
    pub skipped: usize,

    /// Total lines seen, blank ones included.
    pub lines_processed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sort_by_timestamp_is_stable() {
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap();
        let mut entries = vec![
            LogEntry::new(t2, "late"),
            LogEntry::new(t1, "first"),
            LogEntry::new(t1, "second"),
        ];
        sort_by_timestamp(&mut entries);
        let messages: Vec<_> = entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["first", "second", "late"]);
    }

    #[test]
    fn test_device_and_persisted_widths_differ() {
        let device = LineFormat::device();
        let persisted = LineFormat::persisted();
        assert_eq!(device.prefix_width, 18);
        assert_eq!(persisted.prefix_width, 25);
        assert_eq!(persisted.timestamp, TimestampKind::Rfc3339);
    }
}
