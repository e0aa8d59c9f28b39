// RouterLog - core/parser.rs
//
// Fixed-width log line parsing and serialisation.
// Core layer: works on &str only, never touches the filesystem.
//
// Malformed-line policy: skip with diagnostic. `parse_lines` drops any line
// whose prefix does not resolve to an instant, logs a warning, and records
// the error in the returned `ParseResult`. Such lines never reach the diff.

use crate::core::model::{sort_by_timestamp, LineFormat, LogEntry, ParseResult, TimestampKind};
use crate::util::constants;
use crate::util::error::ParseError;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

/// Parse one raw line under the given format.
///
/// The line is split at `format.prefix_width` characters; the prefix becomes
/// the timestamp and the trimmed remainder the message. A line shorter than
/// the width is all prefix with an empty message.
pub fn parse_line(raw_line: &str, format: &LineFormat) -> Result<LogEntry, ParseError> {
    parse_numbered(raw_line, format, 0)
}

fn parse_numbered(
    raw_line: &str,
    format: &LineFormat,
    line_number: u64,
) -> Result<LogEntry, ParseError> {
    let (prefix, rest) = split_at_chars(raw_line, format.prefix_width);

    let timestamp = parse_prefix(prefix, &format.timestamp).map_err(|reason| {
        ParseError::UnparseableTimestamp {
            line_number,
            raw_prefix: prefix.to_string(),
            reason,
        }
    })?;

    Ok(LogEntry {
        timestamp,
        message: rest.trim().to_string(),
    })
}

/// Parse every line of `text`, skipping blank lines silently and malformed
/// lines with a warning. The returned entries are sorted ascending.
pub fn parse_lines(text: &str, format: &LineFormat) -> ParseResult {
    let mut result = ParseResult::default();

    for (idx, line) in text.lines().enumerate() {
        result.lines_processed += 1;
        let line_number = (idx as u64) + 1;

        if line.trim().is_empty() {
            continue;
        }

        match parse_numbered(line, format, line_number) {
            Ok(entry) => result.entries.push(entry),
            Err(e) => {
                tracing::warn!(
                    line = line_number,
                    preview = %preview(line),
                    error = %e,
                    "Skipping unparseable log line"
                );
                result.skipped += 1;
                if result.errors.len() < constants::MAX_PARSE_ERRORS_PER_BATCH {
                    result.errors.push(e);
                }
            }
        }
    }

    sort_by_timestamp(&mut result.entries);

    tracing::debug!(
        entries = result.entries.len(),
        skipped = result.skipped,
        lines = result.lines_processed,
        "Parsing complete"
    );

    result
}

/// Render an entry in the persisted format: local-time ISO 8601 with explicit
/// offset, one space, the message. Never contains a newline.
pub fn to_text(entry: &LogEntry) -> String {
    let timestamp = entry
        .timestamp
        .with_timezone(&Local)
        .format(constants::PERSISTED_TIMESTAMP_FORMAT);
    let message = entry.message.replace(['\r', '\n'], " ");
    format!("{timestamp} {message}")
}

/// Split `line` after `width` characters. Falls back to the whole line as the
/// prefix when it is shorter than `width`.
pub(crate) fn split_at_chars(line: &str, width: usize) -> (&str, &str) {
    let byte_idx = line
        .char_indices()
        .nth(width)
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    line.split_at(byte_idx)
}

// =============================================================================
// Timestamp parsing
// =============================================================================

/// Resolve a prefix to an absolute instant.
///
/// For `Local` formats the configured pattern is tried first, then RFC 3339
/// and plain `%Y-%m-%d %H:%M:%S` as fallbacks, so a device that switches to
/// ISO output keeps syncing. Ambiguous local times (DST fold) resolve to the
/// earliest instant; non-existent ones (DST gap) are an error.
fn parse_prefix(prefix: &str, kind: &TimestampKind) -> Result<DateTime<Utc>, String> {
    let trimmed = prefix.trim();
    if trimmed.is_empty() {
        return Err("empty timestamp prefix".to_string());
    }

    match kind {
        TimestampKind::Rfc3339 => DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| format!("not an RFC 3339 timestamp: {e}")),
        TimestampKind::Local { pattern } => {
            if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, pattern) {
                return local_to_utc(&ndt);
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
                return Ok(dt.with_timezone(&Utc));
            }
            if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
                return local_to_utc(&ndt);
            }
            Err(format!("does not match format '{pattern}'"))
        }
    }
}

fn local_to_utc(ndt: &NaiveDateTime) -> Result<DateTime<Utc>, String> {
    Local
        .from_local_datetime(ndt)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("local time {ndt} does not exist in this timezone"))
}

fn preview(line: &str) -> String {
    let mut out: String = line.chars().take(constants::DEBUG_MAX_LINE_PREVIEW).collect();
    if line.chars().count() > constants::DEBUG_MAX_LINE_PREVIEW {
        out.push('…');
    }
    out
}
