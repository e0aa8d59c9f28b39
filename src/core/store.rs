// RouterLog - core/store.rs
//
// Line-level encoding of the persisted local log.
// Core layer: accepts Read/Write trait objects, never opens files itself.
// The filesystem-backed store lives in app::store.

use crate::core::model::{sort_by_timestamp, LineFormat, LogEntry, ParseResult};
use crate::core::parser;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Read a persisted log. Invalid UTF-8 is replaced rather than rejected, and
/// corrupt lines are skipped under the parser's policy.
pub fn read_entries<R: Read>(mut reader: R, format: &LineFormat) -> io::Result<ParseResult> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(parser::parse_lines(&text, format))
}

/// Serialise `entries`, sorted ascending, one newline-terminated line each.
pub fn render_entries(entries: &[LogEntry]) -> String {
    let mut sorted = entries.to_vec();
    sort_by_timestamp(&mut sorted);

    let mut out = String::new();
    for entry in &sorted {
        out.push_str(&parser::to_text(entry));
        out.push('\n');
    }
    out
}

/// Write all entries with a single `write_all`. Returns the number written.
///
/// `terminate_previous` prepends a newline so a torn final line already in
/// the destination stays on its own line.
pub fn write_entries<W: Write>(
    mut writer: W,
    entries: &[LogEntry],
    terminate_previous: bool,
) -> io::Result<usize> {
    if entries.is_empty() {
        return Ok(0);
    }
    let mut buf = String::new();
    if terminate_previous {
        buf.push('\n');
    }
    buf.push_str(&render_entries(entries));
    writer.write_all(buf.as_bytes())?;
    writer.flush()?;
    Ok(entries.len())
}

/// Whether the persisted content is missing its final newline. Empty content
/// is not torn. Reads only the last byte.
pub fn has_torn_tail<R: Read + Seek>(mut reader: R) -> io::Result<bool> {
    let len = reader.seek(SeekFrom::End(0))?;
    if len == 0 {
        return Ok(false);
    }
    reader.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    reader.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(secs: i64, msg: &str) -> LogEntry {
        LogEntry::new(Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(), msg)
    }

    #[test]
    fn test_render_sorts_entries() {
        let text = render_entries(&[at(2, "y"), at(1, "x")]);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" x"));
        assert!(lines[1].ends_with(" y"));
    }

    #[test]
    fn test_write_then_read_back() {
        let mut buf = Vec::new();
        let written = write_entries(&mut buf, &[at(5, "later"), at(0, "earlier")], false).unwrap();
        assert_eq!(written, 2);

        let result = read_entries(buf.as_slice(), &LineFormat::persisted()).unwrap();
        assert_eq!(result.entries, vec![at(0, "earlier"), at(5, "later")]);
        assert_eq!(result.skipped, 0);
    }

    #[test]
    fn test_write_nothing_writes_no_bytes() {
        let mut buf = Vec::new();
        assert_eq!(write_entries(&mut buf, &[], true).unwrap(), 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_read_tolerates_corrupt_line_and_bad_utf8() {
        let mut bytes = render_entries(&[at(0, "good")]).into_bytes();
        bytes.extend_from_slice(b"\xff\xfe truncated write\n");
        let result = read_entries(bytes.as_slice(), &LineFormat::persisted()).unwrap();
        assert_eq!(result.entries, vec![at(0, "good")]);
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn test_torn_tail_detection() {
        use std::io::Cursor;
        assert!(!has_torn_tail(Cursor::new(Vec::<u8>::new())).unwrap());
        assert!(!has_torn_tail(Cursor::new(b"complete line\n".to_vec())).unwrap());
        assert!(has_torn_tail(Cursor::new(b"complete line\n2026-10-14T10:0".to_vec())).unwrap());
    }

    #[test]
    fn test_write_after_torn_tail_starts_on_new_line() {
        let mut buf = b"2026-10-14T10:0".to_vec();
        write_entries(&mut buf, &[at(0, "next")], true).unwrap();

        let result = read_entries(buf.as_slice(), &LineFormat::persisted()).unwrap();
        assert_eq!(result.entries, vec![at(0, "next")]);
        assert_eq!(result.skipped, 1);
    }
}
