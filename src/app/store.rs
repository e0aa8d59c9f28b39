// RouterLog - app/store.rs
//
// Filesystem-backed local log store. The only code that mutates the
// persisted log, and only ever by appending.
//
// One running instance owns a store path for the duration of a cycle;
// concurrent writers to the same path are not supported.

use crate::core::model::{LineFormat, LogEntry, ParseResult};
use crate::core::store;
use crate::util::error::StoreError;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::PathBuf;

/// Append-only log file holding one device's history.
#[derive(Debug, Clone)]
pub struct LogStore {
    path: PathBuf,
    format: LineFormat,
}

impl LogStore {
    /// A store using the standard persisted line format.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_format(path, LineFormat::persisted())
    }

    pub fn with_format(path: impl Into<PathBuf>, format: LineFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    /// Load all entries, sorted ascending. A missing file is an empty log.
    pub fn load(&self) -> Result<ParseResult, StoreError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Local log absent; starting empty");
                return Ok(ParseResult::default());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let result = store::read_entries(io::BufReader::new(file), &self.format).map_err(
            |source| StoreError::Read {
                path: self.path.clone(),
                source,
            },
        )?;

        if result.skipped > 0 {
            tracing::warn!(
                path = %self.path.display(),
                skipped = result.skipped,
                "Local log contains unparseable lines; they are ignored"
            );
        }
        tracing::debug!(
            path = %self.path.display(),
            entries = result.entries.len(),
            "Local log loaded"
        );
        Ok(result)
    }

    /// Append `entries` (sorted ascending first), creating the file if needed.
    ///
    /// Existing content is never rewritten; only its last byte is read. If the
    /// file ends in a torn line the batch starts with a newline so the fragment
    /// cannot swallow the first new entry. The batch is written with one call
    /// and synced to disk before returning. An empty batch touches nothing.
    pub fn append(&self, entries: &[LogEntry]) -> Result<usize, StoreError> {
        if entries.is_empty() {
            return Ok(0);
        }

        let persist_err = |source: io::Error| StoreError::Persist {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(persist_err)?;

        let torn = store::has_torn_tail(&mut file).map_err(persist_err)?;
        if torn {
            tracing::warn!(
                path = %self.path.display(),
                "Local log ends with an incomplete line; starting the batch on a new line"
            );
        }

        let written = store::write_entries(&mut file, entries, torn).map_err(persist_err)?;
        file.sync_data().map_err(persist_err)?;

        tracing::debug!(
            path = %self.path.display(),
            appended = written,
            "Local log appended"
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn at(secs: i64, msg: &str) -> LogEntry {
        LogEntry::new(Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(), msg)
    }

    #[test]
    fn test_load_absent_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::new(dir.path().join("missing.log"));
        let result = store.load().unwrap();
        assert!(result.entries.is_empty());
    }

    #[test]
    fn test_append_out_of_order_persists_sorted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("router.log");
        let store = LogStore::new(&path);

        store.append(&[at(2, "y"), at(1, "x")]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" x"));
        assert!(lines[1].ends_with(" y"));

        assert_eq!(store.load().unwrap().entries, vec![at(1, "x"), at(2, "y")]);
    }

    #[test]
    fn test_append_preserves_prior_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("router.log");
        let store = LogStore::new(&path);

        store.append(&[at(0, "a")]).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();
        store.append(&[at(10, "b")]).unwrap();
        let after = std::fs::read_to_string(&path).unwrap();

        assert!(after.starts_with(&before));
        assert_eq!(store.load().unwrap().entries.len(), 2);
    }

    #[test]
    fn test_append_empty_does_not_create_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("router.log");
        assert_eq!(LogStore::new(&path).append(&[]).unwrap(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_load_skips_corrupt_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("router.log");
        let store = LogStore::new(&path);
        store.append(&[at(0, "ok")]).unwrap();

        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str("half-written li\n");
        std::fs::write(&path, content).unwrap();

        let result = store.load().unwrap();
        assert_eq!(result.entries, vec![at(0, "ok")]);
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn test_append_after_torn_line_keeps_every_new_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("router.log");
        let store = LogStore::new(&path);
        store.append(&[at(0, "a")]).unwrap();

        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str("2026-10-14T10:0");
        std::fs::write(&path, content).unwrap();

        store.append(&[at(10, "b"), at(20, "c")]).unwrap();

        let result = store.load().unwrap();
        assert_eq!(result.entries, vec![at(0, "a"), at(10, "b"), at(20, "c")]);
        assert_eq!(result.skipped, 1);
        assert!(std::fs::read_to_string(&path).unwrap().ends_with(" c\n"));
    }

    #[test]
    fn test_append_into_missing_directory_is_persist_error() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::new(dir.path().join("no-such-dir").join("router.log"));
        let err = store.append(&[at(0, "x")]).unwrap_err();
        assert!(matches!(err, StoreError::Persist { .. }), "got {err:?}");
    }
}
