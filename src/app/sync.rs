// RouterLog - app/sync.rs
//
// One sync cycle: fetch the device window, parse it, diff it against the
// local log, append what is new, and hand the new entries to the notifiers.
//
// Single-threaded and synchronous. Failures abort the current cycle; the
// local log is either appended with the whole batch or left untouched.

use crate::app::notify::{self, Notifier};
use crate::app::settings::SyncSettings;
use crate::app::source::{self, LogSource};
use crate::app::store::LogStore;
use crate::core::diff;
use crate::core::model::{LineFormat, LogEntry};
use crate::core::parser;
use crate::util::error::Result;
use std::path::Path;
use std::time::{Duration, Instant};

/// What one cycle observed and did.
#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    /// Entries that were not yet in the local log, ascending. Already appended.
    pub new_entries: Vec<LogEntry>,

    /// Parsed entries in the device window.
    pub device_entries: usize,

    /// Entries in the local log before this cycle.
    pub local_entries: usize,

    /// Device lines dropped because their timestamp could not be parsed.
    pub skipped_lines: usize,

    /// The device window no longer overlaps the local log; entries may have
    /// been evicted on the device before they could be observed.
    pub gap_suspected: bool,
}

/// Run one fetch → parse → diff → append cycle against `store_path`.
///
/// Running it twice with no new device activity appends nothing and returns
/// no new entries the second time.
pub fn run_cycle(
    source: &dyn LogSource,
    store_path: &Path,
    device_format: &LineFormat,
) -> Result<SyncOutcome> {
    let started = Instant::now();

    let blob = source.fetch()?;
    let device = parser::parse_lines(&blob, device_format);
    if device.skipped > 0 {
        tracing::warn!(
            source = %source.describe(),
            skipped = device.skipped,
            "Device log contained unparseable lines"
        );
    }

    let store = LogStore::new(store_path);
    let local = store.load()?;

    let gap_suspected = diff::gap_suspected(&device.entries, &local.entries);
    if gap_suspected {
        tracing::warn!(
            store = %store_path.display(),
            "Device log no longer reaches back to the last synced entry; older entries may be lost. \
             Sync more often to close the gap."
        );
    }

    let new_entries = diff::new_entries(&device.entries, &local.entries);
    store.append(&new_entries)?;

    tracing::info!(
        source = %source.describe(),
        device_entries = device.entries.len(),
        local_entries = local.entries.len(),
        new = new_entries.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Sync cycle complete"
    );

    Ok(SyncOutcome {
        new_entries,
        device_entries: device.entries.len(),
        local_entries: local.entries.len(),
        skipped_lines: device.skipped,
        gap_suspected,
    })
}

// =============================================================================
// Syncer
// =============================================================================

/// Totals of a watch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub cycles: u64,
    pub failures: u64,
    pub new_entries: usize,
}

/// Resolved settings plus the source and notifiers they select.
pub struct Syncer {
    settings: SyncSettings,
    source: Box<dyn LogSource>,
    notifiers: Vec<Box<dyn Notifier>>,
}

impl Syncer {
    /// Build the source and notifiers named by `settings`.
    pub fn new(settings: SyncSettings) -> Self {
        let source = source::build_source(&settings.source);
        let notifiers = notify::build_notifiers(&settings.channels, settings.email.as_ref());
        Self::with_parts(settings, source, notifiers)
    }

    pub fn with_parts(
        settings: SyncSettings,
        source: Box<dyn LogSource>,
        notifiers: Vec<Box<dyn Notifier>>,
    ) -> Self {
        Self {
            settings,
            source,
            notifiers,
        }
    }

    /// One cycle followed by every notifier. A failing notifier is logged and
    /// does not affect the others or the persisted log.
    pub fn run_once(&self) -> Result<SyncOutcome> {
        let outcome = run_cycle(
            self.source.as_ref(),
            &self.settings.store_path,
            &self.settings.device_format,
        )?;

        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(&self.settings.device_address, &outcome.new_entries) {
                tracing::error!(channel = notifier.name(), error = %e, "Notification failed");
            }
        }

        Ok(outcome)
    }

    /// Repeat cycles every `settings.interval` until `max_cycles` have run
    /// (forever when `None`). Failed cycles are logged and the loop goes on;
    /// the device window is simply re-read next time.
    pub fn run_watch(&self, max_cycles: Option<u64>) -> WatchSummary {
        let mut summary = WatchSummary::default();
        tracing::info!(
            device = %self.settings.device_address,
            interval_secs = self.settings.interval.as_secs(),
            "Watch mode started"
        );

        loop {
            summary.cycles += 1;
            match self.run_once() {
                Ok(outcome) => summary.new_entries += outcome.new_entries.len(),
                Err(e) => {
                    summary.failures += 1;
                    tracing::error!(cycle = summary.cycles, error = %e, "Sync cycle failed");
                }
            }

            if max_cycles.is_some_and(|max| summary.cycles >= max) {
                break;
            }
            if self.settings.interval > Duration::ZERO {
                std::thread::sleep(self.settings.interval);
            }
        }

        tracing::info!(
            cycles = summary.cycles,
            failures = summary.failures,
            new = summary.new_entries,
            "Watch mode finished"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::config::SourceSpec;
    use crate::util::error::{FetchError, NotifyError, SyncError};
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// Source returning a scripted blob that tests can change between cycles.
    struct ScriptedSource {
        blob: Rc<RefCell<Option<String>>>,
    }

    impl LogSource for ScriptedSource {
        fn describe(&self) -> String {
            "scripted".to_string()
        }

        fn fetch(&self) -> std::result::Result<String, FetchError> {
            self.blob
                .borrow()
                .clone()
                .ok_or_else(|| FetchError::CommandFailed {
                    program: "scripted".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "device unreachable".to_string(),
                })
        }
    }

    /// Notifier recording every batch it receives.
    struct RecordingNotifier {
        batches: Rc<RefCell<Vec<Vec<String>>>>,
    }

    impl Notifier for RecordingNotifier {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn notify(&self, _device: &str, entries: &[LogEntry]) -> std::result::Result<(), NotifyError> {
            self.batches
                .borrow_mut()
                .push(entries.iter().map(|e| e.message.clone()).collect());
            Ok(())
        }
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn notify(&self, _device: &str, _entries: &[LogEntry]) -> std::result::Result<(), NotifyError> {
            Err(NotifyError::MailRejected {
                program: "sendmail".to_string(),
                status: "exit status: 75".to_string(),
            })
        }
    }

    fn settings(dir: &TempDir) -> SyncSettings {
        SyncSettings {
            device_address: "fritz.box".to_string(),
            source: SourceSpec::File(dir.path().join("unused.txt")),
            store_path: dir.path().join("fritz.box.log"),
            device_format: LineFormat::device(),
            channels: Vec::new(),
            email: None,
            interval: Duration::ZERO,
        }
    }

    fn messages(entries: &[LogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.message.as_str()).collect()
    }

    #[test]
    fn test_first_cycle_takes_whole_window_then_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let blob = Rc::new(RefCell::new(Some(
            "14.10.26 17:25:00 second\n14.10.26 17:24:00 first\n".to_string(),
        )));
        let source = ScriptedSource { blob: blob.clone() };
        let store_path = dir.path().join("fritz.box.log");

        let first = run_cycle(&source, &store_path, &LineFormat::device()).unwrap();
        assert_eq!(messages(&first.new_entries), ["first", "second"]);
        assert_eq!(first.local_entries, 0);
        assert!(!first.gap_suspected);

        let size_after_first = std::fs::metadata(&store_path).unwrap().len();
        let second = run_cycle(&source, &store_path, &LineFormat::device()).unwrap();
        assert!(second.new_entries.is_empty());
        assert_eq!(second.local_entries, 2);
        assert_eq!(std::fs::metadata(&store_path).unwrap().len(), size_after_first);
    }

    #[test]
    fn test_cycle_appends_only_entries_after_watermark() {
        let dir = TempDir::new().unwrap();
        let blob = Rc::new(RefCell::new(Some("14.10.26 10:00:00 a\n".to_string())));
        let source = ScriptedSource { blob: blob.clone() };
        let store_path = dir.path().join("fritz.box.log");

        run_cycle(&source, &store_path, &LineFormat::device()).unwrap();

        *blob.borrow_mut() = Some(
            "14.10.26 10:00:00 a\n14.10.26 10:05:00 b\ngarbage\n14.10.26 10:10:00 c\n".to_string(),
        );
        let outcome = run_cycle(&source, &store_path, &LineFormat::device()).unwrap();
        assert_eq!(messages(&outcome.new_entries), ["b", "c"]);
        assert_eq!(outcome.skipped_lines, 1);
        assert_eq!(outcome.device_entries, 3);

        let stored = LogStore::new(&store_path).load().unwrap().entries;
        assert_eq!(messages(&stored), ["a", "b", "c"]);
    }

    #[test]
    fn test_cycle_reports_gap_when_window_scrolled() {
        let dir = TempDir::new().unwrap();
        let blob = Rc::new(RefCell::new(Some("14.10.26 10:00:00 a\n".to_string())));
        let source = ScriptedSource { blob: blob.clone() };
        let store_path = dir.path().join("fritz.box.log");
        run_cycle(&source, &store_path, &LineFormat::device()).unwrap();

        *blob.borrow_mut() = Some("14.10.26 11:00:00 x\n14.10.26 11:01:00 y\n".to_string());
        let outcome = run_cycle(&source, &store_path, &LineFormat::device()).unwrap();
        assert!(outcome.gap_suspected);
        assert_eq!(messages(&outcome.new_entries), ["x", "y"]);
    }

    #[test]
    fn test_cycle_after_torn_local_line_loses_nothing() {
        let dir = TempDir::new().unwrap();
        let blob = Rc::new(RefCell::new(Some("14.10.26 10:00:00 a\n".to_string())));
        let source = ScriptedSource { blob: blob.clone() };
        let store_path = dir.path().join("fritz.box.log");
        run_cycle(&source, &store_path, &LineFormat::device()).unwrap();

        let mut raw = std::fs::read_to_string(&store_path).unwrap();
        raw.push_str("2026-10-14T10:0");
        std::fs::write(&store_path, raw).unwrap();

        *blob.borrow_mut() = Some(
            "14.10.26 10:10:00 c\n14.10.26 10:05:00 b\n14.10.26 10:00:00 a\n".to_string(),
        );
        let second = run_cycle(&source, &store_path, &LineFormat::device()).unwrap();
        assert_eq!(messages(&second.new_entries), ["b", "c"]);

        let stored = LogStore::new(&store_path).load().unwrap().entries;
        assert_eq!(messages(&stored), ["a", "b", "c"]);

        let third = run_cycle(&source, &store_path, &LineFormat::device()).unwrap();
        assert!(third.new_entries.is_empty());
    }

    #[test]
    fn test_fetch_failure_aborts_cycle_without_touching_store() {
        let dir = TempDir::new().unwrap();
        let source = ScriptedSource {
            blob: Rc::new(RefCell::new(None)),
        };
        let store_path = dir.path().join("fritz.box.log");

        let err = run_cycle(&source, &store_path, &LineFormat::device()).unwrap_err();
        assert!(matches!(err, SyncError::Fetch(_)), "got {err:?}");
        assert!(!store_path.exists());
    }

    #[test]
    fn test_run_once_notifies_every_channel_even_after_failure() {
        let dir = TempDir::new().unwrap();
        let blob = Rc::new(RefCell::new(Some("14.10.26 10:00:00 a\n".to_string())));
        let batches = Rc::new(RefCell::new(Vec::new()));

        let syncer = Syncer::with_parts(
            settings(&dir),
            Box::new(ScriptedSource { blob: blob.clone() }),
            vec![
                Box::new(FailingNotifier),
                Box::new(RecordingNotifier {
                    batches: batches.clone(),
                }),
            ],
        );

        syncer.run_once().unwrap();
        syncer.run_once().unwrap();

        let batches = batches.borrow();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0], vec!["a".to_string()]);
        assert!(batches[1].is_empty());
    }

    #[test]
    fn test_run_watch_counts_failed_cycles_and_continues() {
        let dir = TempDir::new().unwrap();
        let syncer = Syncer::with_parts(
            settings(&dir),
            Box::new(ScriptedSource {
                blob: Rc::new(RefCell::new(None)),
            }),
            Vec::new(),
        );

        let summary = syncer.run_watch(Some(3));
        assert_eq!(
            summary,
            WatchSummary {
                cycles: 3,
                failures: 3,
                new_entries: 0
            }
        );
    }
}
