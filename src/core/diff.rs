// RouterLog - core/diff.rs
//
// Incremental diff between the device's bounded log window and the local
// history. Both inputs must already be sorted ascending by timestamp.
//
// Known limitation: the boundary is a strict "greater than the watermark"
// comparison, so a genuinely new device entry that shares its timestamp with
// the newest local entry cannot be told apart from it and is dropped.

use crate::core::model::{sort_by_timestamp, LogEntry};

/// Entries of `device` not yet present in `local`.
///
/// - `local` empty: all of `device`, unchanged.
/// - `device` empty: nothing.
/// - otherwise: the suffix of `device` strictly newer than the last local
///   timestamp. Only that suffix is inspected.
///
/// Neither input is modified; the result is always sorted ascending.
pub fn new_entries(device: &[LogEntry], local: &[LogEntry]) -> Vec<LogEntry> {
    let Some(watermark) = local.last().map(|e| e.timestamp) else {
        return device.to_vec();
    };

    let mut fresh: Vec<LogEntry> = device
        .iter()
        .rev()
        .take_while(|e| e.timestamp > watermark)
        .cloned()
        .collect();

    // The backward scan yields descending order.
    fresh.reverse();
    sort_by_timestamp(&mut fresh);
    fresh
}

/// True when the oldest device entry is already newer than the local
/// watermark: the device buffer may have evicted lines that were never seen.
pub fn gap_suspected(device: &[LogEntry], local: &[LogEntry]) -> bool {
    match (device.first(), local.last()) {
        (Some(oldest), Some(newest_local)) => oldest.timestamp > newest_local.timestamp,
        _ => false,
    }
}
