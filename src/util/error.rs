// RouterLog - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Errors are categorised by the subsystem that produced them; every variant
// carries the path, line, or command needed to act on it.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a sync cycle.
///
/// Notifier failures are logged per channel and configuration errors are
/// reported at startup, so neither appears here. `ParseError` is collected
/// in `ParseResult::errors` and never aborts a cycle.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Reading or appending the local log failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The device log could not be fetched.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Errors related to turning a raw line into a `LogEntry`.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The fixed-width prefix does not resolve to an instant.
    #[error("line {line_number}: cannot parse timestamp '{raw_prefix}': {reason}")]
    UnparseableTimestamp {
        /// 1-based line number within the batch (0 when parsed standalone).
        line_number: u64,
        raw_prefix: String,
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// Errors related to the persisted local log.
///
/// A missing file is not represented here: it loads as an empty log.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The existing log could not be read.
    #[error("cannot read local log '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    /// New entries could not be appended. Prior content is untouched.
    #[error("cannot append to local log '{}': {source}", .path.display())]
    Persist { path: PathBuf, source: io::Error },
}

// ---------------------------------------------------------------------------
// Fetch errors
// ---------------------------------------------------------------------------

/// Errors surfaced by a `LogSource`. Never retried internally.
#[derive(Debug, Error)]
pub enum FetchError {
    /// A file source could not be read.
    #[error("cannot read device log from '{}': {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    /// The fetch command could not be started.
    #[error("cannot run fetch command '{program}': {source}")]
    Spawn { program: String, source: io::Error },

    /// The fetch command ran but reported failure.
    #[error("fetch command '{program}' exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },
}

// ---------------------------------------------------------------------------
// Notify errors
// ---------------------------------------------------------------------------

/// Errors raised by a notification channel.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Writing the report failed.
    #[error("{channel} notifier I/O error: {source}")]
    Io {
        channel: &'static str,
        source: io::Error,
    },

    /// The mail transfer program could not be started or fed.
    #[error("cannot run mail program '{program}': {source}")]
    Spawn { program: String, source: io::Error },

    /// The mail transfer program rejected the message.
    #[error("mail program '{program}' exited with {status}")]
    MailRejected { program: String, status: String },

    /// JSON serialisation of an entry failed.
    #[error("json notifier serialisation error: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration that cannot fall back to a default.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required value is set neither in config.toml nor on the command line.
    #[error("missing required setting '{field}'. {hint}")]
    MissingValue { field: &'static str, hint: &'static str },

    /// A value was supplied but cannot be used.
    #[error("setting '{field}' = '{value}' is invalid. Expected: {expected}")]
    InvalidValue {
        field: &'static str,
        value: String,
        expected: String,
    },

    /// The storage directory could not be created.
    #[error("cannot create storage directory '{}': {source}", .path.display())]
    StorageDir { path: PathBuf, source: io::Error },
}

/// Convenience type alias for sync results.
pub type Result<T> = std::result::Result<T, SyncError>;
