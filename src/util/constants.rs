// RouterLog - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "RouterLog";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "RouterLog";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the config file inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Name of the directory (under the data dir) holding per-device logs.
pub const LOGS_DIR_NAME: &str = "logs";

/// Extension of a persisted device log (`<address>.log`).
pub const STORE_FILE_EXTENSION: &str = "log";

// =============================================================================
// Line formats
// =============================================================================

/// Prefix width of a Fritz!Box device log line: `"14.10.26 17:24:01 "`.
pub const DEVICE_PREFIX_WIDTH: usize = 18;

/// chrono pattern for the device prefix. Interpreted in local time.
pub const DEVICE_TIMESTAMP_FORMAT: &str = "%d.%m.%y %H:%M:%S";

/// Prefix width of a persisted line: `"2026-10-14T17:24:01+02:00"`.
///
/// Must equal the length produced by `PERSISTED_TIMESTAMP_FORMAT`.
pub const PERSISTED_PREFIX_WIDTH: usize = 25;

/// chrono pattern used when serialising entries to the local store.
pub const PERSISTED_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Upper bound on any configured prefix width.
pub const MAX_PREFIX_WIDTH: usize = 64;

// =============================================================================
// Parsing limits
// =============================================================================

/// Maximum number of parse errors retained per batch. Further errors are
/// still logged and counted but not stored.
pub const MAX_PARSE_ERRORS_PER_BATCH: usize = 1_000;

/// Characters of an offending line included in a diagnostic.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 120;

// =============================================================================
// Sync loop
// =============================================================================

/// Default seconds between cycles in watch mode.
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;

/// Lower bound on the watch interval.
pub const MIN_SYNC_INTERVAL_SECS: u64 = 5;

/// Upper bound on the watch interval (one day).
pub const MAX_SYNC_INTERVAL_SECS: u64 = 86_400;

// =============================================================================
// Sources
// =============================================================================

/// Bytes of a failing command's stderr kept in the error message.
pub const MAX_STDERR_EXCERPT: usize = 512;

// =============================================================================
// Notifiers
// =============================================================================

/// Width of the ruler printed around console reports.
pub const CONSOLE_RULER_WIDTH: usize = 80;

/// Default sendmail-compatible program for the email notifier.
pub const DEFAULT_SENDMAIL_PROGRAM: &str = "sendmail";

/// Arguments passed to the sendmail program: read recipients from headers,
/// do not treat a lone `.` as end of input.
pub const SENDMAIL_ARGS: &[&str] = &["-t", "-i"];

/// Default subject prefix of notification emails.
pub const DEFAULT_SUBJECT_PREFIX: &str = "Router Log Report";

// =============================================================================
// Logging
// =============================================================================

/// Default tracing filter when nothing else is configured.
pub const DEFAULT_LOG_LEVEL: &str = "info";
