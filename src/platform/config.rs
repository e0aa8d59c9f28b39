// RouterLog - platform/config.rs
//
// Platform directory resolution, config.toml loading with startup
// validation, and storage directory bootstrap.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use chrono::format::{Item, StrftimeItems};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for RouterLog configuration and data.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/routerlog/)
    pub config_dir: PathBuf,

    /// Data directory; per-device logs live in its `logs/` child.
    pub data_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to the current directory if platform dirs cannot be
    /// determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                config_dir: fallback.clone(),
                data_dir: fallback,
            }
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }

    pub fn default_log_dir(&self) -> PathBuf {
        self.data_dir.join(constants::LOGS_DIR_NAME)
    }
}

/// Create `dir` and its parents if missing.
pub fn ensure_dir(dir: &Path) -> Result<(), ConfigError> {
    std::fs::create_dir_all(dir).map_err(|source| ConfigError::StorageDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// File name of a device's local log: the address with anything outside
/// `[A-Za-z0-9._-]` replaced, plus `.log`.
pub fn store_file_name(device_address: &str) -> String {
    let stem: String = device_address
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}.{}", constants::STORE_FILE_EXTENSION)
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub device: DeviceSection,
    pub source: SourceSection,
    pub storage: StorageSection,
    pub parsing: ParsingSection,
    pub notify: NotifySection,
    pub sync: SyncSection,
    pub logging: LoggingSection,
}

/// `[device]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct DeviceSection {
    /// Hostname or IP of the router; also names the local log file.
    pub address: Option<String>,
}

/// `[source]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct SourceSection {
    /// "file" or "command".
    pub kind: Option<String>,
    /// File to read when kind = "file".
    pub path: Option<String>,
    /// Program to run when kind = "command".
    pub program: Option<String>,
    /// Arguments of `program`.
    pub args: Option<Vec<String>>,
}

/// `[storage]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Directory holding `<address>.log` files.
    pub log_dir: Option<String>,
}

/// `[parsing]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ParsingSection {
    /// Characters of timestamp prefix in a device line.
    pub device_prefix_width: Option<usize>,
    /// chrono pattern of the device prefix (local time).
    pub device_timestamp_format: Option<String>,
}

/// `[notify]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct NotifySection {
    /// Any of "stdout", "email", "json".
    pub channels: Option<Vec<String>>,
    pub email_to: Option<String>,
    pub email_from: Option<String>,
    pub subject_prefix: Option<String>,
    /// sendmail-compatible program.
    pub sendmail_program: Option<String>,
}

/// `[sync]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct SyncSection {
    /// Seconds between cycles in watch mode.
    pub interval_seconds: Option<u64>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Where the device log comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    File(PathBuf),
    Command { program: String, args: Vec<String> },
}

/// Validated configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
/// Values with no sensible default stay `None` and are checked when the
/// sync settings are resolved.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Device / source / storage --
    pub device_address: Option<String>,
    pub source: Option<SourceSpec>,
    pub log_dir: Option<PathBuf>,

    // -- Parsing --
    pub device_prefix_width: usize,
    pub device_timestamp_format: String,

    // -- Notify --
    pub notify_channels: Option<Vec<String>>,
    pub email_to: Option<String>,
    pub email_from: Option<String>,
    pub subject_prefix: String,
    pub sendmail_program: String,

    // -- Sync --
    pub interval_secs: u64,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device_address: None,
            source: None,
            log_dir: None,
            device_prefix_width: constants::DEVICE_PREFIX_WIDTH,
            device_timestamp_format: constants::DEVICE_TIMESTAMP_FORMAT.to_string(),
            notify_channels: None,
            email_to: None,
            email_from: None,
            subject_prefix: constants::DEFAULT_SUBJECT_PREFIX.to_string(),
            sendmail_program: constants::DEFAULT_SENDMAIL_PROGRAM.to_string(),
            interval_secs: constants::DEFAULT_SYNC_INTERVAL_SECS,
            log_level: None,
        }
    }
}

/// Load and validate the config file at `config_path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings (first run).
/// If the file is unreadable or unparseable, returns defaults with a warning.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<String>) {
    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), Vec::new());
    }

    let content = match std::fs::read_to_string(config_path) {
        Ok(c) => c,
        Err(e) => {
            let msg = format!(
                "Could not read config file '{}': {e}. Using defaults.",
                config_path.display()
            );
            tracing::warn!("{}", msg);
            return (AppConfig::default(), vec![msg]);
        }
    };

    let (config, warnings) = parse_config(&content, config_path);
    tracing::info!(path = %config_path.display(), "Loaded config.toml");
    (config, warnings)
}

/// Parse and validate config text. `origin` only labels diagnostics.
pub fn parse_config(content: &str, origin: &Path) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();

    let raw: RawConfig = match toml::from_str(content) {
        Ok(r) => r,
        Err(e) => {
            let msg = format!(
                "Failed to parse config file '{}': {e}. Using defaults.",
                origin.display()
            );
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    let mut config = AppConfig::default();

    // -- Device --
    config.device_address = raw
        .device
        .address
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty());

    // -- Source --
    config.source = validate_source(&raw.source, &mut warnings);

    // -- Storage --
    config.log_dir = raw
        .storage
        .log_dir
        .filter(|d| !d.is_empty())
        .map(PathBuf::from);

    // -- Parsing: device_prefix_width --
    if let Some(width) = raw.parsing.device_prefix_width {
        if (1..=constants::MAX_PREFIX_WIDTH).contains(&width) {
            config.device_prefix_width = width;
        } else {
            warnings.push(format!(
                "[parsing] device_prefix_width = {width} is out of range (1-{}). Using default ({}).",
                constants::MAX_PREFIX_WIDTH,
                constants::DEVICE_PREFIX_WIDTH,
            ));
        }
    }

    // -- Parsing: device_timestamp_format --
    if let Some(format) = raw.parsing.device_timestamp_format {
        if is_valid_strftime(&format) {
            config.device_timestamp_format = format;
        } else {
            warnings.push(format!(
                "[parsing] device_timestamp_format = \"{format}\" is not a valid chrono format. \
                 Using default (\"{}\").",
                constants::DEVICE_TIMESTAMP_FORMAT,
            ));
        }
    }

    // -- Notify --
    config.notify_channels = raw.notify.channels;
    config.email_to = raw.notify.email_to.filter(|s| !s.is_empty());
    config.email_from = raw.notify.email_from.filter(|s| !s.is_empty());
    if let Some(prefix) = raw.notify.subject_prefix {
        config.subject_prefix = prefix;
    }
    if let Some(program) = raw.notify.sendmail_program.filter(|s| !s.is_empty()) {
        config.sendmail_program = program;
    }

    // -- Sync: interval_seconds --
    if let Some(secs) = raw.sync.interval_seconds {
        if (constants::MIN_SYNC_INTERVAL_SECS..=constants::MAX_SYNC_INTERVAL_SECS).contains(&secs) {
            config.interval_secs = secs;
        } else {
            warnings.push(format!(
                "[sync] interval_seconds = {secs} is out of range ({}-{}). Using default ({}).",
                constants::MIN_SYNC_INTERVAL_SECS,
                constants::MAX_SYNC_INTERVAL_SECS,
                constants::DEFAULT_SYNC_INTERVAL_SECS,
            ));
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.clone());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(count = warnings.len(), "Config validation produced warnings");
    }

    (config, warnings)
}

fn validate_source(section: &SourceSection, warnings: &mut Vec<String>) -> Option<SourceSpec> {
    let kind = section.kind.as_deref()?.to_lowercase();
    match kind.as_str() {
        "file" => match section.path.as_deref().filter(|p| !p.is_empty()) {
            Some(path) => Some(SourceSpec::File(PathBuf::from(path))),
            None => {
                warnings.push("[source] kind = \"file\" requires `path`. Source ignored.".to_string());
                None
            }
        },
        "command" => match section.program.as_deref().filter(|p| !p.is_empty()) {
            Some(program) => Some(SourceSpec::Command {
                program: program.to_string(),
                args: section.args.clone().unwrap_or_default(),
            }),
            None => {
                warnings
                    .push("[source] kind = \"command\" requires `program`. Source ignored.".to_string());
                None
            }
        },
        other => {
            warnings.push(format!(
                "[source] kind = \"{other}\" is not recognised. Expected \"file\" or \"command\"."
            ));
            None
        }
    }
}

fn is_valid_strftime(format: &str) -> bool {
    !format.is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}
