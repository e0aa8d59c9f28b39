// RouterLog - app/settings.rs
//
// Resolution of everything a sync run needs into one explicit value,
// constructed once at startup and passed into the `Syncer`.
//
// Priority for every setting: CLI override > config.toml > built-in default.

use crate::app::notify::{EmailSettings, NotifyChannel};
use crate::core::model::LineFormat;
use crate::platform::config::{self, AppConfig, SourceSpec};
use crate::util::constants;
use crate::util::error::ConfigError;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Values supplied on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub device_address: Option<String>,
    pub source_file: Option<PathBuf>,
    /// Program followed by its arguments.
    pub source_command: Option<Vec<String>>,
    pub log_dir: Option<PathBuf>,
    pub channels: Option<Vec<String>>,
    pub interval_secs: Option<u64>,
}

/// Fully resolved settings of a sync run.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Device identifier handed to notifiers.
    pub device_address: String,
    pub source: SourceSpec,
    /// `<log_dir>/<address>.log`.
    pub store_path: PathBuf,
    pub device_format: LineFormat,
    pub channels: Vec<NotifyChannel>,
    pub email: Option<EmailSettings>,
    /// Pause between cycles in watch mode.
    pub interval: Duration,
}

impl SyncSettings {
    /// Merge CLI overrides into the validated config.
    ///
    /// `default_log_dir` is used when neither names a storage directory.
    /// Does not touch the filesystem; see `platform::config::ensure_dir`.
    pub fn resolve(
        config: &AppConfig,
        overrides: &Overrides,
        default_log_dir: &Path,
    ) -> Result<Self, ConfigError> {
        let device_address = overrides
            .device_address
            .clone()
            .or_else(|| config.device_address.clone())
            .filter(|a| !a.trim().is_empty())
            .ok_or(ConfigError::MissingValue {
                field: "device.address",
                hint: "Pass --device or set [device] address in config.toml.",
            })?;

        let source = resolve_source(config, overrides)?;

        let log_dir = overrides
            .log_dir
            .clone()
            .or_else(|| config.log_dir.clone())
            .unwrap_or_else(|| default_log_dir.to_path_buf());
        let store_path = log_dir.join(config::store_file_name(&device_address));

        let device_format =
            LineFormat::device_with(config.device_prefix_width, &config.device_timestamp_format);

        let channel_names = overrides
            .channels
            .clone()
            .or_else(|| config.notify_channels.clone())
            .unwrap_or_else(|| vec!["stdout".to_string()]);
        let mut channels = Vec::new();
        for name in &channel_names {
            let channel = name
                .parse::<NotifyChannel>()
                .map_err(|reason| ConfigError::InvalidValue {
                    field: "notify.channels",
                    value: name.clone(),
                    expected: reason,
                })?;
            if !channels.contains(&channel) {
                channels.push(channel);
            }
        }

        let email = match &config.email_to {
            Some(to) => Some(EmailSettings {
                from: config.email_from.clone(),
                subject_prefix: config.subject_prefix.clone(),
                program: config.sendmail_program.clone(),
                ..EmailSettings::new(to.clone())
            }),
            None if channels.contains(&NotifyChannel::Email) => {
                return Err(ConfigError::MissingValue {
                    field: "notify.email_to",
                    hint: "The email channel needs a recipient in [notify] email_to.",
                })
            }
            None => None,
        };

        let interval_secs = match overrides.interval_secs {
            Some(secs)
                if !(constants::MIN_SYNC_INTERVAL_SECS..=constants::MAX_SYNC_INTERVAL_SECS)
                    .contains(&secs) =>
            {
                return Err(ConfigError::InvalidValue {
                    field: "interval",
                    value: secs.to_string(),
                    expected: format!(
                        "{}-{} seconds",
                        constants::MIN_SYNC_INTERVAL_SECS,
                        constants::MAX_SYNC_INTERVAL_SECS
                    ),
                });
            }
            Some(secs) => secs,
            None => config.interval_secs,
        };

        Ok(Self {
            device_address,
            source,
            store_path,
            device_format,
            channels,
            email,
            interval: Duration::from_secs(interval_secs),
        })
    }

    /// Directory holding the store file.
    pub fn log_dir(&self) -> &Path {
        self.store_path.parent().unwrap_or(Path::new("."))
    }
}

fn resolve_source(config: &AppConfig, overrides: &Overrides) -> Result<SourceSpec, ConfigError> {
    if let Some(path) = &overrides.source_file {
        return Ok(SourceSpec::File(path.clone()));
    }
    if let Some(command) = &overrides.source_command {
        let (program, args) = command.split_first().ok_or(ConfigError::InvalidValue {
            field: "source-cmd",
            value: String::new(),
            expected: "a program name followed by optional arguments".to_string(),
        })?;
        return Ok(SourceSpec::Command {
            program: program.clone(),
            args: args.to_vec(),
        });
    }
    config.source.clone().ok_or(ConfigError::MissingValue {
        field: "source",
        hint: "Pass --source-file / --source-cmd or set a [source] section in config.toml.",
    })
}
