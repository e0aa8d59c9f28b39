// RouterLog - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading and logging initialisation
// 3. Settings resolution and storage directory bootstrap
// 4. One sync cycle, or watch mode

use clap::Parser;
use routerlog::app::settings::{Overrides, SyncSettings};
use routerlog::app::sync::Syncer;
use routerlog::platform::config::{self, PlatformPaths};
use routerlog::util;
use std::path::PathBuf;

/// RouterLog - keep a complete local copy of a router's rolling device log.
///
/// Each run fetches the device's current log window, appends the entries
/// not yet stored locally, and reports them on the selected channels.
#[derive(Parser, Debug)]
#[command(name = "routerlog", version, about)]
struct Cli {
    /// Router hostname or IP address (also names the local log file).
    #[arg(short = 'D', long = "device")]
    device: Option<String>,

    /// Read the device log from this file.
    #[arg(long = "source-file", conflicts_with = "source_cmd")]
    source_file: Option<PathBuf>,

    /// Run this program and read the device log from its stdout.
    /// Arguments for it follow a `--`.
    #[arg(long = "source-cmd", value_name = "PROGRAM")]
    source_cmd: Option<String>,

    /// Arguments passed to --source-cmd.
    #[arg(last = true, requires = "source_cmd")]
    source_args: Vec<String>,

    /// Directory holding the per-device log files.
    #[arg(short = 'l', long = "log-dir")]
    log_dir: Option<PathBuf>,

    /// Notification channels, comma separated: stdout, email, json.
    #[arg(short = 'n', long = "notify", value_delimiter = ',')]
    notify: Option<Vec<String>>,

    /// Keep running, syncing every --interval seconds.
    #[arg(short = 'w', long = "watch")]
    watch: bool,

    /// Seconds between cycles in watch mode.
    #[arg(short = 'i', long = "interval")]
    interval: Option<u64>,

    /// Stop watch mode after this many cycles.
    #[arg(long = "cycles", requires = "watch")]
    cycles: Option<u64>,

    /// Path to config.toml (defaults to the platform config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            device_address: self.device.clone(),
            source_file: self.source_file.clone(),
            source_command: self.source_cmd.as_ref().map(|program| {
                std::iter::once(program.clone())
                    .chain(self.source_args.iter().cloned())
                    .collect()
            }),
            log_dir: self.log_dir.clone(),
            channels: self.notify.clone(),
            interval_secs: self.interval,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let platform_paths = PlatformPaths::resolve();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| platform_paths.config_file());
    let (app_config, config_warnings) = config::load_config(&config_path);

    util::logging::init(cli.debug, app_config.log_level.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        config = %config_path.display(),
        "RouterLog starting"
    );
    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Config warning");
    }

    let settings = match SyncSettings::resolve(
        &app_config,
        &cli.overrides(),
        &platform_paths.default_log_dir(),
    ) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = config::ensure_dir(settings.log_dir()) {
        tracing::error!(error = %e, "Storage directory unavailable");
        eprintln!("Error: {e}");
        std::process::exit(2);
    }

    tracing::debug!(
        device = %settings.device_address,
        store = %settings.store_path.display(),
        channels = ?settings.channels,
        "Settings resolved"
    );

    let syncer = Syncer::new(settings);

    if cli.watch {
        let summary = syncer.run_watch(cli.cycles);
        if summary.cycles > 0 && summary.failures == summary.cycles {
            std::process::exit(1);
        }
        return;
    }

    match syncer.run_once() {
        Ok(outcome) => {
            tracing::debug!(new = outcome.new_entries.len(), "Single run finished");
        }
        Err(e) => {
            tracing::error!(error = %e, "Sync failed");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
