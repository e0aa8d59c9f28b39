// RouterLog - app/source.rs
//
// Device log sources. A source returns the device's current log window as
// one text blob, or fails outright; there is no partial result and no retry.
//
// Connection and authentication belong to the source. `CommandSource` hands
// credentials to its child through the inherited environment; arguments are
// never logged.

use crate::platform::config::SourceSpec;
use crate::util::constants;
use crate::util::error::FetchError;
use std::path::PathBuf;
use std::process::Command;

/// Capability that fetches the raw device log blob.
pub trait LogSource {
    /// Short human-readable description for diagnostics.
    fn describe(&self) -> String;

    /// Fetch the current device log window.
    fn fetch(&self) -> Result<String, FetchError>;
}

/// Construct the source described by `source`.
pub fn build_source(source: &SourceSpec) -> Box<dyn LogSource> {
    match source {
        SourceSpec::File(path) => Box::new(FileSource::new(path.clone())),
        SourceSpec::Command { program, args } => {
            Box::new(CommandSource::new(program.clone(), args.clone()))
        }
    }
}

// =============================================================================
// File source
// =============================================================================

/// Reads the blob from a file, e.g. a log exported from the router UI.
#[derive(Debug, Clone)]
pub struct FileSource {
    pub path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LogSource for FileSource {
    fn describe(&self) -> String {
        format!("file '{}'", self.path.display())
    }

    fn fetch(&self) -> Result<String, FetchError> {
        let bytes = std::fs::read(&self.path).map_err(|source| FetchError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

// =============================================================================
// Command source
// =============================================================================

/// Runs an external program and takes its stdout as the blob.
///
/// Typical use is a small TR-064 wrapper that calls `DeviceInfo1` /
/// `GetDeviceLog` and prints the result, e.g. `fritz-devicelog 192.168.178.1`.
#[derive(Debug, Clone)]
pub struct CommandSource {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSource {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl LogSource for CommandSource {
    fn describe(&self) -> String {
        format!("command '{}'", self.program)
    }

    fn fetch(&self) -> Result<String, FetchError> {
        tracing::debug!(program = %self.program, args = self.args.len(), "Running fetch command");

        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|source| FetchError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::CommandFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: excerpt(stderr.trim(), constants::MAX_STDERR_EXCERPT),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("... [truncated]");
    out
}
