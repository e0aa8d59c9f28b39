// RouterLog - app/notify.rs
//
// Notification channels. Every channel implements `Notifier`; which ones run
// is decided by configuration and the sync loop never knows which are active.
// An empty entry slice means "nothing new" and is always valid input.

use crate::core::model::LogEntry;
use crate::core::parser;
use crate::util::constants;
use crate::util::error::NotifyError;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::io::Write;
use std::process::{Command, Stdio};
use std::str::FromStr;

/// Capability that consumes the new entries of one sync cycle.
pub trait Notifier {
    /// Channel name for diagnostics.
    fn name(&self) -> &'static str;

    fn notify(&self, device: &str, entries: &[LogEntry]) -> Result<(), NotifyError>;
}

// =============================================================================
// Channel selection
// =============================================================================

/// Notification channels that can be named in config or on the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyChannel {
    Stdout,
    Email,
    Json,
}

impl FromStr for NotifyChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stdout" | "console" => Ok(Self::Stdout),
            "email" | "mail" => Ok(Self::Email),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown notify channel \"{other}\" (expected stdout, email, or json)"
            )),
        }
    }
}

/// Settings of the email channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSettings {
    pub to: String,
    pub from: Option<String>,
    pub subject_prefix: String,
    /// sendmail-compatible program fed the message on stdin.
    pub program: String,
    pub args: Vec<String>,
}

impl EmailSettings {
    pub fn new(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            from: None,
            subject_prefix: constants::DEFAULT_SUBJECT_PREFIX.to_string(),
            program: constants::DEFAULT_SENDMAIL_PROGRAM.to_string(),
            args: constants::SENDMAIL_ARGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Build the notifier set for the selected channels.
pub fn build_notifiers(
    channels: &[NotifyChannel],
    email: Option<&EmailSettings>,
) -> Vec<Box<dyn Notifier>> {
    let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();
    for channel in channels {
        match channel {
            NotifyChannel::Stdout => notifiers.push(Box::new(ConsoleNotifier)),
            NotifyChannel::Json => notifiers.push(Box::new(JsonNotifier)),
            NotifyChannel::Email => match email {
                Some(settings) => notifiers.push(Box::new(EmailNotifier::new(settings.clone()))),
                None => tracing::warn!("Email channel selected without a recipient; skipping"),
            },
        }
    }
    notifiers
}

// =============================================================================
// Console
// =============================================================================

/// Prints a framed report to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

/// Text of the console report.
pub fn render_console(device: &str, entries: &[LogEntry]) -> String {
    let ruler = "-".repeat(constants::CONSOLE_RULER_WIDTH);
    let mut out = String::new();
    out.push_str(&ruler);
    out.push('\n');
    if entries.is_empty() {
        out.push_str(&format!("No new entries on {device}.\n"));
    } else {
        out.push_str(&format!("{} new log entries on {device}:\n\n", entries.len()));
        for entry in entries {
            out.push_str(&parser::to_text(entry));
            out.push('\n');
        }
    }
    out.push_str(&ruler);
    out.push('\n');
    out
}

impl Notifier for ConsoleNotifier {
    fn name(&self) -> &'static str {
        "stdout"
    }

    fn notify(&self, device: &str, entries: &[LogEntry]) -> Result<(), NotifyError> {
        let report = render_console(device, entries);
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(report.as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|source| NotifyError::Io {
                channel: self.name(),
                source,
            })
    }
}

// =============================================================================
// JSON lines
// =============================================================================

/// Writes one JSON object per new entry to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonNotifier;

#[derive(Serialize)]
struct JsonRecord<'a> {
    device: &'a str,
    timestamp: DateTime<Local>,
    message: &'a str,
}

/// One newline-terminated JSON object per entry; empty for no entries.
pub fn render_json_lines(device: &str, entries: &[LogEntry]) -> Result<String, NotifyError> {
    let mut out = String::new();
    for entry in entries {
        let record = JsonRecord {
            device,
            timestamp: entry.timestamp.with_timezone(&Local),
            message: &entry.message,
        };
        out.push_str(&serde_json::to_string(&record)?);
        out.push('\n');
    }
    Ok(out)
}

impl Notifier for JsonNotifier {
    fn name(&self) -> &'static str {
        "json"
    }

    fn notify(&self, device: &str, entries: &[LogEntry]) -> Result<(), NotifyError> {
        let lines = render_json_lines(device, entries)?;
        if lines.is_empty() {
            return Ok(());
        }
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(lines.as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|source| NotifyError::Io {
                channel: self.name(),
                source,
            })
    }
}

// =============================================================================
// Email
// =============================================================================

/// Sends a plain-text report through a sendmail-compatible program.
/// Nothing is sent when there are no new entries.
#[derive(Debug, Clone)]
pub struct EmailNotifier {
    settings: EmailSettings,
}

impl EmailNotifier {
    pub fn new(settings: EmailSettings) -> Self {
        Self { settings }
    }

    /// Full RFC 5322 message, headers included.
    pub fn build_message(&self, device: &str, entries: &[LogEntry], now: DateTime<Local>) -> String {
        let mut msg = String::new();
        if let Some(from) = &self.settings.from {
            msg.push_str(&format!("From: {from}\r\n"));
        }
        msg.push_str(&format!("To: {}\r\n", self.settings.to));
        msg.push_str(&format!(
            "Subject: {} - {}\r\n",
            self.settings.subject_prefix,
            now.format("%Y-%m-%d %H:%M:%S")
        ));
        msg.push_str(&format!("Date: {}\r\n", now.to_rfc2822()));
        msg.push_str("MIME-Version: 1.0\r\n");
        msg.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        msg.push_str("Content-Transfer-Encoding: 8bit\r\n");
        msg.push_str("\r\n");
        msg.push_str(&format!("New log entries have been fetched from {device}:\r\n\r\n"));
        for entry in entries {
            msg.push_str(&parser::to_text(entry));
            msg.push_str("\r\n");
        }
        msg
    }

    fn send(&self, message: &str) -> Result<(), NotifyError> {
        let program = &self.settings.program;
        let spawn_err = |source: std::io::Error| NotifyError::Spawn {
            program: program.clone(),
            source,
        };

        let mut child = Command::new(program)
            .args(&self.settings.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(spawn_err)?;

        let fed = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(message.as_bytes()),
            None => Ok(()),
        };

        // Always reap the child, even when feeding it failed.
        let status = child.wait().map_err(spawn_err)?;
        if let Err(source) = fed {
            tracing::debug!(program = %program, status = %status, "Mail program closed stdin early");
            if status.success() {
                return Err(spawn_err(source));
            }
        }
        if !status.success() {
            return Err(NotifyError::MailRejected {
                program: program.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

impl Notifier for EmailNotifier {
    fn name(&self) -> &'static str {
        "email"
    }

    fn notify(&self, device: &str, entries: &[LogEntry]) -> Result<(), NotifyError> {
        if entries.is_empty() {
            tracing::debug!(device, "No new entries; email not sent");
            return Ok(());
        }
        let message = self.build_message(device, entries, Local::now());
        self.send(&message)?;
        tracing::info!(device, to = %self.settings.to, entries = entries.len(), "Notification email sent");
        Ok(())
    }
}
