//! Append-only processing log shared by every stage of one file run.
//!
//! Stages receive a `&mut LogSink` and append [`LogEntry`] values in the
//! order they act; that order is the audit trail. Each entry is also
//! mirrored to `tracing` so console output follows the run live.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Severity used for console mirroring only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogEntry {
    /// Pipeline step, e.g. "Apply Filters"
    pub step: String,
    /// RFC 3339 UTC timestamp
    pub timestamp: String,
    /// Component that produced the entry
    pub source: String,
    /// What was acted on
    pub action_detail: String,
    /// Outcome or status string
    pub message: String,
    #[serde(skip, default = "default_level")]
    pub level: LogLevel,
}

fn default_level() -> LogLevel {
    LogLevel::Info
}

impl LogEntry {
    pub fn new(
        level: LogLevel,
        step: impl Into<String>,
        source: impl Into<String>,
        detail: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            step: step.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            source: source.into(),
            action_detail: detail.into(),
            message: message.into(),
            level,
        }
    }
}

/// Ordered collector of log entries for one processing run.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    entries: Vec<LogEntry>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and mirror it to `tracing`.
    pub fn record(&mut self, entry: LogEntry) {
        match entry.level {
            LogLevel::Info | LogLevel::Success => tracing::info!(
                step = %entry.step,
                source = %entry.source,
                detail = %entry.action_detail,
                "{}",
                entry.message
            ),
            LogLevel::Warning => tracing::warn!(
                step = %entry.step,
                source = %entry.source,
                detail = %entry.action_detail,
                "{}",
                entry.message
            ),
            LogLevel::Error => tracing::error!(
                step = %entry.step,
                source = %entry.source,
                detail = %entry.action_detail,
                "{}",
                entry.message
            ),
        }
        self.entries.push(entry);
    }

    pub fn info(&mut self, step: &str, source: &str, detail: impl Into<String>, message: impl Into<String>) {
        self.record(LogEntry::new(LogLevel::Info, step, source, detail, message));
    }

    pub fn success(&mut self, step: &str, source: &str, detail: impl Into<String>, message: impl Into<String>) {
        self.record(LogEntry::new(LogLevel::Success, step, source, detail, message));
    }

    pub fn warning(&mut self, step: &str, source: &str, detail: impl Into<String>, message: impl Into<String>) {
        self.record(LogEntry::new(LogLevel::Warning, step, source, detail, message));
    }

    pub fn error(&mut self, step: &str, source: &str, detail: impl Into<String>, message: impl Into<String>) {
        self.record(LogEntry::new(LogLevel::Error, step, source, detail, message));
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }

    /// Ordered JSON array of entries.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.entries)
    }
}
