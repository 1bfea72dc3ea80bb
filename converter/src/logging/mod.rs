//! Progress and diagnostic logging.
//!
//! Every pipeline stage receives a [`LogSink`] instead of writing to a
//! global stream. The binary uses [`ConsoleSink`]; tests use
//! [`MemorySink`] to assert on diagnostics.

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

/// Log level, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Nesting depth (per-file and per-entity lines sit under their stage)
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }
}

/// Destination for log entries.
pub trait LogSink {
    fn log(&self, entry: LogEntry);

    fn info(&self, message: &str) {
        self.log(LogEntry::info(message));
    }

    fn success(&self, message: &str) {
        self.log(LogEntry::success(message));
    }

    fn warning(&self, message: &str) {
        self.log(LogEntry::warning(message));
    }

    fn error(&self, message: &str) {
        self.log(LogEntry::error(message));
    }
}

/// Prints entries to the terminal.
///
/// Errors go to stderr, everything else to stdout. A quiet sink drops
/// entries below [`LogLevel::Warning`].
#[derive(Debug, Clone, Default)]
pub struct ConsoleSink {
    quiet: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quiet() -> Self {
        Self { quiet: true }
    }

    fn format(entry: &LogEntry) -> String {
        let prefix = match entry.level {
            LogLevel::Info => "  ",
            LogLevel::Success => "  ✓",
            LogLevel::Warning => "  ⚠️",
            LogLevel::Error => "  ❌",
        };
        let indent = "  ".repeat(entry.indent as usize);
        format!("{}{} {}", indent, prefix, entry.message)
    }
}

impl LogSink for ConsoleSink {
    fn log(&self, entry: LogEntry) {
        if self.quiet && entry.level < LogLevel::Warning {
            return;
        }
        let line = Self::format(&entry);
        if entry.level == LogLevel::Error {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

/// Collects entries in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: RefCell<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.borrow().clone()
    }

    /// Messages logged at exactly `level`.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.message.clone())
            .collect()
    }
}

impl LogSink for MemorySink {
    fn log(&self, entry: LogEntry) {
        self.entries.borrow_mut().push(entry);
    }
}

/// Discards every entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _entry: LogEntry) {}
}
