//! Ledger audit log
//!
//! Every dispatched command and every swallowed persistence failure leaves an
//! entry here, stamped with virtual time and the ledger hash after the change.
//! The same events are emitted through `tracing` for whoever installed a
//! subscriber; the audit log is what tests inspect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::StateHash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    /// Virtual time of the event
    pub timestamp: DateTime<Utc>,
    /// Command label, e.g. `debit` or `append_transaction`
    pub label: Option<String>,
    /// Ledger hash after the event, if the ledger was touched
    pub state_hash: Option<StateHash>,
    pub message: String,
    pub metadata: Vec<(String, String)>,
}

impl LogEntry {
    pub fn new(level: LogLevel, timestamp: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp,
            label: None,
            state_hash: None,
            message: message.into(),
            metadata: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_state_hash(mut self, hash: StateHash) -> Self {
        self.state_hash = Some(hash);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Collects log entries at or above a minimum level, optionally keeping only
/// the most recent `max_entries`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    entries: Vec<LogEntry>,
    min_level: LogLevel,
    #[serde(default)]
    max_entries: Option<usize>,
}

impl AuditLog {
    pub fn new(min_level: LogLevel) -> Self {
        Self {
            entries: Vec::new(),
            min_level,
            max_entries: None,
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self.truncate_oldest();
        self
    }

    pub fn all() -> Self {
        Self::new(LogLevel::Trace)
    }

    pub fn with_info_level() -> Self {
        Self::new(LogLevel::Info)
    }

    pub fn log(&mut self, entry: LogEntry) {
        if entry.level >= self.min_level {
            self.entries.push(entry);
            self.truncate_oldest();
        }
    }

    fn truncate_oldest(&mut self) {
        if let Some(max) = self.max_entries {
            let excess = self.entries.len().saturating_sub(max);
            if excess > 0 {
                self.entries.drain(..excess);
            }
        }
    }

    pub fn debug(&mut self, timestamp: DateTime<Utc>, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Debug, timestamp, message));
    }

    pub fn info(&mut self, timestamp: DateTime<Utc>, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Info, timestamp, message));
    }

    pub fn warn(&mut self, timestamp: DateTime<Utc>, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Warn, timestamp, message));
    }

    pub fn error(&mut self, timestamp: DateTime<Utc>, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Error, timestamp, message));
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

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn filter_by_level(&self, level: LogLevel) -> Vec<&LogEntry> {
        self.entries.iter().filter(|e| e.level == level).collect()
    }

    pub fn filter_by_label(&self, label: &str) -> Vec<&LogEntry> {
        self.entries
            .iter()
            .filter(|e| e.label.as_deref() == Some(label))
            .collect()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::with_info_level()
    }
}
