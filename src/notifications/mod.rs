use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info};

/// Activity log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }
}

/// A timestamped, human-readable message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

/// Bounded activity log, newest entry first
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: Vec<LogEntry>,
    max_entries: usize,
}

impl ActivityLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Error => error!("{}", message),
            Severity::Info | Severity::Success => info!("{}", message),
        }

        self.entries.insert(
            0,
            LogEntry {
                timestamp: Local::now(),
                severity,
                message,
            },
        );
        self.entries.truncate(self.max_entries);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Severity::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Severity::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message);
    }

    pub fn recent(&self, limit: usize) -> &[LogEntry] {
        &self.entries[..limit.min(self.entries.len())]
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first_and_bounded() {
        let mut log = ActivityLog::new(3);
        log.info("one");
        log.success("two");
        log.error("three");
        log.info("four");

        assert_eq!(log.len(), 3);
        let recent = log.recent(10);
        assert_eq!(recent[0].message, "four");
        assert_eq!(recent[1].severity, Severity::Error);
        assert_eq!(recent[2].message, "two");
        assert_eq!(log.recent(1).len(), 1);
    }

    #[test]
    fn test_entry_display() {
        let mut log = ActivityLog::default();
        log.success("Added result");
        let line = log.recent(1)[0].to_string();
        assert!(line.starts_with('['));
        assert!(line.ends_with("] Added result"));
    }
}
