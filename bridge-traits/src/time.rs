//! Time and Logging Abstractions
//!
//! Provides an injectable time source and logging sink for testing and
//! platform integration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Result;

/// Time source for deterministic testing.
///
/// The disk cache reads "now" from here when deciding whether an entry has
/// outlived its time-to-live.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn unix_timestamp_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Host log levels, lowest to highest.
///
/// `Fault` has no `tracing` counterpart; it is produced from `ERROR` events
/// that carry a `fault = true` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fault,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fault => "FAULT",
        }
    }
}

/// One structured log record handed to a [`LoggerSink`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    pub target: String,
    pub message: String,
    pub fields: HashMap<String, String>,
    pub span_id: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            target: target.into(),
            message: message.into(),
            fields: HashMap::new(),
            span_id: None,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }
}

/// Forwards structured logs to the host (os_log, Logcat, a file, ...).
///
/// The core never branches on what a sink does with an entry.
#[async_trait::async_trait]
pub trait LoggerSink: Send + Sync {
    async fn log(&self, entry: LogEntry) -> Result<()>;

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Entries below this level are not forwarded.
    fn min_level(&self) -> LogLevel {
        LogLevel::Info
    }
}

/// Prints entries to stdout.
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    pub min_level: LogLevel,
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
        }
    }
}

#[async_trait::async_trait]
impl LoggerSink for ConsoleLogger {
    async fn log(&self, entry: LogEntry) -> Result<()> {
        if entry.level >= self.min_level {
            println!(
                "[{}] {} {}: {}",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
                entry.level.as_str(),
                entry.target,
                entry.message
            );

            if !entry.fields.is_empty() {
                println!("  Fields: {:?}", entry.fields);
            }
        }
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        self.min_level
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

#[async_trait::async_trait]
impl LoggerSink for NoopLogger {
    async fn log(&self, _entry: LogEntry) -> Result<()> {
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Fault
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock() {
        let clock = SystemClock;
        let before = Utc::now();
        let now = clock.now();

        assert!(now >= before);
        assert!(clock.unix_timestamp_millis() >= before.timestamp_millis());
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Fault);
    }

    #[test]
    fn test_log_entry_builder() {
        let entry = LogEntry::new(LogLevel::Info, "test", "Test message")
            .with_field("asset", "warship")
            .with_span_id("provide");

        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.target, "test");
        assert_eq!(entry.message, "Test message");
        assert_eq!(entry.fields.get("asset"), Some(&"warship".to_string()));
        assert_eq!(entry.span_id, Some("provide".to_string()));
    }

    #[tokio::test]
    async fn test_console_logger() {
        let logger = ConsoleLogger::default();
        let entry = LogEntry::new(LogLevel::Info, "test", "Test log");

        logger.log(entry).await.unwrap();
    }

    #[tokio::test]
    async fn test_noop_logger_accepts_everything() {
        let logger = NoopLogger;

        logger
            .log(LogEntry::new(LogLevel::Fault, "test", "ignored"))
            .await
            .unwrap();
        logger.flush().await.unwrap();
        assert_eq!(logger.min_level(), LogLevel::Fault);
    }
}
