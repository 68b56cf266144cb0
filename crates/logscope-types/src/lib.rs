//! Shared types for logscope
//!
//! This crate contains the data structures exchanged between the parser,
//! the comparator and the command line front end.

mod timestamp;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use timestamp::{iso_millis, parse_timestamp, timestamp_from_epoch};

/// Key/value data carried from structured log formats
pub type Fields = serde_json::Map<String, serde_json::Value>;

// ============================================================================
// Log Types
// ============================================================================

/// Log severity level, ordered from least to most severe
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl LogLevel {
    /// Every level, least severe first
    pub const ALL: [LogLevel; 8] = [
        Self::Debug,
        Self::Info,
        Self::Notice,
        Self::Warning,
        Self::Error,
        Self::Critical,
        Self::Alert,
        Self::Emergency,
    ];

    /// Parse log level from common spellings. Unrecognized tokens become `Info`.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "debug" | "dbg" | "trace" => Self::Debug,
            "info" | "inf" | "information" => Self::Info,
            "notice" => Self::Notice,
            "warning" | "warn" => Self::Warning,
            "error" | "err" => Self::Error,
            "critical" | "crit" | "fatal" | "panic" => Self::Critical,
            "alert" => Self::Alert,
            "emergency" | "emerg" => Self::Emergency,
            _ => Self::Info,
        }
    }

    /// Map a numeric level to a severity.
    ///
    /// Values of 100 and above follow the Monolog scale (100 = DEBUG ... 600 =
    /// EMERGENCY); smaller values follow the pino/bunyan scale (10..60).
    pub fn from_numeric(n: i64) -> Self {
        if n >= 100 {
            return match n {
                i64::MIN..=199 => Self::Debug,
                200..=249 => Self::Info,
                250..=299 => Self::Notice,
                300..=399 => Self::Warning,
                400..=499 => Self::Error,
                500..=549 => Self::Critical,
                550..=599 => Self::Alert,
                _ => Self::Emergency,
            };
        }

        match n {
            i64::MIN..=20 => Self::Debug,
            21..=30 => Self::Info,
            31..=40 => Self::Warning,
            41..=50 => Self::Error,
            _ => Self::Critical,
        }
    }

    /// Upper-case display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Notice => "NOTICE",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
            Self::Alert => "ALERT",
            Self::Emergency => "EMERGENCY",
        }
    }

    /// ERROR or anything more severe
    pub fn is_error(&self) -> bool {
        *self >= Self::Error
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single parsed log record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Unique within one parse of one file
    pub id: String,

    /// Parsed timestamp, or the parse time when the source had none
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,

    pub level: LogLevel,

    /// Text left after structural fields were extracted
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Fields>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Fields>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    /// Originating file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,

    /// 1-based line number within the source file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u64>,
}

impl LogEntry {
    /// Create a new entry stamped with the current time at `Info` level
    pub fn new(id: String, source_file: &str, line_number: u64, message: String) -> Self {
        Self {
            id,
            timestamp: Utc::now(),
            level: LogLevel::Info,
            message,
            context: None,
            extra: None,
            channel: None,
            environment: None,
            source_file: Some(source_file.to_string()),
            line_number: Some(line_number),
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Use `timestamp` when present, keep the current time otherwise
    pub fn with_timestamp(mut self, timestamp: Option<DateTime<Utc>>) -> Self {
        if let Some(ts) = timestamp {
            self.timestamp = ts;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_aliases() {
        assert_eq!(LogLevel::from_str("WARN"), LogLevel::Warning);
        assert_eq!(LogLevel::from_str("warning"), LogLevel::Warning);
        assert_eq!(LogLevel::from_str("Fatal"), LogLevel::Critical);
        assert_eq!(LogLevel::from_str("emerg"), LogLevel::Emergency);
        assert_eq!(LogLevel::from_str("verbose"), LogLevel::Info);
        assert_eq!(LogLevel::from_str(""), LogLevel::Info);
    }

    #[test]
    fn test_numeric_levels() {
        assert_eq!(LogLevel::from_numeric(100), LogLevel::Debug);
        assert_eq!(LogLevel::from_numeric(250), LogLevel::Notice);
        assert_eq!(LogLevel::from_numeric(400), LogLevel::Error);
        assert_eq!(LogLevel::from_numeric(600), LogLevel::Emergency);
        assert_eq!(LogLevel::from_numeric(30), LogLevel::Info);
        assert_eq!(LogLevel::from_numeric(50), LogLevel::Error);
        assert_eq!(LogLevel::from_numeric(60), LogLevel::Critical);
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Alert < LogLevel::Emergency);
        assert!(LogLevel::Critical.is_error());
        assert!(!LogLevel::Warning.is_error());
        let mut sorted = LogLevel::ALL;
        sorted.sort();
        assert_eq!(sorted, LogLevel::ALL);
    }

    #[test]
    fn test_entry_serializes_camel_case_and_skips_missing() {
        let mut entry = LogEntry::new("app.log-generic-0".into(), "app.log", 1, "hello".into())
            .with_level(LogLevel::Error)
            .with_timestamp(parse_timestamp("2024-01-15 10:30:15"));
        entry.environment = Some("local".into());

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains(r#""timestamp":"2024-01-15T10:30:15.000Z""#));
        assert!(json.contains(r#""level":"ERROR""#));
        assert!(json.contains(r#""sourceFile":"app.log""#));
        assert!(json.contains(r#""lineNumber":1"#));
        assert!(!json.contains("channel"));
        assert!(!json.contains("context"));

        let back: LogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
