use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::Regex;

use logscope_types::{LogEntry, LogLevel, parse_timestamp};

use crate::LogsError;

/// Text search applied to an entry's searchable fields
#[derive(Clone)]
enum Search {
    /// Lower-cased needle
    Substring(String),
    Regex(Regex),
}

/// Compiled filter for log entries
#[derive(Clone, Default)]
pub struct LogFilter {
    /// Levels to include (`None` = all, empty set = none)
    levels: Option<HashSet<LogLevel>>,

    /// Text search (if any)
    search: Option<Search>,

    /// Original search string
    pattern: String,

    /// Inclusive lower bound
    date_from: Option<DateTime<Utc>>,

    /// Inclusive upper bound
    date_to: Option<DateTime<Utc>>,

    /// Channels to include (empty = all)
    channels: HashSet<String>,

    /// Environments to include (empty = all)
    environments: HashSet<String>,
}

impl LogFilter {
    /// A filter that matches everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive substring search over message, channel, environment,
    /// source file, context and extra
    pub fn with_search(mut self, text: &str) -> Self {
        let needle = text.trim();
        self.pattern = text.to_string();
        self.search = if needle.is_empty() {
            None
        } else {
            Some(Search::Substring(needle.to_lowercase()))
        };
        self
    }

    /// Case-insensitive regex search over the same fields as [`Self::with_search`]
    pub fn with_regex(mut self, pattern: &str) -> Result<Self, LogsError> {
        self.pattern = pattern.to_string();
        self.search = if pattern.trim().is_empty() {
            None
        } else {
            // Prepend (?i) for case insensitive matching
            Some(Search::Regex(Regex::new(&format!("(?i){pattern}"))?))
        };
        Ok(self)
    }

    /// Set log levels to filter by
    pub fn with_levels(mut self, levels: impl IntoIterator<Item = LogLevel>) -> Self {
        self.levels = Some(levels.into_iter().collect());
        self
    }

    pub fn with_date_from(mut self, from: DateTime<Utc>) -> Self {
        self.date_from = Some(from);
        self
    }

    pub fn with_date_to(mut self, to: DateTime<Utc>) -> Self {
        self.date_to = Some(to);
        self
    }

    /// Lower bound from text. A bare date starts at midnight UTC.
    pub fn with_date_from_str(self, text: &str) -> Result<Self, LogsError> {
        let from = parse_bound(text, NaiveTime::MIN)?;
        Ok(self.with_date_from(from))
    }

    /// Upper bound from text. A bare date covers the whole day, up to 23:59:59.999.
    pub fn with_date_to_str(self, text: &str) -> Result<Self, LogsError> {
        let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
        let to = parse_bound(text, end_of_day)?;
        Ok(self.with_date_to(to))
    }

    /// Set channels to filter by. Entries without a channel still pass.
    pub fn with_channels(mut self, channels: impl IntoIterator<Item = String>) -> Self {
        self.channels = channels.into_iter().collect();
        self
    }

    /// Set environments to filter by. Entries without an environment still pass.
    pub fn with_environments(mut self, environments: impl IntoIterator<Item = String>) -> Self {
        self.environments = environments.into_iter().collect();
        self
    }

    /// Check if a log entry matches this filter
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(levels) = &self.levels {
            if !levels.contains(&entry.level) {
                return false;
            }
        }

        if let Some(search) = &self.search {
            let haystack = search_text(entry);
            let hit = match search {
                Search::Substring(needle) => haystack.to_lowercase().contains(needle.as_str()),
                Search::Regex(re) => re.is_match(&haystack),
            };
            if !hit {
                return false;
            }
        }

        if self.date_from.is_some_and(|from| entry.timestamp < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| entry.timestamp > to) {
            return false;
        }

        if !passes_set(&self.channels, entry.channel.as_deref()) {
            return false;
        }
        passes_set(&self.environments, entry.environment.as_deref())
    }

    /// Entries that match, in their original order
    pub fn apply(&self, entries: &[LogEntry]) -> Vec<LogEntry> {
        entries.iter().filter(|e| self.matches(e)).cloned().collect()
    }

    /// Get the original search string
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Check if filter is empty (matches everything)
    pub fn is_empty(&self) -> bool {
        self.levels.is_none()
            && self.search.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.channels.is_empty()
            && self.environments.is_empty()
    }

    /// Filter for ERROR and above
    pub fn errors_only() -> Self {
        Self::new().with_levels(LogLevel::ALL.into_iter().filter(LogLevel::is_error))
    }

    /// Filter for WARNING and above
    pub fn warnings_and_above() -> Self {
        Self::new().with_levels(LogLevel::ALL.into_iter().filter(|l| *l >= LogLevel::Warning))
    }
}

impl std::fmt::Debug for LogFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogFilter")
            .field("pattern", &self.pattern)
            .field("levels", &self.levels)
            .field("date_from", &self.date_from)
            .field("date_to", &self.date_to)
            .field("channels", &self.channels)
            .field("environments", &self.environments)
            .finish()
    }
}

fn passes_set(allowed: &HashSet<String>, value: Option<&str>) -> bool {
    match value {
        Some(v) if !allowed.is_empty() => allowed.contains(v),
        _ => true,
    }
}

fn search_text(entry: &LogEntry) -> String {
    let json = |fields: &Option<logscope_types::Fields>| {
        fields
            .as_ref()
            .map(|f| serde_json::to_string(f).unwrap_or_default())
            .unwrap_or_else(|| "{}".to_string())
    };

    [
        entry.message.as_str(),
        entry.channel.as_deref().unwrap_or_default(),
        entry.environment.as_deref().unwrap_or_default(),
        entry.source_file.as_deref().unwrap_or_default(),
        &json(&entry.context),
        &json(&entry.extra),
    ]
    .join(" ")
}

fn parse_bound(text: &str, day_time: NaiveTime) -> Result<DateTime<Utc>, LogsError> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(day_time)));
    }
    parse_timestamp(text).ok_or_else(|| LogsError::InvalidDate(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(message: &str, level: LogLevel, ts: &str) -> LogEntry {
        LogEntry::new("f-generic-0".into(), "f.log", 1, message.into())
            .with_level(level)
            .with_timestamp(parse_timestamp(ts))
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let filter = LogFilter::new();
        assert!(filter.is_empty());
        assert!(filter.matches(&entry("x", LogLevel::Debug, "2024-01-15 10:00:00")));
    }

    #[test]
    fn test_level_filter() {
        let filter = LogFilter::errors_only();
        assert!(filter.matches(&entry("x", LogLevel::Error, "2024-01-15 10:00:00")));
        assert!(filter.matches(&entry("x", LogLevel::Emergency, "2024-01-15 10:00:00")));
        assert!(!filter.matches(&entry("x", LogLevel::Warning, "2024-01-15 10:00:00")));

        let filter = LogFilter::warnings_and_above();
        assert!(filter.matches(&entry("x", LogLevel::Warning, "2024-01-15 10:00:00")));
        assert!(!filter.matches(&entry("x", LogLevel::Notice, "2024-01-15 10:00:00")));
    }

    #[test]
    fn test_explicit_empty_level_set_matches_nothing() {
        let filter = LogFilter::new().with_levels(Vec::new());
        assert!(!filter.matches(&entry("x", LogLevel::Info, "2024-01-15 10:00:00")));
    }

    #[test]
    fn test_search_covers_context() {
        let mut e = entry("User logged in", LogLevel::Info, "2024-01-15 10:00:00");
        e.context = json!({"user": "Alice"}).as_object().cloned();

        assert!(LogFilter::new().with_search("alice").matches(&e));
        assert!(LogFilter::new().with_search("LOGGED").matches(&e));
        assert!(!LogFilter::new().with_search("bob").matches(&e));
    }

    #[test]
    fn test_regex_search() {
        let e = entry("timeout after 30s", LogLevel::Error, "2024-01-15 10:00:00");
        let filter = LogFilter::new().with_regex(r"TIMEOUT after \d+s").unwrap();
        assert!(filter.matches(&e));
        assert!(LogFilter::new().with_regex("(unclosed").is_err());
    }

    #[test]
    fn test_date_range_inclusive_whole_day() {
        let filter = LogFilter::new()
            .with_date_from_str("2024-01-15")
            .unwrap()
            .with_date_to_str("2024-01-15")
            .unwrap();

        assert!(filter.matches(&entry("x", LogLevel::Info, "2024-01-15 00:00:00")));
        assert!(filter.matches(&entry("x", LogLevel::Info, "2024-01-15 23:59:59")));
        assert!(!filter.matches(&entry("x", LogLevel::Info, "2024-01-16 00:00:00")));
        assert!(!filter.matches(&entry("x", LogLevel::Info, "2024-01-14 23:59:59")));
        assert!(LogFilter::new().with_date_to_str("someday").is_err());
    }

    #[test]
    fn test_channel_and_environment_sets() {
        let filter = LogFilter::new()
            .with_channels(["orders".to_string()])
            .with_environments(["production".to_string()]);

        let mut e = entry("x", LogLevel::Info, "2024-01-15 10:00:00");
        // Entries without the fields are not excluded
        assert!(filter.matches(&e));

        e.channel = Some("orders".into());
        e.environment = Some("production".into());
        assert!(filter.matches(&e));

        e.environment = Some("local".into());
        assert!(!filter.matches(&e));
    }

    #[test]
    fn test_apply_keeps_order() {
        let entries = vec![
            entry("a", LogLevel::Error, "2024-01-15 10:00:00"),
            entry("b", LogLevel::Info, "2024-01-15 10:00:01"),
            entry("c", LogLevel::Critical, "2024-01-15 10:00:02"),
        ];
        let kept = LogFilter::errors_only().apply(&entries);
        let messages: Vec<_> = kept.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["a", "c"]);
    }
}
