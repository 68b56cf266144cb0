use std::sync::LazyLock;

use regex::Regex;

use logscope_types::{LogEntry, LogLevel, parse_timestamp};

use super::{ParseStrategy, entry_id};

// 2024-01-15T10:30:15.123Z, 2024/01/15 10:30:15+02:00, ...
static LEADING_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}[-/]\d{2}[-/]\d{2}[\sT]\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?)")
        .expect("Failed to compile leading timestamp regex")
});

static LEVEL_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(DEBUG|INFO|NOTICE|WARNING|WARN|ERROR|CRITICAL|ALERT|EMERGENCY|FATAL)\b")
        .expect("Failed to compile level keyword regex")
});

/// Last resort: one entry per non-blank line
pub struct GenericStrategy;

impl ParseStrategy for GenericStrategy {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn try_parse(&self, lines: &[&str], file_name: &str) -> Vec<LogEntry> {
        lines
            .iter()
            .enumerate()
            .filter_map(|(index, line)| {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    return None;
                }

                let entry = LogEntry::new(
                    entry_id(file_name, self.name(), index),
                    file_name,
                    index as u64 + 1,
                    trimmed.to_string(),
                )
                .with_level(detect_level(trimmed))
                .with_timestamp(
                    LEADING_TIMESTAMP
                        .captures(trimmed)
                        .and_then(|caps| parse_timestamp(&caps[1])),
                );

                Some(entry)
            })
            .collect()
    }
}

/// First severity keyword appearing as a whole word anywhere in the line
fn detect_level(line: &str) -> LogLevel {
    LEVEL_KEYWORD
        .captures(line)
        .map(|caps| LogLevel::from_str(&caps[1]))
        .unwrap_or_default()
}
