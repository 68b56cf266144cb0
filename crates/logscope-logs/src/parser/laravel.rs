use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::trace;

use logscope_types::{LogEntry, LogLevel, parse_timestamp};

use super::{ParseStrategy, collapse_whitespace, entry_id};

// [2024-01-15 10:30:15] local.ERROR: message {"json":"context"}
static LARAVEL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2})\]\s+([\w\-.]+)\.([A-Z]+):\s+(.*)$")
        .expect("Failed to compile Laravel line regex")
});

static TRAILING_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?)(\{.*\})$").expect("Failed to compile trailing JSON regex")
});

/// `[timestamp] env.LEVEL: message` lines, as written by Laravel/Monolog
pub struct LaravelStrategy;

impl ParseStrategy for LaravelStrategy {
    fn name(&self) -> &'static str {
        "laravel"
    }

    fn try_parse(&self, lines: &[&str], file_name: &str) -> Vec<LogEntry> {
        lines
            .iter()
            .enumerate()
            .filter_map(|(index, line)| parse_line(line, file_name, index))
            .collect()
    }
}

fn parse_line(line: &str, file_name: &str, index: usize) -> Option<LogEntry> {
    let caps = LARAVEL_LINE.captures(line)?;

    let timestamp = parse_timestamp(&collapse_whitespace(&caps[1]));
    if timestamp.is_none() {
        trace!(file = file_name, line = index + 1, "unparseable timestamp, using now");
    }

    let mut entry = LogEntry::new(
        entry_id(file_name, "laravel", index),
        file_name,
        index as u64 + 1,
        caps[4].to_string(),
    )
    .with_level(LogLevel::from_str(&caps[3]))
    .with_timestamp(timestamp);
    entry.environment = Some(caps[2].to_string());

    split_context(&mut entry);
    if entry.message.trim().is_empty() {
        entry.message = line.trim().to_string();
    }

    Some(entry)
}

/// Move a trailing JSON object out of the message and into `context`.
///
/// Malformed JSON leaves the message untouched. A message that is nothing but
/// the JSON object keeps its text so it never ends up empty.
fn split_context(entry: &mut LogEntry) {
    let Some(caps) = TRAILING_JSON.captures(&entry.message) else {
        return;
    };

    match serde_json::from_str::<Value>(&caps[2]) {
        Ok(Value::Object(context)) => {
            let prefix = caps[1].trim().to_string();
            entry.context = Some(context);
            if !prefix.is_empty() {
                entry.message = prefix;
            }
        }
        Ok(_) => {}
        Err(e) => {
            trace!(id = %entry.id, error = %e, "message suffix is not valid JSON");
        }
    }
}
