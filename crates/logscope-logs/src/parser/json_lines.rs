use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::trace;

use logscope_types::{LogEntry, LogLevel, parse_timestamp, timestamp_from_epoch};

use super::{ParseStrategy, entry_id};

const TIMESTAMP_FIELDS: [&str; 4] = ["timestamp", "datetime", "time", "@timestamp"];
const LEVEL_FIELDS: [&str; 3] = ["level_name", "level", "severity"];
const MESSAGE_FIELDS: [&str; 2] = ["message", "msg"];
const CHANNEL_FIELDS: [&str; 2] = ["channel", "logger"];
const ENVIRONMENT_FIELDS: [&str; 2] = ["environment", "env"];

/// One JSON object per line (Monolog JSON formatter, pino, bunyan, logstash...)
pub struct JsonLinesStrategy;

impl ParseStrategy for JsonLinesStrategy {
    fn name(&self) -> &'static str {
        "json"
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
    let trimmed = line.trim();
    if !trimmed.starts_with('{') {
        return None;
    }

    let fields = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => return None,
        Err(e) => {
            trace!(file = file_name, line = index + 1, error = %e, "skipping invalid JSON line");
            return None;
        }
    };

    let message = first_present(&fields, &MESSAGE_FIELDS)
        .map(value_text)
        .unwrap_or_else(|| trimmed.to_string());

    let mut entry = LogEntry::new(
        entry_id(file_name, "json", index),
        file_name,
        index as u64 + 1,
        message,
    )
    .with_level(extract_level(&fields))
    .with_timestamp(extract_timestamp(&fields));

    entry.context = object_field(&fields, "context");
    entry.extra = object_field(&fields, "extra");
    entry.channel = first_present(&fields, &CHANNEL_FIELDS).map(value_text);
    entry.environment = first_present(&fields, &ENVIRONMENT_FIELDS).map(value_text);

    Some(entry)
}

/// First alias holding a meaningful value. `null`, `false`, `""` and `0` count
/// as absent so that the next alias gets a chance.
fn first_present<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .find(|value| is_present(value))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => true,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn extract_level(fields: &Map<String, Value>) -> LogLevel {
    match first_present(fields, &LEVEL_FIELDS) {
        Some(Value::String(s)) => LogLevel::from_str(s),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(LogLevel::from_numeric)
            .unwrap_or_default(),
        _ => LogLevel::Info,
    }
}

fn extract_timestamp(fields: &Map<String, Value>) -> Option<DateTime<Utc>> {
    match first_present(fields, &TIMESTAMP_FIELDS)? {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => n.as_f64().and_then(timestamp_from_epoch),
        // Monolog serializes DateTime objects as {"date": "...", "timezone": "..."}
        Value::Object(obj) => obj.get("date").and_then(Value::as_str).and_then(parse_timestamp),
        _ => None,
    }
}

fn object_field(fields: &Map<String, Value>, key: &str) -> Option<Map<String, Value>> {
    match fields.get(key) {
        Some(Value::Object(obj)) => Some(obj.clone()),
        _ => None,
    }
}
