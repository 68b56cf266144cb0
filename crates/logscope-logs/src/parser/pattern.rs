use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use logscope_types::{Fields, LogEntry, LogLevel, parse_timestamp};

use super::{ParseStrategy, collapse_whitespace, entry_id};

// 127.0.0.1 - frank [10/Oct/2000:13:55:36 -0700] "GET /a.gif HTTP/1.0" 200 2326
static ACCESS_LOG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\S+)\s+\S+\s+\S+\s+\[([^\]]+)\]\s+"([^"]*?)"\s+(\d+)\s+(\d+|-)"#)
        .expect("Failed to compile access log regex")
});

// Jan 15 10:30:15 web01 sshd[1234]: Accepted publickey
static SYSLOG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2})\s+(\S+)\s+(\S+?)(?:\[(\d+)\])?\s*:\s+(.*)$")
        .expect("Failed to compile syslog regex")
});

// [2024-01-15 10:30:15] [ERROR] [db] Connection lost
static BRACKETED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[([^\]]+)\]\s*\[([^\]]+)\]\s*\[([^\]]+)\]\s+(.*)$")
        .expect("Failed to compile bracketed regex")
});

// 2024-01-15 10:30:15 ERROR Connection lost
static PLAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2})\s+([A-Z]+)\s+(.*)$")
        .expect("Failed to compile plain timestamp regex")
});

/// Line layouts recognised by the pattern strategy, in priority order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Template {
    AccessLog,
    Syslog,
    Bracketed,
    Plain,
}

impl Template {
    const ALL: [Template; 4] = [
        Template::AccessLog,
        Template::Syslog,
        Template::Bracketed,
        Template::Plain,
    ];

    fn regex(&self) -> &'static Regex {
        match self {
            Self::AccessLog => &ACCESS_LOG,
            Self::Syslog => &SYSLOG,
            Self::Bracketed => &BRACKETED,
            Self::Plain => &PLAIN,
        }
    }

    /// Fill `entry` from the captures of this template's regex
    fn apply(&self, caps: &Captures<'_>, entry: &mut LogEntry) {
        match self {
            Self::AccessLog => {
                let status: u16 = caps[4].parse().unwrap_or(0);
                entry.timestamp = parse_timestamp(&caps[2]).unwrap_or(entry.timestamp);
                entry.level = level_for_status(status);
                if !caps[3].is_empty() {
                    entry.message = caps[3].to_string();
                }

                let mut extra = Fields::new();
                extra.insert("remoteAddr".into(), Value::from(&caps[1]));
                extra.insert("status".into(), Value::from(status));
                if let Ok(bytes) = caps[5].parse::<u64>() {
                    extra.insert("bytes".into(), Value::from(bytes));
                }
                entry.extra = Some(extra);
            }
            Self::Syslog => {
                entry.timestamp =
                    parse_timestamp(&collapse_whitespace(&caps[1])).unwrap_or(entry.timestamp);
                entry.message = caps[5].to_string();
                entry.channel = Some(caps[3].to_string());

                let mut extra = Fields::new();
                extra.insert("host".into(), Value::from(&caps[2]));
                if let Some(pid) = caps.get(4).and_then(|m| m.as_str().parse::<u64>().ok()) {
                    extra.insert("pid".into(), Value::from(pid));
                }
                entry.extra = Some(extra);
            }
            Self::Bracketed => {
                entry.timestamp = parse_timestamp(&caps[1]).unwrap_or(entry.timestamp);
                entry.level = LogLevel::from_str(&caps[2]);
                entry.channel = Some(caps[3].trim().to_string());
                entry.message = caps[4].to_string();
            }
            Self::Plain => {
                entry.timestamp =
                    parse_timestamp(&collapse_whitespace(&caps[1])).unwrap_or(entry.timestamp);
                entry.level = LogLevel::from_str(&caps[2]);
                entry.message = caps[3].to_string();
            }
        }
    }
}

/// Severity implied by an HTTP status code
fn level_for_status(status: u16) -> LogLevel {
    match status {
        500..=u16::MAX => LogLevel::Error,
        400..=499 => LogLevel::Warning,
        _ => LogLevel::Info,
    }
}

/// Well-known single-line formats: web server access logs, syslog,
/// `[ts] [level] [component]` and `YYYY-MM-DD HH:MM:SS LEVEL message`.
pub struct PatternStrategy;

impl ParseStrategy for PatternStrategy {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn try_parse(&self, lines: &[&str], file_name: &str) -> Vec<LogEntry> {
        let mut entries = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let matched = Template::ALL
                .iter()
                .find_map(|template| template.regex().captures(line).map(|caps| (template, caps)));

            if let Some((template, caps)) = matched {
                let mut entry = LogEntry::new(
                    entry_id(file_name, self.name(), index),
                    file_name,
                    index as u64 + 1,
                    line.trim().to_string(),
                );
                template.apply(&caps, &mut entry);
                if entry.message.trim().is_empty() {
                    entry.message = line.trim().to_string();
                }
                entries.push(entry);
            }
        }

        entries
    }
}
