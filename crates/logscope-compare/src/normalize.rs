use std::sync::LazyLock;

use regex::Regex;

static UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b")
        .expect("Failed to compile UUID regex")
});

static DATE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}[T\s]\d{2}:\d{2}:\d{2}")
        .expect("Failed to compile date-time regex")
});

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\b").expect("Failed to compile integer regex"));

/// Replace incidental variation (UUIDs, date-times, integers) with placeholders
/// and collapse whitespace, so that messages differing only in those parts
/// compare equal.
///
/// UUIDs go first; the integer rule would otherwise eat their digit groups.
pub fn normalize_message(message: &str) -> String {
    let text = UUID.replace_all(message, "[UUID]");
    let text = DATE_TIME.replace_all(&text, "[TIMESTAMP]");
    let text = INTEGER.replace_all(&text, "[NUMBER]");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
