//! Format-aware log parsing.
//!
//! A file is handed to an ordered chain of strategies. The first strategy that
//! produces at least one entry wins for the whole file; the generic strategy at
//! the end of the chain accepts any non-blank line, so parsing never fails.

mod generic;
mod json_lines;
mod laravel;
mod pattern;

pub use generic::GenericStrategy;
pub use json_lines::JsonLinesStrategy;
pub use laravel::LaravelStrategy;
pub use pattern::PatternStrategy;

use tracing::{debug, trace};

use logscope_types::LogEntry;

/// One log format the parser knows how to read.
///
/// Implementations must return an empty list, never panic, when the content
/// does not follow their grammar.
pub trait ParseStrategy: Send + Sync {
    /// Short tag, also used to disambiguate entry ids
    fn name(&self) -> &'static str;

    /// Extract entries from `lines`. Line numbers are 1-based indices into `lines`.
    fn try_parse(&self, lines: &[&str], file_name: &str) -> Vec<LogEntry>;
}

/// Log parser for extracting structure from raw log text
pub struct LogParser;

impl LogParser {
    /// The strategy chain, in the order it is tried
    pub fn strategies() -> [&'static dyn ParseStrategy; 4] {
        [
            &LaravelStrategy,
            &JsonLinesStrategy,
            &PatternStrategy,
            &GenericStrategy,
        ]
    }

    /// Parse the full text of a file into entries.
    ///
    /// Returns an empty list only when every line is blank.
    pub fn parse_file(content: &str, file_name: &str) -> Vec<LogEntry> {
        let lines: Vec<&str> = content.lines().collect();

        for strategy in Self::strategies() {
            let entries = strategy.try_parse(&lines, file_name);
            if !entries.is_empty() {
                debug!(
                    file = file_name,
                    strategy = strategy.name(),
                    entries = entries.len(),
                    "parsed log file"
                );
                return entries;
            }
            trace!(file = file_name, strategy = strategy.name(), "strategy matched nothing");
        }

        Vec::new()
    }
}

/// `{file}-{strategy}-{index}`; unique because each line yields at most one entry
pub(crate) fn entry_id(file_name: &str, strategy: &str, index: usize) -> String {
    format!("{file_name}-{strategy}-{index}")
}

/// Collapse runs of whitespace so `2024-01-15  10:30:15` parses like the single-space form
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use logscope_types::LogLevel;
    use std::collections::HashSet;

    #[test]
    fn test_laravel_wins_for_laravel_file() {
        let content = "[2024-01-15 10:30:15] local.ERROR: Database connection failed\n\
                       [2024-01-15 10:30:16] local.INFO: Retrying";
        let entries = LogParser::parse_file(content, "laravel.log");
        assert_eq!(entries.len(), 2);
        assert!(entries[0].id.contains("laravel"));
        assert_eq!(entries[0].environment.as_deref(), Some("local"));
    }

    #[test]
    fn test_json_lines_wins_when_no_laravel_line() {
        let content = r#"{"level":"error","message":"boom"}
{"level":"info","message":"ok"}"#;
        let entries = LogParser::parse_file(content, "app.json");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, LogLevel::Error);
        assert!(entries[0].id.contains("json"));
    }

    #[test]
    fn test_first_winning_strategy_takes_whole_file() {
        // One Laravel line makes the Laravel strategy win; other lines are dropped
        let content = "[2024-01-15 10:30:15] local.ERROR: Database connection failed\n\
                       just some text";
        let entries = LogParser::parse_file(content, "mixed.log");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].line_number, Some(1));
    }

    #[test]
    fn test_generic_fallback_covers_every_non_blank_line() {
        let content = "hello world\n\n   \nsecond line\r\nthird";
        let entries = LogParser::parse_file(content, "plain.txt");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].message, "second line");
        assert_eq!(entries[1].line_number, Some(4));
    }

    #[test]
    fn test_blank_content_yields_nothing() {
        assert!(LogParser::parse_file("", "empty.log").is_empty());
        assert!(LogParser::parse_file("\n  \n\t\n", "blank.log").is_empty());
    }

    #[test]
    fn test_ids_unique_and_deterministic() {
        let content = "a\nb\nc\na";
        let first = LogParser::parse_file(content, "dup.log");
        let second = LogParser::parse_file(content, "dup.log");

        let ids: HashSet<_> = first.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids.len(), first.len());

        let first_ids: Vec<_> = first.iter().map(|e| &e.id).collect();
        let second_ids: Vec<_> = second.iter().map(|e| &e.id).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[test]
    fn test_levels_always_in_vocabulary() {
        let content = "[2024-01-15 10:30:15] local.BOGUS: weird level\n";
        let entries = LogParser::parse_file(content, "odd.log");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Info);
    }

    #[test]
    fn test_parse_multibyte_utf8_no_panic() {
        let line = "─────────────────────────────────────────";
        let entries = LogParser::parse_file(line, "box.log");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, line);
    }
}
