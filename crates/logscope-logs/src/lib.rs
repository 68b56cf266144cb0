//! Log processing for logscope
//!
//! This crate provides format-aware parsing, filtering, statistics, export,
//! and concurrent multi-file loading.

mod batch;
mod error;
mod export;
mod filter;
mod parser;
mod stats;

pub use batch::{FileParseOutcome, ParsedFile, collect_all, parse_multiple_files};
pub use error::LogsError;
pub use export::{ExportFormat, export, export_to_csv, export_to_json};
pub use filter::LogFilter;
pub use parser::{
    GenericStrategy, JsonLinesStrategy, LaravelStrategy, LogParser, ParseStrategy,
    PatternStrategy,
};
pub use stats::{HourBucket, LogStats, TimeRange};

// Re-export types used in our public API
pub use logscope_types::{LogEntry, LogLevel};
