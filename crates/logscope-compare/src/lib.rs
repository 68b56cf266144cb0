//! Log file comparison for logscope
//!
//! Aligns two parsed entry lists: exact duplicates after message
//! normalization, fuzzy duplicates above a similarity threshold, and the
//! unmatched remainder on each side.

mod comparator;
mod error;
mod measure;
mod normalize;
mod options;
mod similarity;

pub use comparator::{
    ComparisonResult, ComparisonStats, LevelBreakdown, LogComparator, LogMatch, MatchType,
    compare_log_files,
};
pub use error::CompareError;
pub use measure::{Measure, NoopMeasure, TracingMeasure};
pub use normalize::normalize_message;
pub use options::{CompareOptions, DEFAULT_SIMILARITY_THRESHOLD, SimilarityWeights};
pub use similarity::{levenshtein, similarity};

// Re-export types used in our public API
pub use logscope_types::{LogEntry, LogLevel};
