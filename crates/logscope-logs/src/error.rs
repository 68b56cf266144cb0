use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the log processing crate.
///
/// Parsing itself never fails; these cover the I/O and configuration edges.
#[derive(Debug, Error)]
pub enum LogsError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Invalid date bound: {0}")]
    InvalidDate(String),

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Parse task for {file} did not complete: {reason}")]
    Task { file: String, reason: String },
}
