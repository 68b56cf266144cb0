use std::path::{Path, PathBuf};

use futures::future::join_all;
use tracing::{debug, warn};

use logscope_types::LogEntry;

use crate::{LogParser, LogsError};

/// Result of reading and parsing one file of a batch
#[derive(Debug)]
pub struct FileParseOutcome {
    pub path: PathBuf,

    /// Name recorded as `source_file` on every entry
    pub file_name: String,

    pub result: Result<Vec<LogEntry>, LogsError>,
}

/// A file that was read and parsed successfully
#[derive(Clone, Debug)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub file_name: String,
    pub entries: Vec<LogEntry>,
}

impl FileParseOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Read and parse every file concurrently.
///
/// Outcomes are returned in the order of `paths`. A file that cannot be read
/// fails on its own; the other files are unaffected.
pub async fn parse_multiple_files<P: AsRef<Path>>(paths: &[P]) -> Vec<FileParseOutcome> {
    let tasks = paths.iter().map(|path| parse_one(path.as_ref().to_path_buf()));
    let outcomes = join_all(tasks).await;

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    debug!(files = outcomes.len(), failed, "batch parse finished");

    outcomes
}

/// All-or-nothing view of a batch: the first failure fails the whole batch
pub fn collect_all(outcomes: Vec<FileParseOutcome>) -> Result<Vec<ParsedFile>, LogsError> {
    outcomes
        .into_iter()
        .map(|outcome| {
            outcome.result.map(|entries| ParsedFile {
                path: outcome.path,
                file_name: outcome.file_name,
                entries,
            })
        })
        .collect()
}

async fn parse_one(path: PathBuf) -> FileParseOutcome {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let result = read_and_parse(&path, file_name.clone()).await;
    if let Err(e) = &result {
        warn!(path = %path.display(), error = %e, "failed to parse file");
    }

    FileParseOutcome {
        path,
        file_name,
        result,
    }
}

async fn read_and_parse(path: &Path, file_name: String) -> Result<Vec<LogEntry>, LogsError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| LogsError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    // Parsing is CPU bound; keep it off the async workers
    let task_name = file_name.clone();
    tokio::task::spawn_blocking(move || {
        let content = String::from_utf8_lossy(&bytes);
        LogParser::parse_file(&content, &file_name)
    })
    .await
    .map_err(|e| LogsError::Task {
        file: task_name,
        reason: e.to_string(),
    })
}
