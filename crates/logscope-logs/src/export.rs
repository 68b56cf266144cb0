use std::str::FromStr;

use chrono::SecondsFormat;

use logscope_types::LogEntry;

use crate::LogsError;

const CSV_HEADER: &str = "Timestamp,Level,Message,Channel,Environment,Source File,Line Number";

/// Serialization targets for exported entries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    /// MIME type handed to whatever saves the export
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown export format '{other}' (expected json or csv)")),
        }
    }
}

/// Serialize entries in the requested format
pub fn export(entries: &[LogEntry], format: ExportFormat) -> Result<String, LogsError> {
    match format {
        ExportFormat::Json => export_to_json(entries),
        ExportFormat::Csv => Ok(export_to_csv(entries)),
    }
}

/// Pretty-printed JSON array (2-space indent) with every entry field
pub fn export_to_json(entries: &[LogEntry]) -> Result<String, LogsError> {
    Ok(serde_json::to_string_pretty(entries)?)
}

/// CSV with a fixed header row. The message column is always quoted; other
/// columns only when they contain a delimiter, quote or newline.
///
/// An empty slice produces an empty string, header included.
pub fn export_to_csv(entries: &[LogEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut rows = Vec::with_capacity(entries.len() + 1);
    rows.push(CSV_HEADER.to_string());

    for entry in entries {
        let row = [
            entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            entry.level.as_str().to_string(),
            quote(&entry.message),
            escape_field(entry.channel.as_deref().unwrap_or_default()),
            escape_field(entry.environment.as_deref().unwrap_or_default()),
            escape_field(entry.source_file.as_deref().unwrap_or_default()),
            entry.line_number.map(|n| n.to_string()).unwrap_or_default(),
        ];
        rows.push(row.join(","));
    }

    rows.join("\n")
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        quote(field)
    } else {
        field.to_string()
    }
}
