use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;

use logscope_types::{LogEntry, LogLevel, iso_millis};

const TOP_CHANNELS: usize = 10;
const SECONDS_PER_HOUR: i64 = 3600;

/// Number of entries whose timestamp falls in one UTC hour
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourBucket {
    #[serde(with = "iso_millis")]
    pub hour: DateTime<Utc>,
    pub count: usize,
}

/// Earliest and latest timestamp of a file
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    #[serde(with = "iso_millis")]
    pub start: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub end: DateTime<Utc>,
}

/// Summary of a parsed file
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStats {
    pub total_entries: usize,

    /// Only levels that occur, by severity
    pub level_counts: BTreeMap<LogLevel, usize>,

    pub time_range: Option<TimeRange>,

    pub entries_per_hour: Vec<HourBucket>,

    /// Busiest channels first, ties broken by name
    pub top_channels: Vec<(String, usize)>,

    /// Percentage of entries at ERROR or above
    pub error_rate: f64,
}

impl LogStats {
    pub fn from_entries(entries: &[LogEntry]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }

        let mut level_counts = BTreeMap::new();
        let mut hours: BTreeMap<i64, usize> = BTreeMap::new();
        let mut channels: HashMap<&str, usize> = HashMap::new();
        let mut errors = 0usize;

        for entry in entries {
            *level_counts.entry(entry.level).or_insert(0) += 1;

            let hour = entry.timestamp.timestamp().div_euclid(SECONDS_PER_HOUR);
            *hours.entry(hour).or_insert(0) += 1;

            if let Some(channel) = entry.channel.as_deref() {
                *channels.entry(channel).or_insert(0) += 1;
            }

            if entry.level.is_error() {
                errors += 1;
            }
        }

        let earliest = entries.iter().map(|e| e.timestamp).min();
        let latest = entries.iter().map(|e| e.timestamp).max();

        let entries_per_hour = hours
            .into_iter()
            .filter_map(|(hour, count)| {
                DateTime::from_timestamp(hour * SECONDS_PER_HOUR, 0)
                    .map(|hour| HourBucket { hour, count })
            })
            .collect();

        let mut top_channels: Vec<(String, usize)> = channels
            .into_iter()
            .map(|(name, count)| (name.to_string(), count))
            .collect();
        top_channels.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_channels.truncate(TOP_CHANNELS);

        Self {
            total_entries: entries.len(),
            level_counts,
            time_range: earliest
                .zip(latest)
                .map(|(start, end)| TimeRange { start, end }),
            entries_per_hour,
            top_channels,
            error_rate: errors as f64 / entries.len() as f64 * 100.0,
        }
    }

    /// Count for a single level (0 when absent)
    pub fn count(&self, level: LogLevel) -> usize {
        self.level_counts.get(&level).copied().unwrap_or(0)
    }
}
