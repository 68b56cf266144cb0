use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use logscope_types::{LogEntry, LogLevel};

use crate::similarity::{MessageKey, score};
use crate::{CompareError, CompareOptions, Measure, NoopMeasure, normalize_message};

const MEASURE_NAME: &str = "compare_log_files";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Identical after normalization
    Exact,
    /// Blended similarity at or above the threshold
    Similar,
}

/// A pair of entries considered the same event
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMatch {
    pub file1_entry: LogEntry,
    pub file2_entry: LogEntry,
    pub match_type: MatchType,
    /// 1.0 for exact matches
    pub similarity: f64,
}

/// Per-level contribution of each side and how many of those matched
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelBreakdown {
    pub file1_count: usize,
    pub file2_count: usize,
    pub matches: usize,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonStats {
    pub total_file1: usize,
    pub total_file2: usize,
    pub exact_matches: usize,
    pub similar_matches: usize,
    pub unique_to_file1: usize,
    pub unique_to_file2: usize,
    /// Matches over the larger side, as a percentage (0 when both are empty)
    pub match_percentage: f64,
    /// Only levels present on at least one side
    pub level_breakdown: BTreeMap<LogLevel, LevelBreakdown>,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub matches: Vec<LogMatch>,
    pub stats: ComparisonStats,
    pub unique_to_file1: Vec<LogEntry>,
    pub unique_to_file2: Vec<LogEntry>,
}

/// Greedy first-match comparator for two entry lists.
///
/// Only entries of the same level are candidates for each other. For each
/// entry of the first list, in order, the second list's unmatched entries of
/// that level are scanned in their original order and the first exact or
/// similar candidate is taken. No attempt is made to find a globally better
/// assignment.
pub struct LogComparator {
    options: CompareOptions,
    measure: Arc<dyn Measure>,
}

impl LogComparator {
    pub fn new(options: CompareOptions) -> Result<Self, CompareError> {
        options.validate()?;
        Ok(Self {
            options,
            measure: Arc::new(NoopMeasure),
        })
    }

    /// Report the duration of every comparison to `measure`
    pub fn with_measure(mut self, measure: Arc<dyn Measure>) -> Self {
        self.measure = measure;
        self
    }

    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    pub fn compare(&self, file1: &[LogEntry], file2: &[LogEntry]) -> ComparisonResult {
        self.measure.start_measure(MEASURE_NAME);
        let result = self.run(file1, file2);
        let elapsed = self.measure.end_measure(MEASURE_NAME);

        debug!(
            file1 = file1.len(),
            file2 = file2.len(),
            exact = result.stats.exact_matches,
            similar = result.stats.similar_matches,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "compared log files"
        );

        result
    }

    fn run(&self, file1: &[LogEntry], file2: &[LogEntry]) -> ComparisonResult {
        let threshold = self.options.similarity_threshold;
        let weights = &self.options.weights;

        let mut level_breakdown: BTreeMap<LogLevel, LevelBreakdown> = BTreeMap::new();
        for entry in file1 {
            level_breakdown.entry(entry.level).or_default().file1_count += 1;
        }
        for entry in file2 {
            level_breakdown.entry(entry.level).or_default().file2_count += 1;
        }

        // Each message is normalized once, not once per pair
        let keys1 = message_keys(file1);
        let keys2 = message_keys(file2);

        let mut candidates_by_level: HashMap<LogLevel, Vec<usize>> = HashMap::new();
        for (j, entry) in file2.iter().enumerate() {
            candidates_by_level.entry(entry.level).or_default().push(j);
        }

        let mut matched1 = vec![false; file1.len()];
        let mut matched2 = vec![false; file2.len()];
        let mut matches = Vec::new();

        for (i, entry1) in file1.iter().enumerate() {
            let Some(candidates) = candidates_by_level.get(&entry1.level) else {
                continue;
            };

            for &j in candidates {
                if matched2[j] {
                    continue;
                }

                let found = if keys1[i].normalized == keys2[j].normalized {
                    Some((MatchType::Exact, 1.0))
                } else {
                    score(&keys1[i], &keys2[j], weights, Some(threshold))
                        .filter(|s| *s >= threshold)
                        .map(|s| (MatchType::Similar, s))
                };

                if let Some((match_type, similarity)) = found {
                    matches.push(LogMatch {
                        file1_entry: entry1.clone(),
                        file2_entry: file2[j].clone(),
                        match_type,
                        similarity,
                    });
                    matched1[i] = true;
                    matched2[j] = true;
                    if let Some(breakdown) = level_breakdown.get_mut(&entry1.level) {
                        breakdown.matches += 1;
                    }
                    break;
                }
            }
        }

        let unique_to_file1 = unmatched(file1, &matched1);
        let unique_to_file2 = unmatched(file2, &matched2);

        let exact_matches = matches
            .iter()
            .filter(|m| m.match_type == MatchType::Exact)
            .count();
        let similar_matches = matches.len() - exact_matches;
        let larger = file1.len().max(file2.len());
        let match_percentage = if larger > 0 {
            matches.len() as f64 / larger as f64 * 100.0
        } else {
            0.0
        };

        ComparisonResult {
            stats: ComparisonStats {
                total_file1: file1.len(),
                total_file2: file2.len(),
                exact_matches,
                similar_matches,
                unique_to_file1: unique_to_file1.len(),
                unique_to_file2: unique_to_file2.len(),
                match_percentage,
                level_breakdown,
            },
            matches,
            unique_to_file1,
            unique_to_file2,
        }
    }
}

/// Compare with default weights and no measurement
pub fn compare_log_files(
    file1: &[LogEntry],
    file2: &[LogEntry],
    similarity_threshold: f64,
) -> Result<ComparisonResult, CompareError> {
    let options = CompareOptions::default().with_threshold(similarity_threshold);
    Ok(LogComparator::new(options)?.compare(file1, file2))
}

fn message_keys(entries: &[LogEntry]) -> Vec<MessageKey> {
    entries
        .iter()
        .map(|e| MessageKey::new(normalize_message(&e.message)))
        .collect()
}

fn unmatched(entries: &[LogEntry], matched: &[bool]) -> Vec<LogEntry> {
    entries
        .iter()
        .zip(matched)
        .filter(|(_, matched)| !**matched)
        .map(|(entry, _)| entry.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    use logscope_logs::LogParser;
    use parking_lot::Mutex;

    use crate::{DEFAULT_SIMILARITY_THRESHOLD, SimilarityWeights};

    fn entries(file: &str, items: &[(LogLevel, &str)]) -> Vec<LogEntry> {
        items
            .iter()
            .enumerate()
            .map(|(i, (level, message))| {
                LogEntry::new(format!("{file}-test-{i}"), file, i as u64 + 1, message.to_string())
                    .with_level(*level)
            })
            .collect()
    }

    fn compare(a: &[LogEntry], b: &[LogEntry]) -> ComparisonResult {
        compare_log_files(a, b, DEFAULT_SIMILARITY_THRESHOLD).unwrap()
    }

    fn assert_counts_consistent(result: &ComparisonResult) {
        let stats = &result.stats;
        assert_eq!(result.matches.len(), stats.exact_matches + stats.similar_matches);
        assert_eq!(stats.unique_to_file1 + result.matches.len(), stats.total_file1);
        assert_eq!(stats.unique_to_file2 + result.matches.len(), stats.total_file2);
        assert_eq!(result.unique_to_file1.len(), stats.unique_to_file1);
        assert_eq!(result.unique_to_file2.len(), stats.unique_to_file2);
    }

    #[test]
    fn test_environment_is_not_part_of_the_key() {
        let local = LogParser::parse_file(
            "[2024-01-15 10:30:15] local.ERROR: Database connection failed",
            "local.log",
        );
        let production = LogParser::parse_file(
            "[2024-01-15 10:30:15] production.ERROR: Database connection failed",
            "production.log",
        );

        let result = compare(&local, &production);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].match_type, MatchType::Exact);
        assert_eq!(result.matches[0].similarity, 1.0);
        assert_eq!(result.stats.match_percentage, 100.0);
    }

    #[test]
    fn test_empty_against_five() {
        let b = entries("b", &[(LogLevel::Info, "x"); 5]);
        let result = compare(&[], &b);

        assert!(result.matches.is_empty());
        assert_eq!(result.unique_to_file2.len(), 5);
        assert_eq!(result.stats.match_percentage, 0.0);
        assert_counts_consistent(&result);
    }

    #[test]
    fn test_both_empty() {
        let result = compare(&[], &[]);
        assert!(result.matches.is_empty());
        assert_eq!(result.stats.match_percentage, 0.0);
        assert!(result.stats.level_breakdown.is_empty());
    }

    #[test]
    fn test_exact_after_normalization() {
        let a = entries("a", &[(LogLevel::Info, "User 42 logged in at 2024-01-15 10:30:15")]);
        let b = entries("b", &[(LogLevel::Info, "User  7 logged in at 2023-12-01 08:00:00 ")]);

        let result = compare(&a, &b);
        assert_eq!(result.matches[0].match_type, MatchType::Exact);
        assert_eq!(result.matches[0].similarity, 1.0);
    }

    #[test]
    fn test_similar_match() {
        let a = entries("a", &[(LogLevel::Error, "Payment failed for order")]);
        let b = entries("b", &[(LogLevel::Error, "Payment failed for orders")]);

        let result = compare(&a, &b);
        assert_eq!(result.stats.similar_matches, 1);
        let m = &result.matches[0];
        assert_eq!(m.match_type, MatchType::Similar);
        assert!(m.similarity >= 0.85 && m.similarity < 1.0);

        let strict = compare_log_files(&a, &b, 0.9).unwrap();
        assert!(strict.matches.is_empty());
        assert_counts_consistent(&strict);
    }

    #[test]
    fn test_levels_never_cross() {
        let a = entries("a", &[(LogLevel::Error, "Cache miss")]);
        let b = entries("b", &[(LogLevel::Warning, "Cache miss")]);

        let result = compare(&a, &b);
        assert!(result.matches.is_empty());

        let breakdown = &result.stats.level_breakdown;
        assert_eq!(breakdown.len(), 2);
        assert_eq!(
            breakdown[&LogLevel::Error],
            LevelBreakdown {
                file1_count: 1,
                file2_count: 0,
                matches: 0
            }
        );
        assert_eq!(breakdown[&LogLevel::Warning].file2_count, 1);
    }

    #[test]
    fn test_first_candidate_wins_over_later_exact() {
        let a = entries("a", &[(LogLevel::Error, "Payment failed for order")]);
        let b = entries(
            "b",
            &[
                (LogLevel::Error, "Payment failed for orders"),
                (LogLevel::Error, "Payment failed for order"),
            ],
        );

        let result = compare(&a, &b);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].match_type, MatchType::Similar);
        assert_eq!(result.matches[0].file2_entry.id, "b-test-0");
        assert_eq!(result.unique_to_file2[0].id, "b-test-1");
    }

    #[test]
    fn test_matching_is_injective() {
        let a = entries("a", &[(LogLevel::Info, "Job done"); 3]);
        let b = entries("b", &[(LogLevel::Info, "Job done"); 2]);

        let result = compare(&a, &b);
        assert_eq!(result.matches.len(), 2);
        assert_eq!(result.stats.match_percentage, 2.0 / 3.0 * 100.0);
        assert_counts_consistent(&result);

        let left: HashSet<_> = result.matches.iter().map(|m| &m.file1_entry.id).collect();
        let right: HashSet<_> = result.matches.iter().map(|m| &m.file2_entry.id).collect();
        assert_eq!(left.len(), 2);
        assert_eq!(right.len(), 2);
        assert_eq!(result.stats.level_breakdown[&LogLevel::Info].matches, 2);
    }

    #[test]
    fn test_deterministic() {
        let a = entries(
            "a",
            &[
                (LogLevel::Info, "Request 1 served"),
                (LogLevel::Error, "Timeout talking to db"),
                (LogLevel::Info, "Request served quickly"),
            ],
        );
        let b = entries(
            "b",
            &[
                (LogLevel::Info, "Request served quickly!"),
                (LogLevel::Error, "Timeout talking to dbs"),
                (LogLevel::Info, "Request 9 served"),
            ],
        );

        let first = compare(&a, &b);
        let second = compare(&a, &b);
        let summary = |r: &ComparisonResult| {
            r.matches
                .iter()
                .map(|m| (m.file1_entry.id.clone(), m.file2_entry.id.clone(), m.match_type))
                .collect::<Vec<_>>()
        };
        assert_eq!(summary(&first), summary(&second));
        assert_counts_consistent(&first);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        assert_eq!(
            compare_log_files(&[], &[], 0.0).unwrap_err(),
            CompareError::InvalidThreshold(0.0)
        );
        let weights = SimilarityWeights {
            word: 0.9,
            length: 0.9,
            edit: 0.9,
        };
        assert!(LogComparator::new(CompareOptions::default().with_weights(weights)).is_err());
    }

    #[test]
    fn test_serializes_camel_case() {
        let a = entries("a", &[(LogLevel::Error, "boom")]);
        let b = entries("b", &[(LogLevel::Error, "boom")]);
        let json = serde_json::to_value(compare(&a, &b)).unwrap();

        assert_eq!(json["matches"][0]["matchType"], "exact");
        assert_eq!(json["matches"][0]["file1Entry"]["id"], "a-test-0");
        assert_eq!(json["stats"]["totalFile1"], 1);
        assert_eq!(json["stats"]["levelBreakdown"]["ERROR"]["file2Count"], 1);
        assert!(json["uniqueToFile1"].as_array().unwrap().is_empty());
    }

    #[derive(Default)]
    struct RecordingMeasure {
        calls: Mutex<Vec<String>>,
    }

    impl Measure for RecordingMeasure {
        fn start_measure(&self, name: &str) {
            self.calls.lock().push(format!("start:{name}"));
        }

        fn end_measure(&self, name: &str) -> Duration {
            self.calls.lock().push(format!("end:{name}"));
            Duration::ZERO
        }
    }

    #[test]
    fn test_measure_is_called_around_comparison() {
        let measure = Arc::new(RecordingMeasure::default());
        let comparator = LogComparator::new(CompareOptions::default())
            .unwrap()
            .with_measure(measure.clone());

        comparator.compare(&[], &[]);
        assert_eq!(
            *measure.calls.lock(),
            ["start:compare_log_files", "end:compare_log_files"]
        );
    }
}
