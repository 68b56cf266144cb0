use std::collections::HashSet;

use crate::SimilarityWeights;

/// A normalized message with everything the scorer needs precomputed
#[derive(Debug)]
pub(crate) struct MessageKey {
    pub(crate) normalized: String,
    /// Length of `normalized` in chars
    len: usize,
    lowered: Vec<char>,
    words: Vec<String>,
    word_set: HashSet<String>,
}

impl MessageKey {
    pub(crate) fn new(normalized: String) -> Self {
        let lower = normalized.to_lowercase();
        let words: Vec<String> = lower.split_whitespace().map(String::from).collect();

        Self {
            len: normalized.chars().count(),
            lowered: lower.chars().collect(),
            word_set: words.iter().cloned().collect(),
            words,
            normalized,
        }
    }
}

/// Blended similarity of two messages in `[0, 1]`.
///
/// Identical strings score 1, and a pair with an empty side scores 0.
/// Otherwise the score mixes the shared-word ratio, the length ratio
/// and the normalized Levenshtein similarity of the lower-cased text.
pub fn similarity(a: &str, b: &str, weights: &SimilarityWeights) -> f64 {
    let a = MessageKey::new(a.to_string());
    let b = MessageKey::new(b.to_string());
    score(&a, &b, weights, None).unwrap_or(0.0)
}

/// Score a pair, or `None` when `threshold` is given and cannot be reached.
///
/// The cut-off uses an upper bound built from lengths alone, since the edit
/// distance is at least the length difference. A pruned pair would have
/// scored below the threshold anyway.
pub(crate) fn score(
    a: &MessageKey,
    b: &MessageKey,
    weights: &SimilarityWeights,
    threshold: Option<f64>,
) -> Option<f64> {
    if a.normalized == b.normalized {
        return Some(1.0);
    }
    if a.len == 0 || b.len == 0 {
        return Some(0.0);
    }

    let max_len = a.len.max(b.len) as f64;
    let min_len = a.len.min(b.len) as f64;

    let common = a.words.iter().filter(|w| b.word_set.contains(*w)).count();
    let word_ratio = common as f64 / a.words.len().max(b.words.len()) as f64;
    let length_ratio = min_len / max_len;

    if let Some(threshold) = threshold {
        let min_distance = a.lowered.len().abs_diff(b.lowered.len()) as f64;
        let edit_bound = (1.0 - min_distance / max_len).clamp(0.0, 1.0);
        let bound = blend(weights, word_ratio, length_ratio, edit_bound);
        if bound < threshold {
            return None;
        }
    }

    let distance = levenshtein_chars(&a.lowered, &b.lowered) as f64;
    let edit = (1.0 - distance / max_len).clamp(0.0, 1.0);

    Some(blend(weights, word_ratio, length_ratio, edit))
}

fn blend(weights: &SimilarityWeights, word: f64, length: f64, edit: f64) -> f64 {
    (weights.word * word + weights.length * length + weights.edit * edit).clamp(0.0, 1.0)
}

/// Levenshtein distance between two strings, counted in chars
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    levenshtein_chars(&a, &b)
}

fn levenshtein_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
