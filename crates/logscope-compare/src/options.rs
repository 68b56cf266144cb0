use crate::CompareError;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Blend of the three similarity signals
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimilarityWeights {
    /// Shared-word ratio
    pub word: f64,
    /// Shorter length over longer length
    pub length: f64,
    /// Normalized Levenshtein similarity
    pub edit: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            word: 0.4,
            length: 0.3,
            edit: 0.3,
        }
    }
}

impl SimilarityWeights {
    pub fn validate(&self) -> Result<(), CompareError> {
        for (name, value) in [("word", self.word), ("length", self.length), ("edit", self.edit)] {
            if !(value >= 0.0) {
                return Err(CompareError::NegativeWeight { name, value });
            }
        }

        let sum = self.word + self.length + self.edit;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(CompareError::WeightSum(sum));
        }
        Ok(())
    }
}

/// Tunables for a comparison run
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompareOptions {
    /// Minimum blended score for a `similar` match
    pub similarity_threshold: f64,
    pub weights: SimilarityWeights,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            weights: SimilarityWeights::default(),
        }
    }
}

impl CompareOptions {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_weights(mut self, weights: SimilarityWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn validate(&self) -> Result<(), CompareError> {
        let t = self.similarity_threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(CompareError::InvalidThreshold(t));
        }
        self.weights.validate()
    }
}
