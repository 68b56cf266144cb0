use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CompareError {
    #[error("Similarity threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("Similarity weights must be non-negative, got {name} = {value}")]
    NegativeWeight { name: &'static str, value: f64 },

    #[error("Similarity weights must sum to 1, got {0}")]
    WeightSum(f64),
}
