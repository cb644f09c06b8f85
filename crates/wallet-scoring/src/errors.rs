use thiserror::Error;

/// Errors raised while turning a raw payload into a scored result.
///
/// Both variants are per-message failures: the streaming service routes them
/// to the failure channel and moves on.
#[derive(Error, Debug)]
pub enum ScoringError {
    // -- Schema -------------------------------------------------------------
    #[error("invalid wallet message: {0}")]
    Schema(#[from] serde_json::Error),

    // -- Computation --------------------------------------------------------
    #[error("score {value} cannot be represented as a decimal")]
    NonFiniteScore { value: f64 },
}

impl ScoringError {
    /// Short failure kind used as the prefix of failure descriptions.
    pub fn kind(&self) -> &'static str {
        match self {
            ScoringError::Schema(_) => "SchemaError",
            ScoringError::NonFiniteScore { .. } => "ComputationError",
        }
    }
}
