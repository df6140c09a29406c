use thiserror::Error;

pub type Result<T> = std::result::Result<T, HotnessError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HotnessError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Expected {expected} generation filters, got {actual}")]
    FilterCountMismatch { expected: usize, actual: usize },

    #[error(
        "Invariant violation: generation {index} decayed to zero weight, expected generation {expected}"
    )]
    DecayWeightMismatch { index: usize, expected: usize },

    #[error(
        "Invariant violation: {count} generations decayed to zero weight, expected exactly one"
    )]
    DecayZeroCount { count: usize },

    #[error(
        "Invariant violation: generation {index} at the decay cursor has weight {weight}, expected 1"
    )]
    DecayCursorWeight { index: usize, weight: usize },

    #[error(
        "Invariant violation: weights {weights:?} do not count up from 1 starting at decay cursor {decay_cursor}"
    )]
    WeightOrder {
        weights: Vec<usize>,
        decay_cursor: usize,
    },
}

impl HotnessError {
    /// True for the ring bookkeeping failures that leave the classifier unusable.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            HotnessError::DecayWeightMismatch { .. }
                | HotnessError::DecayZeroCount { .. }
                | HotnessError::DecayCursorWeight { .. }
                | HotnessError::WeightOrder { .. }
        )
    }
}
