//! Validation errors for IndexSwap domain types.

use thiserror::Error;

use crate::RatioKind;

/// Errors raised when constructing or parsing domain values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A ratio was zero or negative.
    #[error("Ratio {kind} must be positive, got {value}")]
    NonPositiveRatio { kind: RatioKind, value: f64 },

    /// A ratio was NaN or infinite.
    #[error("Ratio {kind} must be finite, got {value}")]
    NonFiniteRatio { kind: RatioKind, value: f64 },

    /// A ratio was absent from a payload.
    #[error("Missing ratio {0}")]
    MissingRatio(RatioKind),

    /// Unknown instrument symbol.
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    /// Unknown conversion pair.
    #[error("Unknown conversion pair: {0}")]
    UnknownPair(String),
}

impl ValidationError {
    /// Get error code for logs and API payloads.
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::NonPositiveRatio { .. } => "NON_POSITIVE_RATIO",
            ValidationError::NonFiniteRatio { .. } => "NON_FINITE_RATIO",
            ValidationError::MissingRatio(_) => "MISSING_RATIO",
            ValidationError::UnknownInstrument(_) => "UNKNOWN_INSTRUMENT",
            ValidationError::UnknownPair(_) => "UNKNOWN_PAIR",
        }
    }
}
