//! Ratio engine error types.

use indexswap_common::ValidationError;
use thiserror::Error;

/// Why a single fetch attempt against one endpoint failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// The service answered 503 and may recover shortly.
    #[error("Service unavailable (HTTP {status})")]
    ServiceUnavailable { status: u16 },

    /// The endpoint answered with a status other than 200 or 503.
    #[error("Endpoint unsupported (HTTP {status})")]
    EndpointUnsupported { status: u16 },

    /// Connection, DNS or transport failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The request exceeded its timeout.
    #[error("Request timed out")]
    Timeout,

    /// The 200 body was not a JSON object carrying ratio fields.
    #[error("Malformed response body: {0}")]
    MalformedBody(String),

    /// The body parsed but a ratio was missing or out of range.
    #[error("Invalid ratios in response: {0}")]
    InvalidRatios(#[from] ValidationError),
}

impl FetchError {
    /// Classify a non-200 HTTP status.
    pub fn from_status(status: u16) -> Self {
        if status == 503 {
            FetchError::ServiceUnavailable { status }
        } else {
            FetchError::EndpointUnsupported { status }
        }
    }

    /// Transient failures are retried on the same endpoint after a backoff.
    pub fn is_transient(&self) -> bool {
        !matches!(self, FetchError::EndpointUnsupported { .. })
    }

    /// Get error code for logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            FetchError::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
            FetchError::EndpointUnsupported { .. } => "ENDPOINT_UNSUPPORTED",
            FetchError::Network(_) => "NETWORK_ERROR",
            FetchError::Timeout => "TIMEOUT",
            FetchError::MalformedBody(_) => "MALFORMED_BODY",
            FetchError::InvalidRatios(_) => "INVALID_RATIOS",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_decode() {
            FetchError::MalformedBody(e.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Errors that can occur in the ratio engine.
#[derive(Debug, Error)]
pub enum RatioError {
    /// Conversion input was not a non-negative number.
    #[error("Invalid input {input:?}: {reason}")]
    InvalidInput { input: String, reason: String },

    /// Every endpoint and attempt failed.
    #[error("Ratio refresh exhausted after {attempts} attempts")]
    RefreshExhausted { attempts: usize },

    /// The HTTP client could not be built.
    #[error("Ratio source error: {0}")]
    Source(String),

    /// Configuration failed validation.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RatioError {
    pub(crate) fn invalid_input(input: impl Into<String>, reason: impl Into<String>) -> Self {
        RatioError::InvalidInput {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for ratio engine operations.
pub type RatioResult<T> = Result<T, RatioError>;
