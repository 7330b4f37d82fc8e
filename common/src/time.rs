//! Time utilities and timing constants.

use chrono::{DateTime, Duration, Utc};

/// Ratio refresh timing constants.
pub mod constants {
    use super::Duration;

    /// Ratios older than this are refreshed before a conversion (60 seconds).
    pub fn staleness_threshold() -> Duration {
        Duration::seconds(60)
    }

    /// Timeout for a single request to the ratio service (10 seconds).
    pub fn request_timeout() -> Duration {
        Duration::seconds(10)
    }

    /// First backoff delay; each retry doubles it (1 second).
    pub fn backoff_base() -> Duration {
        Duration::seconds(1)
    }

    /// Attempts made against one endpoint before moving on.
    pub const MAX_ATTEMPTS_PER_ENDPOINT: u32 = 3;
}

/// A UTC timestamp.
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Duration extensions for convenient conversion.
pub trait DurationExt {
    fn as_std(&self) -> std::time::Duration;
}

impl DurationExt for Duration {
    fn as_std(&self) -> std::time::Duration {
        self.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}

/// Exponential backoff delay for a zero-based attempt: `base * 2^attempt`.
pub fn backoff_delay(base: std::time::Duration, attempt: u32) -> std::time::Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}
