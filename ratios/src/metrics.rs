//! Counters for refresh and conversion activity.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Ratio engine metrics.
#[derive(Debug, Default)]
pub struct RatioMetrics {
    /// Refreshes started.
    pub refreshes_started: AtomicU64,
    /// Refreshes that installed new ratios.
    pub refreshes_succeeded: AtomicU64,
    /// Refreshes where every endpoint failed.
    pub refreshes_exhausted: AtomicU64,
    /// Requests sent to the ratio service.
    pub fetch_attempts: AtomicU64,
    /// Requests that did not yield valid ratios.
    pub fetch_failures: AtomicU64,
    /// Backoff waits taken.
    pub backoffs: AtomicU64,
    /// Conversions returned to callers.
    pub conversions_completed: AtomicU64,
    /// Conversions rejected for invalid input.
    pub conversions_rejected: AtomicU64,
}

impl RatioMetrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh_started(&self) {
        self.refreshes_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn refresh_succeeded(&self) {
        self.refreshes_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn refresh_exhausted(&self) {
        self.refreshes_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fetch_attempted(&self) {
        self.fetch_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fetch_failed(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn backoff(&self) {
        self.backoffs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn conversion_completed(&self) {
        self.conversions_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn conversion_rejected(&self) {
        self.conversions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time copy of the counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            refreshes_started: self.refreshes_started.load(Ordering::Relaxed),
            refreshes_succeeded: self.refreshes_succeeded.load(Ordering::Relaxed),
            refreshes_exhausted: self.refreshes_exhausted.load(Ordering::Relaxed),
            fetch_attempts: self.fetch_attempts.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            backoffs: self.backoffs.load(Ordering::Relaxed),
            conversions_completed: self.conversions_completed.load(Ordering::Relaxed),
            conversions_rejected: self.conversions_rejected.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub refreshes_started: u64,
    pub refreshes_succeeded: u64,
    pub refreshes_exhausted: u64,
    pub fetch_attempts: u64,
    pub fetch_failures: u64,
    pub backoffs: u64,
    pub conversions_completed: u64,
    pub conversions_rejected: u64,
}

impl MetricsSnapshot {
    /// Share of fetch attempts that failed, 0.0 when none were made.
    pub fn fetch_failure_rate(&self) -> f64 {
        if self.fetch_attempts == 0 {
            return 0.0;
        }
        self.fetch_failures as f64 / self.fetch_attempts as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = RatioMetrics::new();
        metrics.refresh_started();
        metrics.fetch_attempted();
        metrics.fetch_attempted();
        metrics.fetch_failed();
        metrics.conversion_rejected();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.refreshes_started, 1);
        assert_eq!(snapshot.fetch_attempts, 2);
        assert_eq!(snapshot.conversions_rejected, 1);
        assert_eq!(snapshot.fetch_failure_rate(), 0.5);
        assert_eq!(MetricsSnapshot::default().fetch_failure_rate(), 0.0);
    }
}
