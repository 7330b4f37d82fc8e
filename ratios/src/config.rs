//! Ratio engine configuration.

use std::time::Duration;

use indexswap_common::time::{backoff_delay, constants, DurationExt};

/// Default remote ratio service.
pub const DEFAULT_BASE_URL: &str = "https://utility-trees-399601.wl.r.appspot.com";

/// Origin the ratio service expects on requests.
pub const DEFAULT_ORIGIN: &str = "http://spyconverter.com";

/// Referer the ratio service expects on requests.
pub const DEFAULT_REFERER: &str = "http://spyconverter.com/";

/// Endpoint paths tried in order.
pub const DEFAULT_ENDPOINTS: [&str; 4] = ["/", "/api/ratios", "/ratios", "/data"];

/// Remote source configuration.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Base URL of the ratio service.
    pub base_url: String,
    /// Ordered endpoint paths appended to the base URL.
    pub endpoints: Vec<String>,
    /// Timeout for one request.
    pub request_timeout: Duration,
    /// Origin header value.
    pub origin: String,
    /// Referer header value.
    pub referer: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            endpoints: DEFAULT_ENDPOINTS.iter().map(|e| e.to_string()).collect(),
            request_timeout: constants::request_timeout().as_std(),
            origin: DEFAULT_ORIGIN.to_string(),
            referer: DEFAULT_REFERER.to_string(),
        }
    }
}

/// Per-endpoint retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts against one endpoint before moving to the next.
    pub max_attempts_per_endpoint: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub backoff_base: Duration,
}

impl RetryPolicy {
    /// Delay after the failed zero-based `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        backoff_delay(self.backoff_base, attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts_per_endpoint: constants::MAX_ATTEMPTS_PER_ENDPOINT,
            backoff_base: constants::backoff_base().as_std(),
        }
    }
}

/// Main ratio engine configuration.
#[derive(Debug, Clone)]
pub struct RatioEngineConfig {
    /// Remote source configuration.
    pub source: SourceConfig,
    /// Retry policy for refreshes.
    pub retry: RetryPolicy,
    /// Ratios older than this are refreshed before converting.
    pub staleness_threshold: Duration,
}

impl Default for RatioEngineConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            retry: RetryPolicy::default(),
            staleness_threshold: constants::staleness_threshold().as_std(),
        }
    }
}

impl RatioEngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("INDEXSWAP_BASE_URL") {
            config.source.base_url = url;
        }

        if let Ok(endpoints) = std::env::var("INDEXSWAP_ENDPOINTS") {
            config.source.endpoints = parse_endpoints(&endpoints);
        }

        if let Ok(secs) = std::env::var("INDEXSWAP_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = secs.trim().parse() {
                config.source.request_timeout = Duration::from_secs(secs);
            }
        }

        if let Ok(attempts) = std::env::var("INDEXSWAP_MAX_ATTEMPTS") {
            if let Ok(attempts) = attempts.trim().parse() {
                config.retry.max_attempts_per_endpoint = attempts;
            }
        }

        if let Ok(ms) = std::env::var("INDEXSWAP_BACKOFF_BASE_MS") {
            if let Ok(ms) = ms.trim().parse() {
                config.retry.backoff_base = Duration::from_millis(ms);
            }
        }

        if let Ok(secs) = std::env::var("INDEXSWAP_STALENESS_SECS") {
            if let Ok(secs) = secs.trim().parse() {
                config.staleness_threshold = Duration::from_secs(secs);
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        let url = &self.source.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(format!("Base URL must be http(s), got {url:?}"));
        }

        if self.source.endpoints.is_empty() {
            return Err("At least one endpoint is required".to_string());
        }

        if let Some(bad) = self.source.endpoints.iter().find(|e| !e.starts_with('/')) {
            return Err(format!("Endpoint {bad:?} must start with '/'"));
        }

        if self.source.request_timeout.is_zero() {
            return Err("Request timeout cannot be 0".to_string());
        }

        if self.retry.max_attempts_per_endpoint == 0 {
            return Err("Max attempts per endpoint cannot be 0".to_string());
        }

        Ok(())
    }
}

/// Split a comma-separated endpoint list, dropping blanks.
pub fn parse_endpoints(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RatioEngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.source.endpoints, vec!["/", "/api/ratios", "/ratios", "/data"]);
        assert_eq!(config.source.request_timeout, Duration::from_secs(10));
        assert_eq!(config.retry.max_attempts_per_endpoint, 3);
        assert_eq!(config.staleness_threshold, Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_config() {
        let mut config = RatioEngineConfig::default();
        config.retry.max_attempts_per_endpoint = 0;
        assert!(config.validate().is_err());

        let mut config = RatioEngineConfig::default();
        config.source.endpoints = vec!["ratios".to_string()];
        assert!(config.validate().is_err());

        let mut config = RatioEngineConfig::default();
        config.source.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
    }

    #[test]
    fn test_parse_endpoints() {
        assert_eq!(parse_endpoints(" /a, ,/b ,"), vec!["/a", "/b"]);
    }
}
