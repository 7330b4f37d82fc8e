//! Ratio refresh with per-endpoint retry and endpoint fallback.
//!
//! A refresh walks the source's endpoint list in order. Each endpoint gets up
//! to [`RetryPolicy::max_attempts_per_endpoint`] attempts:
//!
//! - a 200 with a valid body installs the new ratios and ends the refresh;
//! - 503, transport failures and unusable bodies back off `base * 2^attempt`
//!   and retry the same endpoint;
//! - any other status abandons the endpoint at once.
//!
//! No backoff follows the last attempt on an endpoint; the next endpoint is
//! requested immediately. The legacy converter still slept `2^attempt` after
//! a final 503 before moving on.
//!
//! The transitions live in [`RefreshState::after_attempt`] and
//! [`RefreshState::after_endpoint`], which are pure; [`RatioRefresher`] only
//! performs the I/O and waits they ask for.

use std::sync::Arc;
use std::time::Duration;

use indexswap_common::time::now;
use indexswap_common::RatioSet;
use tracing::{debug, info, instrument, warn};

use crate::config::RetryPolicy;
use crate::error::{FetchError, RatioError, RatioResult};
use crate::metrics::RatioMetrics;
use crate::source::RatioSource;
use crate::store::SharedRatioStore;
use crate::wire::parse_ratio_body;

/// Position of a refresh in the endpoint/attempt grid.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshState {
    /// About to make zero-based `attempt` against endpoint index `endpoint`.
    Trying { endpoint: usize, attempt: u32 },
    /// Done with endpoint index `endpoint`; move to the next one.
    NextEndpoint { endpoint: usize },
    /// A valid ratio set was fetched.
    Success(RatioSet),
    /// Every endpoint failed.
    Exhausted,
}

/// Result of advancing the state machine after an attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: RefreshState,
    /// Wait this long before entering `next`.
    pub backoff: Option<Duration>,
}

impl Transition {
    fn immediate(next: RefreshState) -> Self {
        Self { next, backoff: None }
    }
}

impl RefreshState {
    /// Starting state for a source with `endpoint_count` endpoints.
    pub fn initial(endpoint_count: usize) -> Self {
        if endpoint_count == 0 {
            RefreshState::Exhausted
        } else {
            RefreshState::Trying { endpoint: 0, attempt: 0 }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RefreshState::Success(_) | RefreshState::Exhausted)
    }

    /// Advance a `Trying` state with the outcome of its attempt.
    ///
    /// Any other state is returned unchanged.
    pub fn after_attempt(self, result: Result<RatioSet, FetchError>, policy: &RetryPolicy) -> Transition {
        let (endpoint, attempt) = match self {
            RefreshState::Trying { endpoint, attempt } => (endpoint, attempt),
            other => return Transition::immediate(other),
        };

        match result {
            Ok(ratios) => Transition::immediate(RefreshState::Success(ratios)),
            Err(e) if !e.is_transient() => Transition::immediate(RefreshState::NextEndpoint { endpoint }),
            Err(_) if attempt + 1 < policy.max_attempts_per_endpoint => Transition {
                next: RefreshState::Trying {
                    endpoint,
                    attempt: attempt + 1,
                },
                backoff: Some(policy.backoff(attempt)),
            },
            Err(_) => Transition::immediate(RefreshState::NextEndpoint { endpoint }),
        }
    }

    /// Advance a `NextEndpoint` state. Any other state is returned unchanged.
    pub fn after_endpoint(self, endpoint_count: usize) -> RefreshState {
        match self {
            RefreshState::NextEndpoint { endpoint } if endpoint + 1 < endpoint_count => {
                RefreshState::Trying {
                    endpoint: endpoint + 1,
                    attempt: 0,
                }
            }
            RefreshState::NextEndpoint { .. } => RefreshState::Exhausted,
            other => other,
        }
    }
}

/// One request made during a refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub endpoint: String,
    /// Zero-based attempt number against this endpoint.
    pub attempt: u32,
    /// `None` when the attempt produced a valid ratio set.
    pub error: Option<FetchError>,
}

/// How a refresh ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// The store now holds these ratios.
    Updated(RatioSet),
    /// Nothing usable was fetched; the store is untouched.
    Exhausted,
}

/// Everything a refresh did.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshReport {
    pub outcome: RefreshOutcome,
    pub attempts: Vec<AttemptRecord>,
    pub backoffs: Vec<Duration>,
}

impl RefreshReport {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, RefreshOutcome::Updated(_))
    }

    /// Distinct endpoints requested, in order.
    pub fn endpoints_tried(&self) -> Vec<&str> {
        let mut tried: Vec<&str> = Vec::new();
        for record in &self.attempts {
            if tried.last() != Some(&record.endpoint.as_str()) {
                tried.push(&record.endpoint);
            }
        }
        tried
    }
}

/// Fetches fresh ratios and installs them into the store.
pub struct RatioRefresher {
    source: Arc<dyn RatioSource>,
    store: SharedRatioStore,
    policy: RetryPolicy,
    metrics: Arc<RatioMetrics>,
}

impl RatioRefresher {
    /// Create a refresher writing into `store`.
    pub fn new(source: Arc<dyn RatioSource>, store: SharedRatioStore, policy: RetryPolicy) -> Self {
        Self {
            source,
            store,
            policy,
            metrics: Arc::new(RatioMetrics::new()),
        }
    }

    /// Record into shared metrics instead of private ones.
    pub fn with_metrics(mut self, metrics: Arc<RatioMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn metrics(&self) -> &Arc<RatioMetrics> {
        &self.metrics
    }

    /// Try to refresh the store. Returns whether new ratios were installed.
    pub async fn refresh(&self) -> bool {
        self.refresh_with_report().await.succeeded()
    }

    /// Refresh, failing with [`RatioError::RefreshExhausted`] when nothing worked.
    pub async fn try_refresh(&self) -> RatioResult<RatioSet> {
        let report = self.refresh_with_report().await;
        match report.outcome {
            RefreshOutcome::Updated(ratios) => Ok(ratios),
            RefreshOutcome::Exhausted => Err(RatioError::RefreshExhausted {
                attempts: report.attempts.len(),
            }),
        }
    }

    /// Refresh and report every attempt and backoff made.
    #[instrument(skip(self), fields(source = self.source.name()))]
    pub async fn refresh_with_report(&self) -> RefreshReport {
        let endpoints = self.source.endpoints();
        let mut attempts = Vec::new();
        let mut backoffs = Vec::new();
        let mut state = RefreshState::initial(endpoints.len());

        self.metrics.refresh_started();

        loop {
            state = match state {
                RefreshState::Trying { endpoint, attempt } => {
                    let path = &endpoints[endpoint];
                    let result = self.attempt(path, attempt).await;

                    attempts.push(AttemptRecord {
                        endpoint: path.clone(),
                        attempt,
                        error: result.as_ref().err().cloned(),
                    });

                    let transition = RefreshState::Trying { endpoint, attempt }
                        .after_attempt(result, &self.policy);

                    if let Some(delay) = transition.backoff {
                        info!(
                            endpoint = %path,
                            attempt = attempt + 1,
                            backoff_ms = delay.as_millis() as u64,
                            "Retrying endpoint after backoff"
                        );
                        self.metrics.backoff();
                        backoffs.push(delay);
                        tokio::time::sleep(delay).await;
                    } else if matches!(transition.next, RefreshState::NextEndpoint { .. }) {
                        warn!(endpoint = %path, "Giving up on endpoint, trying next");
                    }

                    transition.next
                }
                RefreshState::NextEndpoint { endpoint } => {
                    RefreshState::NextEndpoint { endpoint }.after_endpoint(endpoints.len())
                }
                RefreshState::Success(ratios) => {
                    self.store.replace(ratios, now());
                    self.metrics.refresh_succeeded();
                    info!(ratios = %ratios, "Ratios updated successfully");
                    return RefreshReport {
                        outcome: RefreshOutcome::Updated(ratios),
                        attempts,
                        backoffs,
                    };
                }
                RefreshState::Exhausted => {
                    self.metrics.refresh_exhausted();
                    warn!(
                        attempts = attempts.len(),
                        "All endpoints failed, keeping current ratios"
                    );
                    return RefreshReport {
                        outcome: RefreshOutcome::Exhausted,
                        attempts,
                        backoffs,
                    };
                }
            };
        }
    }

    /// One request against one endpoint, classified.
    async fn attempt(&self, endpoint: &str, attempt: u32) -> Result<RatioSet, FetchError> {
        info!(
            endpoint = %endpoint,
            attempt = attempt + 1,
            max_attempts = self.policy.max_attempts_per_endpoint,
            "Requesting ratios"
        );
        self.metrics.fetch_attempted();

        let result = match self.source.fetch(endpoint).await {
            Ok(response) if response.status == 200 => parse_ratio_body(&response.body),
            Ok(response) => Err(FetchError::from_status(response.status)),
            Err(e) => Err(e),
        };

        match &result {
            Ok(ratios) => debug!(endpoint = %endpoint, ratios = %ratios, "Parsed ratios"),
            Err(e) => {
                self.metrics.fetch_failed();
                warn!(
                    endpoint = %endpoint,
                    attempt = attempt + 1,
                    code = e.error_code(),
                    error = %e,
                    "Ratio fetch failed"
                );
            }
        }

        result
    }
}
