//! Conversion engine.

use std::sync::Arc;
use std::time::Duration;

use indexswap_common::{ConversionPair, RatioSet};
use tracing::{debug, info, instrument, warn};

use crate::config::RatioEngineConfig;
use crate::conversion::{Amount, Conversion};
use crate::error::{RatioError, RatioResult};
use crate::metrics::{MetricsSnapshot, RatioMetrics};
use crate::refresher::RatioRefresher;
use crate::snapshot::RatioSnapshot;
use crate::source::{HttpRatioSource, RatioSource};
use crate::store::{RatioStore, SharedRatioStore};

/// Converts between instruments using the current ratios.
///
/// Before each conversion the engine refreshes the store if it was never
/// updated or is older than the staleness threshold. A failed refresh is not
/// reported; the conversion proceeds with whatever ratios the store holds.
pub struct ConversionEngine {
    store: SharedRatioStore,
    refresher: RatioRefresher,
    staleness_threshold: Duration,
    metrics: Arc<RatioMetrics>,
}

impl ConversionEngine {
    /// Create an engine over `source` with a fresh default store.
    pub fn new(source: Arc<dyn RatioSource>, config: &RatioEngineConfig) -> Self {
        Self::with_store(source, Arc::new(RatioStore::new()), config)
    }

    /// Create an engine over an existing store.
    pub fn with_store(
        source: Arc<dyn RatioSource>,
        store: SharedRatioStore,
        config: &RatioEngineConfig,
    ) -> Self {
        let metrics = Arc::new(RatioMetrics::new());
        let refresher = RatioRefresher::new(source, store.clone(), config.retry)
            .with_metrics(metrics.clone());

        Self {
            store,
            refresher,
            staleness_threshold: config.staleness_threshold,
            metrics,
        }
    }

    /// Create an engine talking to the configured HTTP ratio service.
    pub fn from_config(config: &RatioEngineConfig) -> RatioResult<Self> {
        config.validate().map_err(RatioError::Config)?;
        let source = HttpRatioSource::new(&config.source)?;
        Ok(Self::new(Arc::new(source), config))
    }

    pub fn store(&self) -> &SharedRatioStore {
        &self.store
    }

    pub fn refresher(&self) -> &RatioRefresher {
        &self.refresher
    }

    pub fn staleness_threshold(&self) -> Duration {
        self.staleness_threshold
    }

    /// Current ratios, without refreshing.
    pub fn ratios(&self) -> RatioSet {
        self.store.current()
    }

    /// The document served to API consumers.
    pub fn snapshot(&self) -> RatioSnapshot {
        self.store.snapshot()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Refresh the store if its ratios are stale. Returns whether a refresh ran.
    pub async fn refresh_if_stale(&self) -> bool {
        let age = self.store.age();
        if !age.exceeds(self.staleness_threshold) {
            return false;
        }

        debug!(age = ?age, "Ratios stale, refreshing");
        if !self.refresher.refresh().await {
            warn!("Refresh failed, converting with current ratios");
        }
        true
    }

    /// Convert `amount` and return the result rounded to two decimal places.
    pub async fn convert(&self, pair: ConversionPair, amount: impl Into<Amount>) -> RatioResult<f64> {
        Ok(self.convert_detailed(pair, amount).await?.output)
    }

    /// Convert `amount` and return the full conversion record.
    #[instrument(skip(self, amount), fields(pair = %pair))]
    pub async fn convert_detailed(
        &self,
        pair: ConversionPair,
        amount: impl Into<Amount>,
    ) -> RatioResult<Conversion> {
        let amount = amount.into();
        info!(input = %amount, "Converting {} to {}", pair.from(), pair.to());

        let value = match amount.parse() {
            Ok(value) => value,
            Err(e) => {
                self.metrics.conversion_rejected();
                warn!(error = %e, "Invalid input");
                return Err(e);
            }
        };

        self.refresh_if_stale().await;

        let (ratios, last_updated) = self.store.state();
        let ratio = ratios.get(pair.ratio_kind());
        let conversion = Conversion::compute(pair, value, ratio, last_updated.timestamp());

        self.metrics.conversion_completed();
        info!(result = %conversion.output, ratio, "Conversion result");
        Ok(conversion)
    }

    /// QQQ shares to NDX points.
    pub async fn convert_qqq_to_ndx(&self, qqq: impl Into<Amount>) -> RatioResult<f64> {
        self.convert(ConversionPair::QqqToNdx, qqq).await
    }

    /// QQQ shares to NQ points.
    pub async fn convert_qqq_to_nq(&self, qqq: impl Into<Amount>) -> RatioResult<f64> {
        self.convert(ConversionPair::QqqToNq, qqq).await
    }

    /// NQ points to QQQ shares.
    pub async fn convert_nq_to_qqq(&self, nq: impl Into<Amount>) -> RatioResult<f64> {
        self.convert(ConversionPair::NqToQqq, nq).await
    }

    /// NDX points to QQQ shares.
    pub async fn convert_ndx_to_qqq(&self, ndx: impl Into<Amount>) -> RatioResult<f64> {
        self.convert(ConversionPair::NdxToQqq, ndx).await
    }

    /// ES points to SPY shares.
    pub async fn convert_es_to_spy(&self, es: impl Into<Amount>) -> RatioResult<f64> {
        self.convert(ConversionPair::EsToSpy, es).await
    }

    /// SPY shares to ES points.
    pub async fn convert_spy_to_es(&self, spy: impl Into<Amount>) -> RatioResult<f64> {
        self.convert(ConversionPair::SpyToEs, spy).await
    }
}
