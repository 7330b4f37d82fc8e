//! IndexSwap Ratio Engine
//!
//! Conversion ratios between index-tracking funds, indices and index futures,
//! refreshed from a remote service with fallback to built-in defaults.
//!
//! # Features
//!
//! - Single-slot ratio store with atomic replacement
//! - Multi-endpoint refresh with per-endpoint retry and exponential backoff
//! - Staleness-triggered refresh before every conversion
//! - Silent fallback to the last known (or default) ratios
//!
//! # Example
//!
//! ```rust,ignore
//! use indexswap_ratios::{ConversionEngine, RatioEngineConfig};
//!
//! let engine = ConversionEngine::from_config(&RatioEngineConfig::default())?;
//!
//! let ndx = engine.convert_qqq_to_ndx(100).await?;
//! let es = engine.convert_spy_to_es("100").await?;
//! ```

pub mod config;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod refresher;
pub mod snapshot;
pub mod source;
pub mod store;
pub mod wire;

pub use config::{RatioEngineConfig, RetryPolicy, SourceConfig};
pub use conversion::{Amount, Conversion};
pub use engine::ConversionEngine;
pub use error::{FetchError, RatioError, RatioResult};
pub use metrics::{MetricsSnapshot, RatioMetrics};
pub use refresher::{RatioRefresher, RefreshOutcome, RefreshReport, RefreshState};
pub use snapshot::RatioSnapshot;
pub use source::{HttpRatioSource, RatioSource, SourceResponse};
pub use store::{Age, LastUpdated, RatioStore, SharedRatioStore};
