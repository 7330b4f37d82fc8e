//! The ratio document served to API consumers.

use indexswap_common::time::Timestamp;
use indexswap_common::RatioSet;
use serde::{Deserialize, Serialize};

/// Status marker carried by every snapshot.
pub const STATUS_OK: &str = "ok";

/// Serialized view of the current ratios.
///
/// `timestamp` is the time the snapshot was taken, not the time of the last
/// successful refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioSnapshot {
    pub status: String,
    pub timestamp: Timestamp,
    pub ratios: RatioSet,
}

impl RatioSnapshot {
    pub fn new(ratios: RatioSet, timestamp: Timestamp) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            timestamp,
            ratios,
        }
    }
}
