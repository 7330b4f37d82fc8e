//! Single-slot store holding the current ratio set.

use std::sync::Arc;
use std::time::Duration;

use indexswap_common::time::{now, DurationExt, Timestamp};
use indexswap_common::RatioSet;
use parking_lot::RwLock;
use tracing::debug;

use crate::snapshot::RatioSnapshot;

/// When the stored ratios were last refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastUpdated {
    /// No refresh has ever succeeded; the ratios are the built-in defaults.
    Never,
    /// Installed by a successful refresh at this time.
    At(Timestamp),
}

impl LastUpdated {
    pub fn timestamp(&self) -> Option<Timestamp> {
        match self {
            LastUpdated::Never => None,
            LastUpdated::At(at) => Some(*at),
        }
    }
}

/// Age of the stored ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Age {
    /// Never refreshed.
    Never,
    /// Time since the last refresh. Clock skew into the future reads as zero.
    Elapsed(Duration),
}

impl Age {
    /// Whether ratios of this age must be refreshed. `Never` always must.
    pub fn exceeds(&self, threshold: Duration) -> bool {
        match self {
            Age::Never => true,
            Age::Elapsed(elapsed) => *elapsed > threshold,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    ratios: RatioSet,
    last_updated: LastUpdated,
}

/// Thread-safe holder of the one current [`RatioSet`].
///
/// Readers always observe a ratio set together with the timestamp that was
/// installed alongside it; [`RatioStore::replace`] swaps both under one write
/// lock.
#[derive(Debug)]
pub struct RatioStore {
    slot: RwLock<Slot>,
}

impl RatioStore {
    /// Create a store holding the built-in default ratios.
    pub fn new() -> Self {
        Self::with_ratios(RatioSet::DEFAULT)
    }

    /// Create a store seeded with `ratios`, still marked as never updated.
    pub fn with_ratios(ratios: RatioSet) -> Self {
        Self {
            slot: RwLock::new(Slot {
                ratios,
                last_updated: LastUpdated::Never,
            }),
        }
    }

    /// Latest known ratios.
    pub fn current(&self) -> RatioSet {
        self.slot.read().ratios
    }

    /// When the ratios were last replaced.
    pub fn last_updated(&self) -> LastUpdated {
        self.slot.read().last_updated
    }

    /// Ratios and their timestamp, read together.
    pub fn state(&self) -> (RatioSet, LastUpdated) {
        let slot = self.slot.read();
        (slot.ratios, slot.last_updated)
    }

    /// Age of the ratios right now.
    pub fn age(&self) -> Age {
        self.age_at(now())
    }

    /// Age of the ratios as seen at `at`.
    pub fn age_at(&self, at: Timestamp) -> Age {
        match self.last_updated() {
            LastUpdated::Never => Age::Never,
            LastUpdated::At(updated) => Age::Elapsed(at.signed_duration_since(updated).as_std()),
        }
    }

    /// Whether the ratios are older than `threshold` or were never refreshed.
    pub fn is_stale(&self, threshold: Duration) -> bool {
        self.age().exceeds(threshold)
    }

    /// Atomically install a new ratio set and its refresh time.
    pub fn replace(&self, ratios: RatioSet, at: Timestamp) {
        let mut slot = self.slot.write();
        slot.ratios = ratios;
        slot.last_updated = LastUpdated::At(at);
        debug!(ratios = %ratios, at = %at, "Ratio store replaced");
    }

    /// The document served to API consumers.
    pub fn snapshot(&self) -> RatioSnapshot {
        RatioSnapshot::new(self.current(), now())
    }
}

impl Default for RatioStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared ratio store.
pub type SharedRatioStore = Arc<RatioStore>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn fetched() -> RatioSet {
        RatioSet::new(40.5, 40.7, 10.1).unwrap()
    }

    #[test]
    fn test_starts_with_defaults_never_updated() {
        let store = RatioStore::new();
        assert_eq!(store.current(), RatioSet::DEFAULT);
        assert_eq!(store.last_updated(), LastUpdated::Never);
        assert_eq!(store.age(), Age::Never);
        assert!(store.is_stale(Duration::from_secs(60)));
    }

    #[test]
    fn test_current_is_idempotent() {
        let store = RatioStore::new();
        assert_eq!(store.current(), store.current());

        store.replace(fetched(), now());
        assert_eq!(store.current(), store.current());
    }

    #[test]
    fn test_replace_installs_set_and_timestamp() {
        let store = RatioStore::new();
        let at = now();

        store.replace(fetched(), at);

        assert_eq!(store.current(), fetched());
        assert_eq!(store.last_updated(), LastUpdated::At(at));
        assert_eq!(store.state(), (fetched(), LastUpdated::At(at)));
    }

    #[test]
    fn test_age_distinguishes_never_from_old() {
        let store = RatioStore::new();
        let at = now();
        assert_eq!(store.age_at(at), Age::Never);

        store.replace(fetched(), at - ChronoDuration::hours(24));
        let age = store.age_at(at);
        assert_eq!(age, Age::Elapsed(Duration::from_secs(24 * 3600)));
        assert!(age.exceeds(Duration::from_secs(60)));
        assert_ne!(age, Age::Never);
    }

    #[test]
    fn test_staleness_threshold_is_exclusive() {
        let store = RatioStore::new();
        let at = now();
        store.replace(fetched(), at - ChronoDuration::seconds(60));

        assert!(!store.age_at(at).exceeds(Duration::from_secs(60)));
        assert!(store.age_at(at + ChronoDuration::seconds(1)).exceeds(Duration::from_secs(60)));
    }

    #[test]
    fn test_future_timestamp_reads_as_zero_age() {
        let store = RatioStore::new();
        let at = now();
        store.replace(fetched(), at + ChronoDuration::seconds(30));
        assert_eq!(store.age_at(at), Age::Elapsed(Duration::ZERO));
    }

    #[test]
    fn test_concurrent_readers_never_see_torn_sets() {
        let store = Arc::new(RatioStore::new());
        let a = fetched();
        let b = RatioSet::new(1.0, 2.0, 3.0).unwrap();

        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..1000 {
                    store.replace(if i % 2 == 0 { a } else { b }, now());
                }
            })
        };

        for _ in 0..1000 {
            let seen = store.current();
            assert!(seen == a || seen == b || seen == RatioSet::DEFAULT);
        }
        writer.join().unwrap();
    }
}
