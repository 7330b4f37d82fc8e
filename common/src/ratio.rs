//! Conversion ratios between related instruments.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ValidationError;

/// One of the three published ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatioKind {
    /// NDX points per QQQ share.
    NdxPerQqq,
    /// NQ points per QQQ share.
    NqPerQqq,
    /// ES points per SPY share.
    EsPerSpy,
}

impl RatioKind {
    pub const ALL: [RatioKind; 3] = [RatioKind::NdxPerQqq, RatioKind::NqPerQqq, RatioKind::EsPerSpy];

    /// Field label used by the remote ratio service.
    pub fn label(&self) -> &'static str {
        match self {
            RatioKind::NdxPerQqq => "NDX/QQQ Ratio",
            RatioKind::NqPerQqq => "NQ/QQQ Ratio",
            RatioKind::EsPerSpy => "ES/SPY Ratio",
        }
    }
}

impl fmt::Display for RatioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatioKind::NdxPerQqq => f.write_str("NDX/QQQ"),
            RatioKind::NqPerQqq => f.write_str("NQ/QQQ"),
            RatioKind::EsPerSpy => f.write_str("ES/SPY"),
        }
    }
}

/// Ratio fields as they appear on the wire, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioFields {
    #[serde(rename = "NDX/QQQ Ratio")]
    pub ndx_per_qqq: Option<f64>,
    #[serde(rename = "NQ/QQQ Ratio")]
    pub nq_per_qqq: Option<f64>,
    #[serde(rename = "ES/SPY Ratio")]
    pub es_per_spy: Option<f64>,
}

/// A complete, validated set of conversion ratios.
///
/// Every value is finite and strictly positive. Deserialization goes through
/// [`RatioFields`] so a payload with a missing or non-positive ratio is
/// rejected as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RatioFields")]
pub struct RatioSet {
    #[serde(rename = "NDX/QQQ Ratio")]
    ndx_per_qqq: f64,
    #[serde(rename = "NQ/QQQ Ratio")]
    nq_per_qqq: f64,
    #[serde(rename = "ES/SPY Ratio")]
    es_per_spy: f64,
}

impl RatioSet {
    /// Built-in ratios used until the first successful refresh.
    pub const DEFAULT: RatioSet = RatioSet {
        ndx_per_qqq: 41.10241216829076,
        nq_per_qqq: 41.29471200210854,
        es_per_spy: 10.072138887159946,
    };

    /// Create a validated ratio set.
    pub fn new(ndx_per_qqq: f64, nq_per_qqq: f64, es_per_spy: f64) -> Result<Self, ValidationError> {
        Ok(Self {
            ndx_per_qqq: validate(RatioKind::NdxPerQqq, ndx_per_qqq)?,
            nq_per_qqq: validate(RatioKind::NqPerQqq, nq_per_qqq)?,
            es_per_spy: validate(RatioKind::EsPerSpy, es_per_spy)?,
        })
    }

    pub fn ndx_per_qqq(&self) -> f64 {
        self.ndx_per_qqq
    }

    pub fn nq_per_qqq(&self) -> f64 {
        self.nq_per_qqq
    }

    pub fn es_per_spy(&self) -> f64 {
        self.es_per_spy
    }

    /// Get a ratio by kind.
    pub fn get(&self, kind: RatioKind) -> f64 {
        match kind {
            RatioKind::NdxPerQqq => self.ndx_per_qqq,
            RatioKind::NqPerQqq => self.nq_per_qqq,
            RatioKind::EsPerSpy => self.es_per_spy,
        }
    }
}

impl Default for RatioSet {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<RatioFields> for RatioSet {
    type Error = ValidationError;

    fn try_from(fields: RatioFields) -> Result<Self, Self::Error> {
        let ndx = fields.ndx_per_qqq.ok_or(ValidationError::MissingRatio(RatioKind::NdxPerQqq))?;
        let nq = fields.nq_per_qqq.ok_or(ValidationError::MissingRatio(RatioKind::NqPerQqq))?;
        let es = fields.es_per_spy.ok_or(ValidationError::MissingRatio(RatioKind::EsPerSpy))?;
        RatioSet::new(ndx, nq, es)
    }
}

impl From<RatioSet> for RatioFields {
    fn from(set: RatioSet) -> Self {
        Self {
            ndx_per_qqq: Some(set.ndx_per_qqq),
            nq_per_qqq: Some(set.nq_per_qqq),
            es_per_spy: Some(set.es_per_spy),
        }
    }
}

impl fmt::Display for RatioSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NDX/QQQ={} NQ/QQQ={} ES/SPY={}",
            self.ndx_per_qqq, self.nq_per_qqq, self.es_per_spy
        )
    }
}

fn validate(kind: RatioKind, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteRatio { kind, value });
    }
    if value <= 0.0 {
        return Err(ValidationError::NonPositiveRatio { kind, value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_values() {
        let set = RatioSet::default();
        assert_eq!(set.ndx_per_qqq(), 41.10241216829076);
        assert_eq!(set.nq_per_qqq(), 41.29471200210854);
        assert_eq!(set.es_per_spy(), 10.072138887159946);
        assert_eq!(set.get(RatioKind::EsPerSpy), set.es_per_spy());
    }

    #[test]
    fn test_rejects_non_positive() {
        assert_eq!(
            RatioSet::new(41.0, 0.0, 10.0),
            Err(ValidationError::NonPositiveRatio { kind: RatioKind::NqPerQqq, value: 0.0 })
        );
        assert!(RatioSet::new(-1.0, 41.0, 10.0).is_err());
        assert!(matches!(
            RatioSet::new(41.0, 41.0, f64::INFINITY),
            Err(ValidationError::NonFiniteRatio { .. })
        ));
    }

    #[test]
    fn test_missing_field_rejected() {
        let fields = RatioFields {
            ndx_per_qqq: Some(41.0),
            nq_per_qqq: None,
            es_per_spy: Some(10.0),
        };
        assert_eq!(
            RatioSet::try_from(fields),
            Err(ValidationError::MissingRatio(RatioKind::NqPerQqq))
        );
    }

    #[test]
    fn test_wire_labels() {
        let json = serde_json::to_value(RatioSet::DEFAULT).unwrap();
        assert_eq!(json["NDX/QQQ Ratio"], 41.10241216829076);
        assert_eq!(json["NQ/QQQ Ratio"], 41.29471200210854);
        assert_eq!(json["ES/SPY Ratio"], 10.072138887159946);

        let parsed: RatioSet = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, RatioSet::DEFAULT);
    }

    #[test]
    fn test_deserialize_validates() {
        let body = r#"{"NDX/QQQ Ratio": 41.0, "NQ/QQQ Ratio": -2.0, "ES/SPY Ratio": 10.0}"#;
        assert!(serde_json::from_str::<RatioSet>(body).is_err());
    }

    proptest! {
        #[test]
        fn prop_positive_values_accepted(a in 1e-6f64..1e6, b in 1e-6f64..1e6, c in 1e-6f64..1e6) {
            let set = RatioSet::new(a, b, c).unwrap();
            prop_assert_eq!(set.get(RatioKind::NdxPerQqq), a);
            prop_assert_eq!(set.get(RatioKind::NqPerQqq), b);
            prop_assert_eq!(set.get(RatioKind::EsPerSpy), c);
        }
    }
}
