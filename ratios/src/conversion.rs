//! Conversion inputs, rounding and records.

use std::fmt;

use indexswap_common::time::Timestamp;
use indexswap_common::{ConversionPair, Instrument};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{RatioError, RatioResult};

/// Decimal places kept in conversion results.
pub const RESULT_DECIMAL_PLACES: u32 = 2;

/// A conversion input as supplied by a caller: a number or its text form.
#[derive(Debug, Clone, PartialEq)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    /// Parse into a finite, non-negative value.
    pub fn parse(&self) -> RatioResult<f64> {
        let value = match self {
            Amount::Number(value) => *value,
            Amount::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| RatioError::invalid_input(text.as_str(), "not a number"))?,
        };

        if !value.is_finite() {
            return Err(RatioError::invalid_input(self.to_string(), "value must be finite"));
        }
        if value < 0.0 {
            return Err(RatioError::invalid_input(self.to_string(), "value cannot be negative"));
        }

        // -0.0 normalizes to 0.0
        Ok(if value == 0.0 { 0.0 } else { value })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Number(value) => write!(f, "{value}"),
            Amount::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount::Number(value)
    }
}

impl From<f32> for Amount {
    fn from(value: f32) -> Self {
        Amount::Number(f64::from(value))
    }
}

impl From<i32> for Amount {
    fn from(value: i32) -> Self {
        Amount::Number(f64::from(value))
    }
}

impl From<u32> for Amount {
    fn from(value: u32) -> Self {
        Amount::Number(f64::from(value))
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Amount::Number(value as f64)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount::Number(value as f64)
    }
}

impl From<&str> for Amount {
    fn from(text: &str) -> Self {
        Amount::Text(text.to_string())
    }
}

impl From<String> for Amount {
    fn from(text: String) -> Self {
        Amount::Text(text)
    }
}

/// Apply `pair`'s formula without rounding.
pub fn apply_ratio(pair: ConversionPair, value: f64, ratio: f64) -> f64 {
    pair.operation().apply(value, ratio)
}

/// Round the exact binary value of `raw` to two decimal places, midpoint to
/// even. `None` when `raw` is outside `Decimal`'s range.
pub fn round_decimal(raw: f64) -> Option<Decimal> {
    Decimal::from_f64_retain(raw)
        .map(|d| d.round_dp_with_strategy(RESULT_DECIMAL_PLACES, RoundingStrategy::MidpointNearestEven))
}

/// Round a raw result to two decimal places.
pub fn round_result(raw: f64) -> f64 {
    match round_decimal(raw) {
        Some(rounded) => rounded.to_f64().unwrap_or(raw),
        // Past Decimal's range every f64 is already a whole number
        None => raw,
    }
}

/// A completed conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversion {
    /// Unique conversion ID.
    pub id: Uuid,
    /// Conversion performed.
    pub pair: ConversionPair,
    /// Validated input value.
    pub input: f64,
    /// Rounded result.
    pub output: f64,
    /// Ratio applied.
    pub ratio: f64,
    /// Refresh time of the ratio set used; `None` means built-in defaults.
    pub ratios_updated_at: Option<Timestamp>,
    /// When the conversion was executed.
    pub executed_at: Timestamp,
}

impl Conversion {
    /// Compute a conversion from a validated input and ratio.
    pub fn compute(
        pair: ConversionPair,
        input: f64,
        ratio: f64,
        ratios_updated_at: Option<Timestamp>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            pair,
            input,
            output: round_result(apply_ratio(pair, input, ratio)),
            ratio,
            ratios_updated_at,
            executed_at: indexswap_common::time::now(),
        }
    }

    pub fn from_instrument(&self) -> Instrument {
        self.pair.from()
    }

    pub fn to_instrument(&self) -> Instrument {
        self.pair.to()
    }

    /// Whether the built-in default ratios were used.
    pub fn used_defaults(&self) -> bool {
        self.ratios_updated_at.is_none()
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} = {} {}",
            self.input,
            self.from_instrument(),
            self.output,
            self.to_instrument()
        )
    }
}
