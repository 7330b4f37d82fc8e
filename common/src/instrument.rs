//! Instruments and the directed conversions between them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{RatioKind, ValidationError};

/// An index, index future or index-tracking fund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Instrument {
    /// Invesco QQQ Trust (tracks the Nasdaq-100).
    Qqq,
    /// Nasdaq-100 index.
    Ndx,
    /// E-mini Nasdaq-100 future.
    Nq,
    /// SPDR S&P 500 ETF.
    Spy,
    /// E-mini S&P 500 future.
    Es,
}

impl Instrument {
    /// All supported instruments.
    pub const ALL: [Instrument; 5] = [
        Instrument::Qqq,
        Instrument::Ndx,
        Instrument::Nq,
        Instrument::Spy,
        Instrument::Es,
    ];

    /// Ticker symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Instrument::Qqq => "QQQ",
            Instrument::Ndx => "NDX",
            Instrument::Nq => "NQ",
            Instrument::Spy => "SPY",
            Instrument::Es => "ES",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Instrument {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let symbol = s.trim();
        Instrument::ALL
            .into_iter()
            .find(|i| i.symbol().eq_ignore_ascii_case(symbol))
            .ok_or_else(|| ValidationError::UnknownInstrument(symbol.to_string()))
    }
}

/// How a ratio is applied to an input amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `input * ratio`
    Multiply,
    /// `input / ratio`
    Divide,
}

impl Operation {
    /// Apply the ratio to a value.
    pub fn apply(&self, value: f64, ratio: f64) -> f64 {
        match self {
            Operation::Multiply => value * ratio,
            Operation::Divide => value / ratio,
        }
    }

    /// The operation that undoes this one.
    pub fn inverse(&self) -> Self {
        match self {
            Operation::Multiply => Operation::Divide,
            Operation::Divide => Operation::Multiply,
        }
    }
}

/// A directed conversion between two instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionPair {
    QqqToNdx,
    QqqToNq,
    NqToQqq,
    NdxToQqq,
    EsToSpy,
    SpyToEs,
}

impl ConversionPair {
    /// All supported conversions.
    pub const ALL: [ConversionPair; 6] = [
        ConversionPair::QqqToNdx,
        ConversionPair::QqqToNq,
        ConversionPair::NqToQqq,
        ConversionPair::NdxToQqq,
        ConversionPair::EsToSpy,
        ConversionPair::SpyToEs,
    ];

    /// Find the pair converting `from` into `to`.
    pub fn between(from: Instrument, to: Instrument) -> Option<Self> {
        ConversionPair::ALL
            .into_iter()
            .find(|p| p.from() == from && p.to() == to)
    }

    /// Source instrument.
    pub fn from(&self) -> Instrument {
        match self {
            ConversionPair::QqqToNdx | ConversionPair::QqqToNq => Instrument::Qqq,
            ConversionPair::NqToQqq => Instrument::Nq,
            ConversionPair::NdxToQqq => Instrument::Ndx,
            ConversionPair::EsToSpy => Instrument::Es,
            ConversionPair::SpyToEs => Instrument::Spy,
        }
    }

    /// Target instrument.
    pub fn to(&self) -> Instrument {
        match self {
            ConversionPair::QqqToNdx => Instrument::Ndx,
            ConversionPair::QqqToNq => Instrument::Nq,
            ConversionPair::NqToQqq | ConversionPair::NdxToQqq => Instrument::Qqq,
            ConversionPair::EsToSpy => Instrument::Spy,
            ConversionPair::SpyToEs => Instrument::Es,
        }
    }

    /// The ratio this conversion reads.
    pub fn ratio_kind(&self) -> RatioKind {
        match self {
            ConversionPair::QqqToNdx | ConversionPair::NdxToQqq => RatioKind::NdxPerQqq,
            ConversionPair::QqqToNq | ConversionPair::NqToQqq => RatioKind::NqPerQqq,
            ConversionPair::EsToSpy | ConversionPair::SpyToEs => RatioKind::EsPerSpy,
        }
    }

    /// Whether the ratio multiplies or divides the input.
    pub fn operation(&self) -> Operation {
        match self {
            ConversionPair::QqqToNdx | ConversionPair::QqqToNq | ConversionPair::SpyToEs => {
                Operation::Multiply
            }
            ConversionPair::NqToQqq | ConversionPair::NdxToQqq | ConversionPair::EsToSpy => {
                Operation::Divide
            }
        }
    }

    /// The reverse conversion.
    pub fn inverse(&self) -> Self {
        match self {
            ConversionPair::QqqToNdx => ConversionPair::NdxToQqq,
            ConversionPair::NdxToQqq => ConversionPair::QqqToNdx,
            ConversionPair::QqqToNq => ConversionPair::NqToQqq,
            ConversionPair::NqToQqq => ConversionPair::QqqToNq,
            ConversionPair::EsToSpy => ConversionPair::SpyToEs,
            ConversionPair::SpyToEs => ConversionPair::EsToSpy,
        }
    }

    /// Snake-case name, e.g. `qqq_to_ndx`.
    pub fn name(&self) -> &'static str {
        match self {
            ConversionPair::QqqToNdx => "qqq_to_ndx",
            ConversionPair::QqqToNq => "qqq_to_nq",
            ConversionPair::NqToQqq => "nq_to_qqq",
            ConversionPair::NdxToQqq => "ndx_to_qqq",
            ConversionPair::EsToSpy => "es_to_spy",
            ConversionPair::SpyToEs => "spy_to_es",
        }
    }
}

impl fmt::Display for ConversionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from(), self.to())
    }
}

impl FromStr for ConversionPair {
    type Err = ValidationError;

    /// Accepts `qqq_to_ndx`, `QQQ->NDX`, `qqq-ndx`, `qqq/ndx` and `qqq:ndx`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ValidationError::UnknownPair(s.trim().to_string());
        let normalized = s
            .trim()
            .to_ascii_lowercase()
            .replace("_to_", "-")
            .replace("->", "-");

        let (from, to) = normalized
            .split_once(|c| matches!(c, '-' | '_' | '/' | ':'))
            .ok_or_else(unknown)?;
        let from: Instrument = from.parse().map_err(|_| unknown())?;
        let to: Instrument = to.parse().map_err(|_| unknown())?;

        ConversionPair::between(from, to).ok_or_else(unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_parse_case_insensitive() {
        assert_eq!("qqq".parse::<Instrument>().unwrap(), Instrument::Qqq);
        assert_eq!(" Es ".parse::<Instrument>().unwrap(), Instrument::Es);
        assert!(matches!(
            "VTI".parse::<Instrument>(),
            Err(ValidationError::UnknownInstrument(_))
        ));
    }

    #[test]
    fn test_pair_parse_forms() {
        assert_eq!("qqq_to_ndx".parse::<ConversionPair>().unwrap(), ConversionPair::QqqToNdx);
        assert_eq!("SPY->ES".parse::<ConversionPair>().unwrap(), ConversionPair::SpyToEs);
        assert_eq!("nq-qqq".parse::<ConversionPair>().unwrap(), ConversionPair::NqToQqq);
        assert_eq!("es/spy".parse::<ConversionPair>().unwrap(), ConversionPair::EsToSpy);
    }

    #[test]
    fn test_unsupported_pair_rejected() {
        assert!(matches!(
            "spy_to_qqq".parse::<ConversionPair>(),
            Err(ValidationError::UnknownPair(_))
        ));
        assert!("qqq".parse::<ConversionPair>().is_err());
    }

    #[test]
    fn test_pair_table() {
        assert_eq!(ConversionPair::QqqToNdx.operation(), Operation::Multiply);
        assert_eq!(ConversionPair::NdxToQqq.operation(), Operation::Divide);
        assert_eq!(ConversionPair::EsToSpy.operation(), Operation::Divide);
        assert_eq!(ConversionPair::SpyToEs.operation(), Operation::Multiply);
        assert_eq!(ConversionPair::QqqToNq.ratio_kind(), RatioKind::NqPerQqq);
        assert_eq!(ConversionPair::SpyToEs.ratio_kind(), RatioKind::EsPerSpy);
    }

    #[test]
    fn test_inverse_pairs_share_ratio() {
        for pair in ConversionPair::ALL {
            let inverse = pair.inverse();
            assert_eq!(inverse.inverse(), pair);
            assert_eq!(inverse.ratio_kind(), pair.ratio_kind());
            assert_eq!(inverse.operation(), pair.operation().inverse());
            assert_eq!(inverse.from(), pair.to());
        }
    }

    #[test]
    fn test_pair_name_round_trips_through_parse() {
        for pair in ConversionPair::ALL {
            assert_eq!(pair.name().parse::<ConversionPair>().unwrap(), pair);
            assert_eq!(pair.to_string().parse::<ConversionPair>().unwrap(), pair);
        }
    }
}
