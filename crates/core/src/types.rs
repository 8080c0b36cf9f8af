//! Domain types shared across the terminal crates.

use serde::{Deserialize, Serialize};

/// Direction of an option leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionSide {
    Long,
    Short,
}

impl OptionSide {
    /// Multiplier applied to per-contract Greeks when aggregating a basket.
    #[must_use]
    pub fn greek_sign(self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
        }
    }

    /// Premium cash-flow sign: long legs pay a debit, short legs collect a credit.
    #[must_use]
    pub fn premium_sign(self) -> f64 {
        match self {
            Self::Long => -1.0,
            Self::Short => 1.0,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Short => "short",
        }
    }
}

impl std::fmt::Display for OptionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Contract right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Put => "put",
        }
    }
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-contract Greeks as served by the gateway.
///
/// Values are quoted in the long convention; side adjustment happens at
/// aggregation time, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GreeksRecord {
    #[serde(default)]
    pub contract_symbol: Option<String>,
    pub strike: f64,
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
    pub rho: f64,
}

/// Expiry profit of a single leg sampled over a spot grid.
///
/// Invariant: `spot_prices` and `profits` have equal length and the grid
/// ascends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayoffCurve {
    pub spot_prices: Vec<f64>,
    pub profits: Vec<f64>,
}

impl PayoffCurve {
    #[must_use]
    pub fn len(&self) -> usize {
        self.spot_prices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spot_prices.is_empty()
    }
}

/// One leg of the working strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: OptionSide,
    pub option_type: OptionType,
    pub strike: f64,
    /// Premium per contract as entered by the user, never negative.
    pub premium: f64,
    pub payoff: PayoffCurve,
    /// Absent when no Greeks row matched the strike at add time.
    pub greeks: Option<GreeksRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_side_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&OptionSide::Long).unwrap(), "\"long\"");
        assert_eq!(serde_json::to_string(&OptionSide::Short).unwrap(), "\"short\"");
        let side: OptionSide = serde_json::from_str("\"short\"").unwrap();
        assert_eq!(side, OptionSide::Short);
    }

    #[test]
    fn test_option_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&OptionType::Call).unwrap(), "\"call\"");
        let right: OptionType = serde_json::from_str("\"put\"").unwrap();
        assert_eq!(right, OptionType::Put);
    }

    #[test]
    fn test_sign_helpers() {
        assert_eq!(OptionSide::Long.greek_sign(), 1.0);
        assert_eq!(OptionSide::Short.greek_sign(), -1.0);
        assert_eq!(OptionSide::Long.premium_sign(), -1.0);
        assert_eq!(OptionSide::Short.premium_sign(), 1.0);
    }

    #[test]
    fn test_greeks_record_wire_casing() {
        let record: GreeksRecord = serde_json::from_value(serde_json::json!({
            "contractSymbol": "AAPL241220C00150000",
            "strike": 150.0,
            "delta": 0.55,
            "gamma": 0.03,
            "theta": -0.04,
            "vega": 0.12,
            "rho": 0.08
        }))
        .unwrap();
        assert_eq!(record.contract_symbol.as_deref(), Some("AAPL241220C00150000"));
        assert_eq!(record.strike, 150.0);

        // Symbol is optional on the wire.
        let bare: GreeksRecord = serde_json::from_value(serde_json::json!({
            "strike": 95.0,
            "delta": -0.45,
            "gamma": 0.02,
            "theta": -0.03,
            "vega": 0.11,
            "rho": -0.05
        }))
        .unwrap();
        assert!(bare.contract_symbol.is_none());
    }

    #[test]
    fn test_payoff_curve_len() {
        let curve = PayoffCurve {
            spot_prices: vec![90.0, 100.0, 110.0],
            profits: vec![-10.0, 0.0, 10.0],
        };
        assert_eq!(curve.len(), 3);
        assert!(!curve.is_empty());
        assert!(PayoffCurve::default().is_empty());
    }
}
