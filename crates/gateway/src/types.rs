//! Wire payload types served by the computation gateway.
//!
//! Every tool response deserializes into one of these schemas and passes a
//! shape check before it reaches any cache. Casing follows the wire: the
//! gateway serves snake_case except on per-contract rows, where the market
//! data vendor's camelCase leaks through.

use chrono::NaiveDate;
use options_terminal_core::{GreeksRecord, OptionSide, OptionType, PayoffCurve};
use serde::{Deserialize, Serialize};

// =============================================================================
// Expirations
// =============================================================================

/// Available expiration dates for an underlying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpirationList {
    pub underlying: String,
    /// `YYYY-MM-DD`, soonest first.
    pub expirations: Vec<String>,
    pub count: usize,
}

// =============================================================================
// Option chain
// =============================================================================

/// One quoted contract row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractQuote {
    pub contract_symbol: String,
    /// Vendor timestamp, `YYYY-MM-DD HH:MM`.
    pub last_trade_date: String,
    pub strike: f64,
    pub last_price: f64,
    pub bid: f64,
    pub ask: f64,
    pub mid: f64,
    /// Missing on illiquid rows; absent is valid data, not a schema violation.
    #[serde(default)]
    pub volume: Option<i64>,
    #[serde(default)]
    pub open_interest: Option<i64>,
    #[serde(default)]
    pub implied_volatility: Option<f64>,
    pub in_the_money: bool,
}

/// Full chain for one expiration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChain {
    pub underlying: String,
    pub long_name: String,
    pub currency: String,
    pub expiration: String,
    pub as_of: NaiveDate,
    pub spot: f64,
    pub calls: Vec<ContractQuote>,
    pub puts: Vec<ContractQuote>,
}

impl OptionChain {
    /// Shape check applied at the client boundary.
    ///
    /// # Errors
    ///
    /// Returns the reason when the chain cannot be used downstream.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.spot.is_finite() || self.spot <= 0.0 {
            return Err(format!("spot must be finite and positive, got {}", self.spot));
        }
        Ok(())
    }
}

// =============================================================================
// Greeks
// =============================================================================

/// Per-contract Greeks for every strike in one expiration, long convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreeksChain {
    pub underlying: String,
    pub expiration: String,
    pub calls: Vec<GreeksRecord>,
    pub puts: Vec<GreeksRecord>,
}

impl GreeksChain {
    /// Looks up the record for a strike on the given right.
    ///
    /// Strikes come off the same chain the caller selected from, so exact
    /// comparison is intended.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn lookup(&self, option_type: OptionType, strike: f64) -> Option<&GreeksRecord> {
        let records = match option_type {
            OptionType::Call => &self.calls,
            OptionType::Put => &self.puts,
        };
        records.iter().find(|record| record.strike == strike)
    }
}

// =============================================================================
// Implied distribution
// =============================================================================

/// One bucket of the binned risk-neutral density.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionBin {
    pub strike_bin: f64,
    pub probability: f64,
}

/// Risk-neutral distribution implied by one expiration's quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpliedDistribution {
    pub expiration: String,
    pub underlying: String,
    pub strikes: Vec<f64>,
    pub spot: f64,
    pub dte: i64,
    pub risk_free_rate: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub quantile_25: f64,
    pub quantile_50: f64,
    pub quantile_75: f64,
    pub bowley_skewness: f64,
    #[serde(rename = "VaR_95")]
    pub var_95: f64,
    #[serde(rename = "VaR_95_loss")]
    pub var_95_loss: f64,
    pub probability_below_spot: f64,
    pub probability_above_spot: f64,
    pub distribution_summary: Vec<DistributionBin>,
}

impl ImpliedDistribution {
    /// Shape check applied at the client boundary.
    ///
    /// # Errors
    ///
    /// Returns the reason when the distribution cannot be used downstream.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.strikes.is_empty() {
            return Err("distribution carries no strikes".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Payoff
// =============================================================================

/// Arguments for a payoff pricing call.
#[derive(Debug, Clone, Serialize)]
pub struct PayoffRequest {
    pub side: OptionSide,
    pub option_type: OptionType,
    pub underlying: String,
    pub strike: f64,
    pub expiration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spot_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spot_max: Option<f64>,
}

impl PayoffRequest {
    #[must_use]
    pub fn new(
        side: OptionSide,
        option_type: OptionType,
        underlying: impl Into<String>,
        strike: f64,
        expiration: impl Into<String>,
    ) -> Self {
        Self {
            side,
            option_type,
            underlying: underlying.into(),
            strike,
            expiration: expiration.into(),
            spot_min: None,
            spot_max: None,
        }
    }

    /// Sets the spot grid bounds; the gateway derives its own around spot
    /// when they are absent.
    #[must_use]
    pub fn with_spot_range(mut self, spot_min: f64, spot_max: f64) -> Self {
        self.spot_min = Some(spot_min);
        self.spot_max = Some(spot_max);
        self
    }

    /// Parameter check applied before the request leaves the process.
    ///
    /// # Errors
    ///
    /// Returns the reason when the request is not priceable.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.strike.is_finite() || self.strike <= 0.0 {
            return Err(format!("strike must be finite and positive, got {}", self.strike));
        }
        if self.expiration.is_empty() {
            return Err("expiration cannot be empty".to_string());
        }
        match (self.spot_min, self.spot_max) {
            (Some(min), Some(max)) => {
                if !min.is_finite() || !max.is_finite() || min <= 0.0 || min >= max {
                    return Err(format!("invalid spot range: [{min}, {max}]"));
                }
                Ok(())
            }
            (None, None) => Ok(()),
            _ => Err("spot_min and spot_max must be provided together".to_string()),
        }
    }
}

/// Priced expiry payoff for a single leg, per contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffProfile {
    pub underlying: String,
    pub expiration: String,
    pub strike: f64,
    pub side: OptionSide,
    pub option_type: OptionType,
    /// Premium the gateway resolved for the contract, not necessarily what
    /// the user paid.
    pub premium: f64,
    pub spot_current: f64,
    pub spot_prices: Vec<f64>,
    /// Intrinsic value at expiry per grid point.
    pub payoffs: Vec<f64>,
    /// Payoff net of premium per grid point.
    pub profits: Vec<f64>,
    /// Side-adjusted Greeks for display alongside the curve. Stored legs
    /// attach the long-convention record from the Greeks cache instead.
    pub greeks: GreeksRecord,
}

impl PayoffProfile {
    /// Extracts the grid/profit pair a stored leg carries.
    #[must_use]
    pub fn curve(&self) -> PayoffCurve {
        PayoffCurve {
            spot_prices: self.spot_prices.clone(),
            profits: self.profits.clone(),
        }
    }

    /// Shape check applied at the client boundary.
    ///
    /// # Errors
    ///
    /// Returns the reason when the profile cannot be aggregated downstream.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.spot_prices.is_empty() {
            return Err("empty spot grid".to_string());
        }
        if self.payoffs.len() != self.spot_prices.len()
            || self.profits.len() != self.spot_prices.len()
        {
            return Err(format!(
                "grid/series length mismatch: {} spots, {} payoffs, {} profits",
                self.spot_prices.len(),
                self.payoffs.len(),
                self.profits.len()
            ));
        }
        if !self.spot_prices.windows(2).all(|pair| pair[0] < pair[1]) {
            return Err("spot grid is not strictly ascending".to_string());
        }
        let mut series = self
            .spot_prices
            .iter()
            .chain(&self.payoffs)
            .chain(&self.profits);
        if series.any(|value| !value.is_finite()) {
            return Err("non-finite value in payoff series".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Historical prices
// =============================================================================

/// One OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Price history for an underlying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPrices {
    pub underlying: String,
    pub long_name: String,
    pub currency: String,
    pub current_price: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub interval: String,
    pub data: Vec<HistoricalBar>,
}

// =============================================================================
// Health
// =============================================================================

/// Gateway liveness report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub tools_available: Vec<String>,
}

impl HealthStatus {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(strike: f64, delta: f64) -> GreeksRecord {
        GreeksRecord {
            contract_symbol: None,
            strike,
            delta,
            gamma: 0.03,
            theta: -0.04,
            vega: 0.12,
            rho: 0.05,
        }
    }

    // ==================== Quote Parsing Tests ====================

    #[test]
    fn test_contract_quote_wire_casing() {
        let quote: ContractQuote = serde_json::from_value(json!({
            "contractSymbol": "AAPL250117C00150000",
            "lastTradeDate": "2024-12-20 15:45",
            "strike": 150.0,
            "lastPrice": 12.5,
            "bid": 12.3,
            "ask": 12.7,
            "mid": 12.5,
            "volume": 4200,
            "openInterest": 15000,
            "impliedVolatility": 0.31,
            "inTheMoney": true
        }))
        .unwrap();

        assert_eq!(quote.contract_symbol, "AAPL250117C00150000");
        assert_eq!(quote.open_interest, Some(15000));
        assert_eq!(quote.implied_volatility, Some(0.31));
        assert!(quote.in_the_money);
    }

    #[test]
    fn test_contract_quote_tolerates_missing_liquidity_fields() {
        let quote: ContractQuote = serde_json::from_value(json!({
            "contractSymbol": "AAPL250117P00090000",
            "lastTradeDate": "2024-12-20 09:31",
            "strike": 90.0,
            "lastPrice": 0.05,
            "bid": 0.0,
            "ask": 0.1,
            "mid": 0.05,
            "inTheMoney": false
        }))
        .unwrap();

        assert_eq!(quote.volume, None);
        assert_eq!(quote.open_interest, None);
        assert_eq!(quote.implied_volatility, None);
    }

    // ==================== Chain Validation Tests ====================

    #[test]
    fn test_chain_rejects_non_positive_spot() {
        let chain = OptionChain {
            underlying: "AAPL".to_string(),
            long_name: "Apple Inc.".to_string(),
            currency: "USD".to_string(),
            expiration: "2025-01-17".to_string(),
            as_of: NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(),
            spot: 0.0,
            calls: vec![],
            puts: vec![],
        };
        assert!(chain.validate().is_err());
    }

    // ==================== Greeks Lookup Tests ====================

    #[test]
    fn test_greeks_lookup_by_strike_and_right() {
        let greeks = GreeksChain {
            underlying: "AAPL".to_string(),
            expiration: "2025-01-17".to_string(),
            calls: vec![record(145.0, 0.62), record(150.0, 0.51)],
            puts: vec![record(150.0, -0.49)],
        };

        let call = greeks.lookup(OptionType::Call, 150.0).unwrap();
        assert_eq!(call.delta, 0.51);

        let put = greeks.lookup(OptionType::Put, 150.0).unwrap();
        assert_eq!(put.delta, -0.49);

        assert!(greeks.lookup(OptionType::Put, 145.0).is_none());
    }

    // ==================== Distribution Tests ====================

    #[test]
    fn test_distribution_wire_var_casing() {
        let distribution: ImpliedDistribution = serde_json::from_value(json!({
            "expiration": "2025-01-17",
            "underlying": "AAPL",
            "strikes": [140.0, 150.0, 160.0],
            "spot": 150.0,
            "dte": 28,
            "risk_free_rate": 0.043,
            "mean": 151.2,
            "std_dev": 9.8,
            "skewness": -0.35,
            "kurtosis": 3.4,
            "quantile_25": 144.0,
            "quantile_50": 151.0,
            "quantile_75": 157.5,
            "bowley_skewness": -0.04,
            "VaR_95": 134.0,
            "VaR_95_loss": -0.107,
            "probability_below_spot": 0.47,
            "probability_above_spot": 0.53,
            "distribution_summary": [
                { "strike_bin": 140.0, "probability": 0.18 },
                { "strike_bin": 150.0, "probability": 0.41 }
            ]
        }))
        .unwrap();

        assert_eq!(distribution.var_95, 134.0);
        assert_eq!(distribution.distribution_summary.len(), 2);
        assert!(distribution.validate().is_ok());
    }

    #[test]
    fn test_distribution_rejects_empty_strikes() {
        let mut distribution: ImpliedDistribution = serde_json::from_value(json!({
            "expiration": "2025-01-17",
            "underlying": "AAPL",
            "strikes": [140.0],
            "spot": 150.0,
            "dte": 28,
            "risk_free_rate": 0.043,
            "mean": 151.2,
            "std_dev": 9.8,
            "skewness": -0.35,
            "kurtosis": 3.4,
            "quantile_25": 144.0,
            "quantile_50": 151.0,
            "quantile_75": 157.5,
            "bowley_skewness": -0.04,
            "VaR_95": 134.0,
            "VaR_95_loss": -0.107,
            "probability_below_spot": 0.47,
            "probability_above_spot": 0.53,
            "distribution_summary": []
        }))
        .unwrap();
        distribution.strikes.clear();
        assert!(distribution.validate().is_err());
    }

    // ==================== Payoff Request Tests ====================

    #[test]
    fn test_payoff_request_omits_absent_spot_range() {
        let request = PayoffRequest::new(
            OptionSide::Long,
            OptionType::Call,
            "AAPL",
            150.0,
            "2025-01-17",
        );
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["side"], "long");
        assert_eq!(value["option_type"], "call");
        assert!(value.get("spot_min").is_none());
        assert!(value.get("spot_max").is_none());
    }

    #[test]
    fn test_payoff_request_serializes_spot_range() {
        let request = PayoffRequest::new(
            OptionSide::Short,
            OptionType::Put,
            "AAPL",
            150.0,
            "2025-01-17",
        )
        .with_spot_range(75.0, 225.0);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["spot_min"], 75.0);
        assert_eq!(value["spot_max"], 225.0);
    }

    #[test]
    fn test_payoff_request_validation() {
        let good = PayoffRequest::new(
            OptionSide::Long,
            OptionType::Call,
            "AAPL",
            150.0,
            "2025-01-17",
        );
        assert!(good.validate().is_ok());

        let bad_strike = PayoffRequest::new(
            OptionSide::Long,
            OptionType::Call,
            "AAPL",
            -1.0,
            "2025-01-17",
        );
        assert!(bad_strike.validate().is_err());

        let no_expiration =
            PayoffRequest::new(OptionSide::Long, OptionType::Call, "AAPL", 150.0, "");
        assert!(no_expiration.validate().is_err());

        let inverted = PayoffRequest::new(
            OptionSide::Long,
            OptionType::Call,
            "AAPL",
            150.0,
            "2025-01-17",
        )
        .with_spot_range(200.0, 100.0);
        assert!(inverted.validate().is_err());

        let mut half_open = PayoffRequest::new(
            OptionSide::Long,
            OptionType::Call,
            "AAPL",
            150.0,
            "2025-01-17",
        );
        half_open.spot_min = Some(75.0);
        assert!(half_open.validate().is_err());
    }

    // ==================== Payoff Profile Tests ====================

    fn profile(spot_prices: Vec<f64>, payoffs: Vec<f64>, profits: Vec<f64>) -> PayoffProfile {
        PayoffProfile {
            underlying: "AAPL".to_string(),
            expiration: "2025-01-17".to_string(),
            strike: 150.0,
            side: OptionSide::Long,
            option_type: OptionType::Call,
            premium: 12.5,
            spot_current: 150.0,
            spot_prices,
            payoffs,
            profits,
            greeks: record(150.0, 0.51),
        }
    }

    #[test]
    fn test_payoff_profile_validates_aligned_series() {
        let good = profile(
            vec![75.0, 150.0, 225.0],
            vec![0.0, 0.0, 7500.0],
            vec![-1250.0, -1250.0, 6250.0],
        );
        assert!(good.validate().is_ok());

        let curve = good.curve();
        assert_eq!(curve.spot_prices, vec![75.0, 150.0, 225.0]);
        assert_eq!(curve.profits, vec![-1250.0, -1250.0, 6250.0]);
    }

    #[test]
    fn test_payoff_profile_rejects_length_mismatch() {
        let bad = profile(vec![75.0, 150.0, 225.0], vec![0.0, 7500.0], vec![-1250.0]);
        assert!(bad.validate().unwrap_err().contains("length mismatch"));
    }

    #[test]
    fn test_payoff_profile_rejects_unsorted_grid() {
        let bad = profile(
            vec![150.0, 75.0, 225.0],
            vec![0.0, 0.0, 7500.0],
            vec![-1250.0, -1250.0, 6250.0],
        );
        assert!(bad.validate().unwrap_err().contains("ascending"));
    }

    #[test]
    fn test_payoff_profile_rejects_non_finite_values() {
        let bad = profile(
            vec![75.0, 150.0, 225.0],
            vec![0.0, 0.0, 7500.0],
            vec![-1250.0, f64::NAN, 6250.0],
        );
        assert!(bad.validate().unwrap_err().contains("non-finite"));
    }

    #[test]
    fn test_payoff_profile_rejects_empty_grid() {
        let bad = profile(vec![], vec![], vec![]);
        assert!(bad.validate().unwrap_err().contains("empty"));
    }

    // ==================== Historical / Health Tests ====================

    #[test]
    fn test_historical_bar_dates_parse() {
        let prices: HistoricalPrices = serde_json::from_value(json!({
            "underlying": "AAPL",
            "long_name": "Apple Inc.",
            "currency": "USD",
            "current_price": 150.0,
            "start_date": "2024-09-20",
            "end_date": "2024-12-20",
            "interval": "1d",
            "data": [
                { "date": "2024-12-19", "open": 148.2, "high": 150.9, "low": 147.8, "close": 149.6, "volume": 52_000_000_i64 },
                { "date": "2024-12-20", "open": 149.8, "high": 151.2, "low": 149.1, "close": 150.0, "volume": 61_000_000_i64 }
            ]
        }))
        .unwrap();

        assert_eq!(prices.data.len(), 2);
        assert_eq!(
            prices.data[1].date,
            NaiveDate::from_ymd_opt(2024, 12, 20).unwrap()
        );
        assert_eq!(prices.interval, "1d");
    }

    #[test]
    fn test_health_status_ok() {
        let health: HealthStatus = serde_json::from_value(json!({
            "status": "ok",
            "tools_available": ["get_expirations", "get_chain"]
        }))
        .unwrap();
        assert!(health.is_ok());
        assert_eq!(health.tools_available.len(), 2);
    }
}
