//! Pure session state and its transitions.
//!
//! Everything the dashboard renders lives in [`SessionState`]. Transitions
//! are synchronous methods with no I/O, so every cascade and cache rule is
//! unit-testable without a gateway. The store in [`crate::store`] owns
//! when they run and what happens around them.

use options_terminal_analytics::StrategyMetrics;
use options_terminal_core::Position;
use options_terminal_gateway::{
    ExpirationList, GreeksChain, HistoricalPrices, ImpliedDistribution, OptionChain,
};
use serde::{Deserialize, Serialize};

/// Resources the store fetches and tracks independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Expirations,
    Chain,
    Greeks,
    Distribution,
    Payoff,
    Historical,
}

impl ResourceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expirations => "expirations",
            Self::Chain => "chain",
            Self::Greeks => "greeks",
            Self::Distribution => "distribution",
            Self::Payoff => "payoff",
            Self::Historical => "historical",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-resource loading flags.
///
/// Flags are independent: a chain fetch in flight never blocks or hides a
/// distribution fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingFlags {
    pub expirations: bool,
    pub chain: bool,
    pub greeks: bool,
    pub distribution: bool,
    pub payoff: bool,
    pub historical: bool,
}

impl LoadingFlags {
    #[must_use]
    pub fn get(self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Expirations => self.expirations,
            ResourceKind::Chain => self.chain,
            ResourceKind::Greeks => self.greeks,
            ResourceKind::Distribution => self.distribution,
            ResourceKind::Payoff => self.payoff,
            ResourceKind::Historical => self.historical,
        }
    }

    /// True while any request is in flight.
    #[must_use]
    pub fn any(self) -> bool {
        self.expirations
            || self.chain
            || self.greeks
            || self.distribution
            || self.payoff
            || self.historical
    }

    fn set(&mut self, kind: ResourceKind, value: bool) {
        match kind {
            ResourceKind::Expirations => self.expirations = value,
            ResourceKind::Chain => self.chain = value,
            ResourceKind::Greeks => self.greeks = value,
            ResourceKind::Distribution => self.distribution = value,
            ResourceKind::Payoff => self.payoff = value,
            ResourceKind::Historical => self.historical = value,
        }
    }
}

/// Complete per-session state of the terminal.
///
/// Selection fields key the cached datasets: data cached under an old
/// selection is cleared the moment the selection changes, never displayed
/// against the new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub selected_underlying: String,
    pub selected_expiration: Option<String>,
    pub available_expirations: Vec<String>,
    pub chain: Option<OptionChain>,
    pub greeks: Option<GreeksChain>,
    pub distribution: Option<ImpliedDistribution>,
    pub historical: Option<HistoricalPrices>,
    pub positions: Vec<Position>,
    pub loading: LoadingFlags,
    /// Single slot; the most recent failure wins.
    pub last_error: Option<String>,
    /// Derived from `positions`. `None` only when the last refresh failed.
    pub metrics: Option<StrategyMetrics>,
}

impl SessionState {
    /// Fresh state for one session, nothing fetched yet.
    #[must_use]
    pub fn new(underlying: impl Into<String>) -> Self {
        Self {
            selected_underlying: underlying.into(),
            selected_expiration: None,
            available_expirations: Vec::new(),
            chain: None,
            greeks: None,
            distribution: None,
            historical: None,
            positions: Vec::new(),
            loading: LoadingFlags::default(),
            last_error: None,
            metrics: Some(StrategyMetrics::default()),
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Switches the underlying and drops everything keyed on the old one.
    ///
    /// The expiration list, price history, and positions survive; the list
    /// is refreshed by the next fetch, history by its own action, and
    /// positions only ever leave through an explicit clear.
    pub fn set_underlying(&mut self, ticker: impl Into<String>) {
        self.selected_underlying = ticker.into();
        self.selected_expiration = None;
        self.chain = None;
        self.greeks = None;
        self.distribution = None;
    }

    /// Switches the expiration and drops the per-expiration datasets.
    pub fn set_expiration(&mut self, expiration: impl Into<String>) {
        self.selected_expiration = Some(expiration.into());
        self.chain = None;
        self.greeks = None;
        self.distribution = None;
    }

    // =========================================================================
    // Request lifecycle
    // =========================================================================

    /// Marks a request started: flag up, error slot cleared.
    pub fn begin(&mut self, kind: ResourceKind) {
        self.loading.set(kind, true);
        self.last_error = None;
    }

    /// Marks a request settled, success or failure.
    pub fn finish(&mut self, kind: ResourceKind) {
        self.loading.set(kind, false);
    }

    /// Records a failure in the single error slot.
    pub fn fail(&mut self, kind: ResourceKind, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{} request failed: {}", kind.as_str(), message);
        self.last_error = Some(message);
    }

    // =========================================================================
    // Merges
    // =========================================================================

    /// Stores a fresh expiration list and keeps the selection valid.
    ///
    /// The first listed expiration is auto-selected whenever the current
    /// selection differs, running the same cascade as [`set_expiration`]
    /// so datasets from a delisted expiration cannot linger. An unchanged
    /// selection keeps its datasets.
    ///
    /// [`set_expiration`]: SessionState::set_expiration
    pub fn merge_expirations(&mut self, listing: ExpirationList) {
        self.available_expirations = listing.expirations;
        match self.available_expirations.first().cloned() {
            Some(first) => {
                if self.selected_expiration.as_deref() != Some(first.as_str()) {
                    self.set_expiration(first);
                }
            }
            None => {
                if self.selected_expiration.take().is_some() {
                    self.chain = None;
                    self.greeks = None;
                    self.distribution = None;
                }
            }
        }
    }

    pub fn merge_chain(&mut self, chain: OptionChain) {
        self.chain = Some(chain);
    }

    pub fn merge_greeks(&mut self, greeks: GreeksChain) {
        self.greeks = Some(greeks);
    }

    pub fn merge_distribution(&mut self, distribution: ImpliedDistribution) {
        self.distribution = Some(distribution);
    }

    pub fn merge_historical(&mut self, historical: HistoricalPrices) {
        self.historical = Some(historical);
    }

    // =========================================================================
    // Positions
    // =========================================================================

    /// Appends a leg and refreshes the derived metrics.
    pub fn push_position(&mut self, position: Position) {
        self.positions.push(position);
        self.refresh_metrics();
    }

    /// Removes the leg at `index`; out of range is a no-op.
    pub fn remove_position(&mut self, index: usize) {
        if index < self.positions.len() {
            self.positions.remove(index);
            self.refresh_metrics();
        }
    }

    /// Empties the basket.
    pub fn clear_positions(&mut self) {
        self.positions.clear();
        self.refresh_metrics();
    }

    /// Drops every cached dataset and the basket; keeps the selection.
    pub fn clear_data(&mut self) {
        self.available_expirations.clear();
        self.chain = None;
        self.greeks = None;
        self.distribution = None;
        self.historical = None;
        self.positions.clear();
        self.last_error = None;
        self.metrics = Some(StrategyMetrics::default());
    }

    /// Recomputes strategy metrics from the current basket.
    ///
    /// An aggregation error leaves `metrics` empty and lands in the error
    /// slot; the stored legs are kept so the basket can be repaired by
    /// removing the offending one.
    pub fn refresh_metrics(&mut self) {
        match options_terminal_analytics::strategy_metrics(&self.positions) {
            Ok(metrics) => self.metrics = Some(metrics),
            Err(err) => {
                tracing::warn!("metrics refresh failed: {}", err);
                self.last_error = Some(err.to_string());
                self.metrics = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use options_terminal_core::{GreeksRecord, OptionSide, OptionType, PayoffCurve};

    fn listing(expirations: &[&str]) -> ExpirationList {
        ExpirationList {
            underlying: "AAPL".to_string(),
            expirations: expirations.iter().map(ToString::to_string).collect(),
            count: expirations.len(),
        }
    }

    fn chain(expiration: &str) -> OptionChain {
        OptionChain {
            underlying: "AAPL".to_string(),
            long_name: "Apple Inc.".to_string(),
            currency: "USD".to_string(),
            expiration: expiration.to_string(),
            as_of: "2024-12-20".parse().unwrap(),
            spot: 150.0,
            calls: vec![],
            puts: vec![],
        }
    }

    fn greeks_chain(expiration: &str) -> GreeksChain {
        GreeksChain {
            underlying: "AAPL".to_string(),
            expiration: expiration.to_string(),
            calls: vec![],
            puts: vec![],
        }
    }

    fn position(spots: Vec<f64>, profits: Vec<f64>) -> Position {
        Position {
            side: OptionSide::Long,
            option_type: OptionType::Call,
            strike: 150.0,
            premium: 2.0,
            payoff: PayoffCurve {
                spot_prices: spots,
                profits,
            },
            greeks: Some(GreeksRecord {
                contract_symbol: None,
                strike: 150.0,
                delta: 0.5,
                gamma: 0.03,
                theta: -0.04,
                vega: 0.12,
                rho: 0.05,
            }),
        }
    }

    fn populated_state() -> SessionState {
        let mut state = SessionState::new("AAPL");
        state.available_expirations = vec!["2025-01-17".to_string(), "2025-02-21".to_string()];
        state.selected_expiration = Some("2025-01-17".to_string());
        state.merge_chain(chain("2025-01-17"));
        state.merge_greeks(greeks_chain("2025-01-17"));
        state.push_position(position(vec![90.0, 110.0], vec![-10.0, 10.0]));
        state
    }

    // ==================== Construction ====================

    #[test]
    fn test_new_state_has_empty_basket_metrics() {
        let state = SessionState::new("AAPL");
        assert_eq!(state.selected_underlying, "AAPL");
        assert!(state.selected_expiration.is_none());
        assert_eq!(state.metrics, Some(StrategyMetrics::default()));
        assert!(state.last_error.is_none());
        assert!(!state.loading.any());
    }

    // ==================== Selection Cascades ====================

    #[test]
    fn test_set_underlying_clears_exactly_the_keyed_data() {
        let mut state = populated_state();
        state.merge_historical(HistoricalPrices {
            underlying: "AAPL".to_string(),
            long_name: "Apple Inc.".to_string(),
            currency: "USD".to_string(),
            current_price: 150.0,
            start_date: "2024-09-20".parse().unwrap(),
            end_date: "2024-12-20".parse().unwrap(),
            interval: "1d".to_string(),
            data: vec![],
        });

        state.set_underlying("MSFT");

        assert_eq!(state.selected_underlying, "MSFT");
        assert!(state.selected_expiration.is_none());
        assert!(state.chain.is_none());
        assert!(state.greeks.is_none());
        assert!(state.distribution.is_none());
        // Untouched: the list, history, and the basket.
        assert_eq!(state.available_expirations.len(), 2);
        assert!(state.historical.is_some());
        assert_eq!(state.positions.len(), 1);
    }

    #[test]
    fn test_set_expiration_keeps_the_expiration_list() {
        let mut state = populated_state();

        state.set_expiration("2025-02-21");

        assert_eq!(state.selected_expiration.as_deref(), Some("2025-02-21"));
        assert!(state.chain.is_none());
        assert!(state.greeks.is_none());
        assert_eq!(state.available_expirations.len(), 2);
        assert_eq!(state.positions.len(), 1);
    }

    // ==================== Request Lifecycle ====================

    #[test]
    fn test_begin_raises_flag_and_clears_error() {
        let mut state = SessionState::new("AAPL");
        state.last_error = Some("previous failure".to_string());

        state.begin(ResourceKind::Chain);

        assert!(state.loading.chain);
        assert!(state.last_error.is_none());
    }

    #[test]
    fn test_flags_are_independent() {
        let mut state = SessionState::new("AAPL");

        state.begin(ResourceKind::Chain);
        state.begin(ResourceKind::Distribution);
        state.finish(ResourceKind::Chain);

        assert!(!state.loading.chain);
        assert!(state.loading.distribution);
    }

    #[test]
    fn test_fail_records_most_recent_message() {
        let mut state = SessionState::new("AAPL");

        state.fail(ResourceKind::Chain, "first");
        state.fail(ResourceKind::Greeks, "second");

        assert_eq!(state.last_error.as_deref(), Some("second"));
    }

    // ==================== Expiration Merge ====================

    #[test]
    fn test_merge_expirations_auto_selects_first() {
        let mut state = SessionState::new("AAPL");

        state.merge_expirations(listing(&["2025-01-17", "2025-02-21"]));

        assert_eq!(state.selected_expiration.as_deref(), Some("2025-01-17"));
        assert_eq!(state.available_expirations.len(), 2);
    }

    #[test]
    fn test_merge_expirations_same_selection_keeps_datasets() {
        let mut state = populated_state();
        assert!(state.chain.is_some());

        state.merge_expirations(listing(&["2025-01-17", "2025-02-21", "2025-03-21"]));

        assert_eq!(state.selected_expiration.as_deref(), Some("2025-01-17"));
        assert!(state.chain.is_some());
        assert!(state.greeks.is_some());
        assert_eq!(state.available_expirations.len(), 3);
    }

    #[test]
    fn test_merge_expirations_new_first_cascades() {
        let mut state = populated_state();

        state.merge_expirations(listing(&["2025-02-21", "2025-03-21"]));

        assert_eq!(state.selected_expiration.as_deref(), Some("2025-02-21"));
        assert!(state.chain.is_none());
        assert!(state.greeks.is_none());
    }

    #[test]
    fn test_merge_expirations_empty_list_clears_selection() {
        let mut state = populated_state();

        state.merge_expirations(listing(&[]));

        assert!(state.selected_expiration.is_none());
        assert!(state.chain.is_none());
        assert!(state.available_expirations.is_empty());
    }

    // ==================== Positions and Metrics ====================

    #[test]
    fn test_push_position_refreshes_metrics() {
        let mut state = SessionState::new("AAPL");

        state.push_position(position(vec![90.0, 110.0], vec![-10.0, 10.0]));

        let metrics = state.metrics.as_ref().unwrap();
        assert_eq!(metrics.breakevens, vec![100.0]);
        assert_eq!(metrics.net_premium, -2.0);
        assert_eq!(metrics.greeks.delta, 0.5);
    }

    #[test]
    fn test_remove_position_out_of_range_is_noop() {
        let mut state = populated_state();

        state.remove_position(7);

        assert_eq!(state.positions.len(), 1);
    }

    #[test]
    fn test_remove_last_position_resets_metrics() {
        let mut state = populated_state();

        state.remove_position(0);

        assert!(state.positions.is_empty());
        assert_eq!(state.metrics, Some(StrategyMetrics::default()));
    }

    #[test]
    fn test_metrics_failure_keeps_basket_and_records_error() {
        let mut state = SessionState::new("AAPL");
        state.push_position(position(vec![90.0, 110.0], vec![-10.0, 10.0]));
        // Different grid: aggregation must refuse the pair.
        state.push_position(position(vec![95.0, 115.0], vec![-10.0, 10.0]));

        assert!(state.metrics.is_none());
        assert!(state.last_error.is_some());
        assert_eq!(state.positions.len(), 2);

        // Removing the offending leg repairs the basket.
        state.remove_position(1);
        assert!(state.metrics.is_some());
    }

    // ==================== Clear ====================

    #[test]
    fn test_clear_positions_resets_metrics() {
        let mut state = populated_state();

        state.clear_positions();

        assert!(state.positions.is_empty());
        assert_eq!(state.metrics, Some(StrategyMetrics::default()));
    }

    #[test]
    fn test_clear_data_keeps_selection() {
        let mut state = populated_state();
        state.last_error = Some("stale failure".to_string());

        state.clear_data();

        assert_eq!(state.selected_underlying, "AAPL");
        assert_eq!(state.selected_expiration.as_deref(), Some("2025-01-17"));
        assert!(state.available_expirations.is_empty());
        assert!(state.chain.is_none());
        assert!(state.greeks.is_none());
        assert!(state.positions.is_empty());
        assert!(state.last_error.is_none());
        assert_eq!(state.metrics, Some(StrategyMetrics::default()));
    }
}
