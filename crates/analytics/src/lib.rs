//! Pure aggregation engine for the options terminal.
//!
//! This crate provides:
//! - Net Greeks across a multi-leg strategy with side adjustment
//! - Combined profit curve over the shared spot grid, with grid checks
//! - Profit bounds, breakeven spots, and net premium
//!
//! Everything here is synchronous and side-effect free. The session
//! store owns when these run; this crate only owns what they compute.

pub mod aggregate;
pub mod error;

// Re-export main types for convenience
pub use aggregate::{
    aggregate_greeks, combined_profit_curve, find_breakevens, max_profit_loss, net_premium,
    strategy_metrics, AggregatedGreeks, ProfitBounds, StrategyMetrics,
};
pub use error::{AnalyticsError, Result};
