//! Multi-leg strategy aggregation.
//!
//! Combines per-leg Greeks and payoff curves into strategy-level numbers
//! for the dashboard: net Greeks, profit bounds, breakeven spots, and net
//! premium. Every function here is pure; the session store decides when
//! to recompute.
//!
//! Per-leg inputs are quoted in the long convention. Aggregation applies
//! the side multiplier exactly once:
//! ```text
//! net_greek = sum over legs of sign(side) * greek
//! where sign(long) = +1, sign(short) = -1
//! ```
//! Profit curves arrive already side-adjusted from the pricing gateway,
//! so summing them point by point gives the strategy curve directly.

use crate::error::{AnalyticsError, Result};
use options_terminal_core::{PayoffCurve, Position};
use serde::{Deserialize, Serialize};

/// Net Greeks of a whole strategy.
///
/// Derived from positions on demand, never stored per-leg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedGreeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
    pub rho: f64,
}

/// Extremes of the combined profit curve over the sampled spot grid.
///
/// Both fields can carry either sign: a guaranteed-profit strategy has a
/// positive `max_loss`, a guaranteed-loss one a negative `max_profit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfitBounds {
    pub max_profit: f64,
    pub max_loss: f64,
}

/// Everything the dashboard derives when the strategy changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyMetrics {
    pub greeks: AggregatedGreeks,
    pub bounds: ProfitBounds,
    /// Ascending breakeven spots; duplicates mean the curve touched zero.
    pub breakevens: Vec<f64>,
    pub net_premium: f64,
}

/// Sums per-leg Greeks with the side multiplier applied.
///
/// A leg without Greeks contributes zero to every component; missing
/// rows are a data gap, not an error. Empty input yields the zero
/// vector.
#[must_use]
pub fn aggregate_greeks(positions: &[Position]) -> AggregatedGreeks {
    let mut total = AggregatedGreeks::default();

    for position in positions {
        let Some(greeks) = &position.greeks else {
            continue;
        };
        let sign = position.side.greek_sign();
        total.delta += sign * greeks.delta;
        total.gamma += sign * greeks.gamma;
        total.theta += sign * greeks.theta;
        total.vega += sign * greeks.vega;
        total.rho += sign * greeks.rho;
    }

    total
}

/// Sums per-leg profit curves point by point over the shared spot grid.
///
/// The first leg's grid is canonical. Every leg must carry equal-length
/// spot and profit vectors, and every later leg's grid must equal the
/// canonical grid exactly. Legs priced in the same session share one
/// grid, so a mismatch means a stale or foreign curve got in.
///
/// # Errors
/// Returns [`AnalyticsError::MalformedCurve`] when a leg's vectors
/// disagree in length, [`AnalyticsError::MisalignedPayoffGrid`] when a
/// leg was priced over a different grid.
pub fn combined_profit_curve(positions: &[Position]) -> Result<PayoffCurve> {
    let Some(first) = positions.first() else {
        return Ok(PayoffCurve::default());
    };

    let grid = &first.payoff.spot_prices;
    let mut profits = vec![0.0; grid.len()];

    for (index, position) in positions.iter().enumerate() {
        let curve = &position.payoff;
        if curve.spot_prices.len() != curve.profits.len() {
            return Err(AnalyticsError::MalformedCurve {
                index,
                spots: curve.spot_prices.len(),
                profits: curve.profits.len(),
            });
        }
        #[allow(clippy::float_cmp)]
        if curve.spot_prices.len() != grid.len()
            || curve
                .spot_prices
                .iter()
                .zip(grid.iter())
                .any(|(a, b)| a != b)
        {
            return Err(AnalyticsError::MisalignedPayoffGrid { index });
        }
        for (total, profit) in profits.iter_mut().zip(curve.profits.iter()) {
            *total += profit;
        }
    }

    Ok(PayoffCurve {
        spot_prices: grid.clone(),
        profits,
    })
}

/// Maximum profit and maximum loss over the sampled grid.
///
/// Extremes of the combined curve, not of the analytic payoff: an
/// unbounded strategy reports the best and worst values the grid
/// reaches. Empty input yields `{0.0, 0.0}`.
///
/// # Errors
/// Propagates curve combination errors.
pub fn max_profit_loss(positions: &[Position]) -> Result<ProfitBounds> {
    let combined = combined_profit_curve(positions)?;
    if combined.is_empty() {
        return Ok(ProfitBounds::default());
    }

    let mut max_profit = f64::NEG_INFINITY;
    let mut max_loss = f64::INFINITY;
    for &profit in &combined.profits {
        max_profit = max_profit.max(profit);
        max_loss = max_loss.min(profit);
    }

    Ok(ProfitBounds {
        max_profit,
        max_loss,
    })
}

/// Breakeven spots of the combined curve by linear interpolation.
///
/// Scans consecutive grid pairs `(a, b)` for a sign straddle, including
/// exact zero at either end:
/// ```text
/// crossing when (a <= 0 && b >= 0) || (a >= 0 && b <= 0)
/// breakeven = spot_i + (0 - a) / (b - a) * (spot_j - spot_i)
/// ```
/// An exact zero at an interior grid point fires both adjacent pairs and
/// appears twice; duplicates are kept so a tangent touch is visible to
/// the caller. A flat zero segment yields its left endpoint. Output
/// ascends because the grid ascends.
///
/// # Errors
/// Propagates curve combination errors.
pub fn find_breakevens(positions: &[Position]) -> Result<Vec<f64>> {
    let combined = combined_profit_curve(positions)?;
    let spots = &combined.spot_prices;
    let profits = &combined.profits;

    let mut breakevens = Vec::new();
    for i in 0..profits.len().saturating_sub(1) {
        let a = profits[i];
        let b = profits[i + 1];
        if (a <= 0.0 && b >= 0.0) || (a >= 0.0 && b <= 0.0) {
            // The straddle test only passes with a == b when both are
            // exactly zero; interpolating would divide zero by zero.
            if a == b {
                breakevens.push(spots[i]);
            } else {
                breakevens.push(spots[i] + (0.0 - a) / (b - a) * (spots[i + 1] - spots[i]));
            }
        }
    }

    Ok(breakevens)
}

/// Net premium cash flow of the strategy.
///
/// Long legs pay a debit, short legs collect a credit:
/// ```text
/// net = sum over legs of sign(side) * premium
/// where sign(long) = -1, sign(short) = +1
/// ```
#[must_use]
pub fn net_premium(positions: &[Position]) -> f64 {
    positions
        .iter()
        .map(|position| position.side.premium_sign() * position.premium)
        .sum()
}

/// Computes every strategy-level metric in one call.
///
/// # Errors
/// Propagates curve combination errors.
pub fn strategy_metrics(positions: &[Position]) -> Result<StrategyMetrics> {
    Ok(StrategyMetrics {
        greeks: aggregate_greeks(positions),
        bounds: max_profit_loss(positions)?,
        breakevens: find_breakevens(positions)?,
        net_premium: net_premium(positions),
    })
}
