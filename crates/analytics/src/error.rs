//! Error types for strategy aggregation.

use thiserror::Error;

/// Errors from combining per-leg payoff curves.
///
/// Both variants mean a leg's stored curve violates the shared-grid
/// precondition every multi-leg computation relies on. They indicate a
/// bug upstream (a leg priced over a different grid slipped into the
/// strategy), so callers surface them rather than papering over.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A leg's payoff grid does not match the first leg's grid.
    #[error("payoff grid of leg {index} does not match the first leg's grid")]
    MisalignedPayoffGrid {
        /// Zero-based index of the offending leg.
        index: usize,
    },

    /// A leg's curve has mismatched spot/profit lengths.
    #[error("leg {index} has a malformed curve: {spots} spot prices vs {profits} profits")]
    MalformedCurve {
        /// Zero-based index of the offending leg.
        index: usize,
        /// Number of spot grid points in the leg's curve.
        spots: usize,
        /// Number of profit values in the leg's curve.
        profits: usize,
    },
}

/// Result type for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
