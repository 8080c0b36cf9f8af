//! Computation gateway integration for the options terminal.
//!
//! This crate provides:
//! - REST client for the local pricing gateway's tool-call endpoint
//! - Typed payloads for chains, Greeks, distributions, payoffs, and history
//! - Response shape checks so malformed payloads fail loudly at the boundary
//!
//! # Example
//!
//! ```ignore
//! use options_terminal_gateway::{GatewayClient, GatewayClientConfig, PayoffRequest};
//! use options_terminal_core::{OptionSide, OptionType};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = GatewayClient::new(GatewayClientConfig::default())?;
//!
//!     // Discover expirations, then pull one chain
//!     let listing = client.expirations("AAPL").await?;
//!     let chain = client.option_chain("AAPL", &listing.expirations[0]).await?;
//!     println!("spot {} with {} calls", chain.spot, chain.calls.len());
//!
//!     // Price a covered-call leg over a spot grid
//!     let request = PayoffRequest::new(
//!         OptionSide::Short,
//!         OptionType::Call,
//!         "AAPL",
//!         chain.spot.round(),
//!         &listing.expirations[0],
//!     );
//!     let profile = client.payoff_profile(&request).await?;
//!     println!("{} grid points", profile.spot_prices.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Wire Protocol
//!
//! Every market data operation goes through a single endpoint:
//!
//! - `POST /api/mcp/call-tool` with `{"tool": ..., "arguments": {...}}`
//! - `GET /api/health` - Gateway liveness and registered tools
//!
//! Tool responses arrive wrapped in a `{success, data, error}` envelope.
//! The client maps each outcome onto the [`GatewayError`] taxonomy, so
//! callers only ever see typed payloads or typed failures.
//!
//! # Registered Tools
//!
//! - `get_expirations` - Expiration dates for an underlying
//! - `get_chain` - Full option chain for one expiration
//! - `compute_greeks` - Per-contract Greeks for one expiration
//! - `get_distribution` - Risk-neutral distribution implied by quotes
//! - `compute_payoff_profile` - One leg's expiry payoff over a spot grid
//! - `get_historical_prices` - OHLCV history for an underlying

pub mod client;
pub mod error;
pub mod types;

// Re-export main types for convenience
pub use client::{GatewayClient, GatewayClientConfig, DEFAULT_GATEWAY_URL};
pub use error::{GatewayError, Result};
pub use types::{
    ContractQuote, DistributionBin, ExpirationList, GreeksChain, HealthStatus, HistoricalBar,
    HistoricalPrices, ImpliedDistribution, OptionChain, PayoffProfile, PayoffRequest,
};

#[cfg(test)]
mod tests {
    use super::*;
    use options_terminal_core::{OptionSide, OptionType};

    #[test]
    fn test_public_api_exports() {
        let _ = GatewayClientConfig::default();
        let request =
            PayoffRequest::new(OptionSide::Long, OptionType::Call, "AAPL", 150.0, "2025-01-17");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_error_types_accessible() {
        let err = GatewayError::api(400, "bad request");
        assert!(err.to_string().contains("400"));
    }

    #[test]
    fn test_constants_accessible() {
        assert!(DEFAULT_GATEWAY_URL.starts_with("http://"));
    }
}
