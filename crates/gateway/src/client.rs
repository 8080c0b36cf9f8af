//! Computation gateway REST client.
//!
//! All pricing and market data for the terminal flows through a local
//! gateway process. Every tool call goes through a single POST endpoint
//! wrapped in a success/data/error envelope; this client unwraps the
//! envelope into typed payloads and checked errors.
//!
//! # Example
//!
//! ```ignore
//! use options_terminal_gateway::{GatewayClient, GatewayClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = GatewayClient::new(GatewayClientConfig::default())?;
//!
//!     let listing = client.expirations("AAPL").await?;
//!     println!("{} expirations", listing.count);
//!
//!     let chain = client.option_chain("AAPL", &listing.expirations[0]).await?;
//!     println!("spot {}", chain.spot);
//!
//!     Ok(())
//! }
//! ```

use crate::error::{GatewayError, Result};
use crate::types::{
    ExpirationList, GreeksChain, HealthStatus, HistoricalPrices, ImpliedDistribution, OptionChain,
    PayoffProfile, PayoffRequest,
};
use options_terminal_core::GatewayConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

// =============================================================================
// Constants
// =============================================================================

/// Default gateway base URL.
pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:8000";

/// Single endpoint every tool call goes through.
const CALL_TOOL_PATH: &str = "/api/mcp/call-tool";

/// Gateway liveness endpoint.
const HEALTH_PATH: &str = "/api/health";

// Tool names the gateway registers.
const TOOL_EXPIRATIONS: &str = "get_expirations";
const TOOL_CHAIN: &str = "get_chain";
const TOOL_GREEKS: &str = "compute_greeks";
const TOOL_DISTRIBUTION: &str = "get_distribution";
const TOOL_PAYOFF: &str = "compute_payoff_profile";
const TOOL_HISTORICAL: &str = "get_historical_prices";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the gateway client.
#[derive(Debug, Clone)]
pub struct GatewayClientConfig {
    /// Base URL of the gateway process.
    pub base_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GatewayClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl GatewayClientConfig {
    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl From<&GatewayConfig> for GatewayClientConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

// =============================================================================
// Wire envelope
// =============================================================================

/// Request body for the tool-call endpoint.
#[derive(Debug, Serialize)]
struct ToolCallRequest<'a> {
    tool: &'a str,
    arguments: serde_json::Value,
}

/// Envelope around every tool response.
#[derive(Debug, Clone, Deserialize)]
struct ToolCallEnvelope {
    success: bool,
    data: Option<serde_json::Value>,
    error: Option<String>,
}

/// Body shape the gateway serves on HTTP errors.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

// =============================================================================
// GatewayClient
// =============================================================================

/// Computation gateway client.
///
/// Holds one `reqwest` client with a shared timeout. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    config: GatewayClientConfig,
    http: Client,
}

impl GatewayClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: GatewayClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, http })
    }

    /// Creates a client from the application-level gateway section.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        Self::new(config.into())
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Validates an underlying symbol before it is placed in a request body.
    ///
    /// Valid symbols are short and use only the characters market data
    /// vendors put in tickers: alphanumerics, '.', '-', '^', '='.
    fn validate_symbol(symbol: &str) -> Result<&str> {
        if symbol.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "symbol cannot be empty".to_string(),
            ));
        }

        if symbol.len() > 12 {
            return Err(GatewayError::InvalidRequest(format!(
                "symbol exceeds maximum length of 12: {}",
                symbol.len()
            )));
        }

        if !symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
        {
            return Err(GatewayError::InvalidRequest(format!(
                "symbol contains forbidden characters: {symbol}"
            )));
        }

        Ok(symbol)
    }

    /// Posts one tool call and unwraps the success/data/error envelope.
    async fn call_tool<T: serde::de::DeserializeOwned>(
        &self,
        tool: &str,
        arguments: serde_json::Value,
    ) -> Result<T> {
        let url = format!("{}{}", self.config.base_url, CALL_TOOL_PATH);

        tracing::debug!("POST {} tool={}", url, tool);

        let response = self
            .http
            .post(&url)
            .header("Accept", "application/json")
            .json(&ToolCallRequest { tool, arguments })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|body| body.detail)
                .unwrap_or(text);
            return Err(GatewayError::api(status.as_u16(), message));
        }

        let envelope = response.json::<ToolCallEnvelope>().await?;

        if !envelope.success {
            return Err(GatewayError::Tool(
                envelope
                    .error
                    .unwrap_or_else(|| "tool execution failed".to_string()),
            ));
        }

        match envelope.data {
            Some(data) => Ok(serde_json::from_value(data)?),
            None => Err(GatewayError::empty_response(tool)),
        }
    }

    // =========================================================================
    // Market Data Operations
    // =========================================================================

    /// Lists available expiration dates for an underlying.
    ///
    /// # Errors
    /// Returns an error if the call fails.
    pub async fn expirations(&self, underlying: &str) -> Result<ExpirationList> {
        let underlying = Self::validate_symbol(underlying)?;
        self.call_tool(TOOL_EXPIRATIONS, json!({ "underlying": underlying }))
            .await
    }

    /// Fetches the full option chain for one expiration.
    ///
    /// # Errors
    /// Returns an error if the call fails or the chain fails its shape check.
    pub async fn option_chain(&self, underlying: &str, expiration: &str) -> Result<OptionChain> {
        let underlying = Self::validate_symbol(underlying)?;
        let chain: OptionChain = self
            .call_tool(
                TOOL_CHAIN,
                json!({ "underlying": underlying, "expiration": expiration }),
            )
            .await?;

        chain
            .validate()
            .map_err(|reason| GatewayError::schema(TOOL_CHAIN, reason))?;
        Ok(chain)
    }

    /// Computes per-contract Greeks for every strike in one expiration.
    ///
    /// # Errors
    /// Returns an error if the call fails.
    pub async fn greeks(&self, underlying: &str, expiration: &str) -> Result<GreeksChain> {
        let underlying = Self::validate_symbol(underlying)?;
        self.call_tool(
            TOOL_GREEKS,
            json!({ "underlying": underlying, "expiration": expiration }),
        )
        .await
    }

    /// Fetches the risk-neutral distribution implied by one expiration's quotes.
    ///
    /// `None` moneyness bounds are omitted from the wire and the gateway
    /// applies its defaults (0.7 / 1.3).
    ///
    /// # Errors
    /// Returns an error if the call fails or the payload fails its shape check.
    pub async fn implied_distribution(
        &self,
        underlying: &str,
        expiration: &str,
        min_moneyness: Option<f64>,
        max_moneyness: Option<f64>,
    ) -> Result<ImpliedDistribution> {
        let underlying = Self::validate_symbol(underlying)?;

        let mut arguments = json!({ "underlying": underlying, "expiration": expiration });
        if let Some(min) = min_moneyness {
            arguments["min_moneyness"] = json!(min);
        }
        if let Some(max) = max_moneyness {
            arguments["max_moneyness"] = json!(max);
        }

        let distribution: ImpliedDistribution =
            self.call_tool(TOOL_DISTRIBUTION, arguments).await?;

        distribution
            .validate()
            .map_err(|reason| GatewayError::schema(TOOL_DISTRIBUTION, reason))?;
        Ok(distribution)
    }

    /// Prices one leg's expiry payoff over a spot grid.
    ///
    /// # Errors
    /// Returns an error if the request is invalid, the call fails, or the
    /// profile fails its shape check.
    pub async fn payoff_profile(&self, request: &PayoffRequest) -> Result<PayoffProfile> {
        Self::validate_symbol(&request.underlying)?;
        request.validate().map_err(GatewayError::InvalidRequest)?;

        let profile: PayoffProfile = self
            .call_tool(TOOL_PAYOFF, serde_json::to_value(request)?)
            .await?;

        profile
            .validate()
            .map_err(|reason| GatewayError::schema(TOOL_PAYOFF, reason))?;
        Ok(profile)
    }

    /// Fetches OHLCV history for an underlying.
    ///
    /// `None` period/interval are omitted from the wire and the gateway
    /// applies its defaults ("3mo" / "1d").
    ///
    /// # Errors
    /// Returns an error if the call fails.
    pub async fn historical_prices(
        &self,
        underlying: &str,
        period: Option<&str>,
        interval: Option<&str>,
    ) -> Result<HistoricalPrices> {
        let underlying = Self::validate_symbol(underlying)?;

        let mut arguments = json!({ "underlying": underlying });
        if let Some(period) = period {
            arguments["period"] = json!(period);
        }
        if let Some(interval) = interval {
            arguments["interval"] = json!(interval);
        }

        self.call_tool(TOOL_HISTORICAL, arguments).await
    }

    // =========================================================================
    // Liveness
    // =========================================================================

    /// Checks gateway liveness and lists the tools it has registered.
    ///
    /// # Errors
    /// Returns an error if the gateway is unreachable or unhealthy.
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = format!("{}{}", self.config.base_url, HEALTH_PATH);

        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::api(status.as_u16(), text));
        }

        Ok(response.json::<HealthStatus>().await?)
    }
}
