use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub default_underlying: String,
    pub spot_range_lower: f64,
    pub spot_range_upper: f64,
    pub fallback_spot: f64,
    pub min_moneyness: f64,
    pub max_moneyness: f64,
    pub historical_period: String,
    pub historical_interval: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_underlying: "AAPL".to_string(),
            spot_range_lower: 0.5,
            spot_range_upper: 1.5,
            fallback_spot: 100.0,
            min_moneyness: 0.7,
            max_moneyness: 1.3,
            historical_period: "3mo".to_string(),
            historical_interval: "1d".to_string(),
        }
    }
}
