//! Error types for the computation gateway client.
//!
//! Provides typed errors for transport failures, envelope-level tool
//! failures, and schema violations in returned payloads.

use thiserror::Error;

/// Errors that can occur when talking to the computation gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request reached the gateway but came back non-2xx.
    #[error("gateway HTTP error: {status_code} - {message}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// The `detail` field of the error body when present, raw body text otherwise.
        message: String,
    },

    /// The tool-call envelope reported `success: false`.
    #[error("tool call failed: {0}")]
    Tool(String),

    /// The envelope reported success but carried no data payload.
    #[error("empty response from tool: {tool}")]
    EmptyResponse {
        /// Tool that produced the empty envelope.
        tool: String,
    },

    /// Payload deserialized but failed a shape check.
    #[error("schema violation from {tool}: {reason}")]
    Schema {
        /// Tool whose payload was rejected.
        tool: String,
        /// What the check found.
        reason: String,
    },

    /// Request parameters rejected before any network call.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Request timeout.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl GatewayError {
    /// Creates an API error from status code and message.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Creates an empty response error.
    pub fn empty_response(tool: impl Into<String>) -> Self {
        Self::EmptyResponse { tool: tool.into() }
    }

    /// Creates a schema violation error.
    pub fn schema(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Schema {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if retrying the same call later could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Api { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
