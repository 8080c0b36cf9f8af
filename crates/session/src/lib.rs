//! Session state store for the options terminal.
//!
//! This crate provides:
//! - A single shared state struct with pure, unit-testable transitions
//! - Async actions wrapping every gateway fetch in a uniform protocol
//! - Stale-response protection via per-resource generation counters
//! - State snapshots over a watch channel for reactive consumers
//!
//! # Example
//!
//! ```ignore
//! use options_terminal_core::SessionConfig;
//! use options_terminal_gateway::{GatewayClient, GatewayClientConfig};
//! use options_terminal_session::{PositionRequest, SessionStore};
//! use options_terminal_core::{OptionSide, OptionType};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let gateway = GatewayClient::new(GatewayClientConfig::default())?;
//!     let store = Arc::new(SessionStore::new(gateway, SessionConfig::default()));
//!
//!     // Populate the session and build a covered call
//!     store.fetch_expirations().await;
//!     store.fetch_chain().await;
//!     store
//!         .add_position(PositionRequest {
//!             side: OptionSide::Short,
//!             option_type: OptionType::Call,
//!             strike: 155.0,
//!             premium: 2.35,
//!         })
//!         .await;
//!
//!     let state = store.state().await;
//!     if let Some(metrics) = &state.metrics {
//!         println!("net delta {:.3}", metrics.greeks.delta);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Concurrency Model
//!
//! State lives behind one `tokio::sync::RwLock`, and the lock is never
//! held across a gateway call. Actions mark their resource loading, await
//! the gateway, then merge under the lock. Each cached resource carries a
//! generation counter: selection changes and newer fetches bump it, and a
//! response whose generation is no longer current is discarded whole,
//! lowering its loading flag unless a newer fetch owns the flag now.
//! Failures are recorded in `last_error` rather than returned; consumers
//! observe everything through snapshots.

pub mod state;
pub mod store;

// Re-export main types for convenience
pub use state::{LoadingFlags, ResourceKind, SessionState};
pub use store::{PositionRequest, SessionStore};
