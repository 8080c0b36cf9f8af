pub mod config;
pub mod config_loader;
pub mod types;

pub use config::{AppConfig, GatewayConfig, SessionConfig};
pub use config_loader::ConfigLoader;
pub use types::{GreeksRecord, OptionSide, OptionType, PayoffCurve, Position};
