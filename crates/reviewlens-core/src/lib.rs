//! Domain types and configuration shared across the reviewlens workspace.

pub mod app_config;
pub mod config;
pub mod error;
pub mod identifier;
pub mod period;
pub mod provider;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, ErrorKind};
pub use identifier::Identifier;
pub use period::{InvalidPeriod, ReviewPeriod};
pub use provider::{parse_provider_order, ProviderKind};
