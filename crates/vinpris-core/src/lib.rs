use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

mod app_config;
mod config;
pub mod pricing;
mod product;
mod sort;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use pricing::{derive_prices, DerivedPrices};
pub use product::ProductCandidate;
pub use sort::{SortKey, SortKeyParseError, SortOrder};
