//! Configuration for the broker.
//!
//! Everything is resolved from environment variables once at startup (after
//! `.env` is loaded) and handed to the components that need it.

mod api;
mod database;
pub(crate) mod helpers;
mod plans;
mod runtime;

pub use api::ApiConfig;
pub use database::{DatabaseConfig, default_database_path};
pub use plans::{Plan, PlanCatalog};
pub use runtime::{RuntimeConfig, RuntimeOptions, parse_runtime_options};

use crate::error::ConfigError;

/// Main configuration for the broker.
#[derive(Debug, Clone)]
pub struct Config {
    pub runtime: RuntimeConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub plans: PlanCatalog,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            runtime: RuntimeConfig::resolve()?,
            database: DatabaseConfig::resolve()?,
            api: ApiConfig::resolve()?,
            plans: PlanCatalog::resolve()?,
        })
    }
}
