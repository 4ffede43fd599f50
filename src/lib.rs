//! Wardbook core library
//!
//! This module exports the core functionality of the ward management service:
//! medication administration, prescription handling, patient timelines and
//! ward inventory.

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod error;
pub mod models;

pub use crate::core::WardService;
pub use error::{Result, WardError};

/// Application configuration
pub mod config {
    use serde::Deserialize;

    #[derive(Debug, Clone, Deserialize)]
    pub struct Config {
        pub server: ServerConfig,
        pub database: DatabaseConfig,
        #[serde(default)]
        pub ward: WardConfig,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ServerConfig {
        pub host: String,
        pub port: u16,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct DatabaseConfig {
        pub url: String,
        #[serde(default = "default_max_connections")]
        pub max_connections: u32,
    }

    /// Business thresholds used by the ward procedures.
    #[derive(Debug, Clone, Deserialize, PartialEq)]
    #[serde(default)]
    pub struct WardConfig {
        /// Medications with a schedule above this tier need an approved prescription.
        pub schedule_threshold: i64,
        pub low_stock_threshold: i64,
        pub expiry_warning_days: i64,
    }

    impl Default for WardConfig {
        fn default() -> Self {
            Self {
                schedule_threshold: 4,
                low_stock_threshold: 10,
                expiry_warning_days: 30,
            }
        }
    }

    fn default_max_connections() -> u32 {
        5
    }

    /// Load configuration from file
    pub fn load_config() -> Result<Config, config::ConfigError> {
        let env = std::env::var("WARD_ENV").unwrap_or_else(|_| "development".into());

        config::Config::builder()
            // Start with default settings
            .add_source(config::File::with_name("config/default"))
            // Override with environment-specific settings
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            // Override with environment variables, e.g. WARD_DATABASE__URL
            .add_source(config::Environment::with_prefix("WARD").separator("__"))
            .build()?
            .try_deserialize()
    }
}
