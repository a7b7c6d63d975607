//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    /// Base URL of the upstream LMS installation.
    pub lms_base_url: String,
    /// Base URL of the content analysis API.
    pub analysis_base_url: String,
    pub lms_username: String,
    pub lms_password: String,
    /// Service name sent with the LMS token exchange.
    pub lms_service: String,
    /// The numeric LMS user whose courses are listed.
    pub lms_user_id: i64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Upstream Settings ---
        let lms_base_url = std::env::var("LMS_BASE_URL")
            .map_err(|_| ConfigError::MissingVar("LMS_BASE_URL".to_string()))?;
        let analysis_base_url = std::env::var("ANALYSIS_BASE_URL")
            .map_err(|_| ConfigError::MissingVar("ANALYSIS_BASE_URL".to_string()))?;

        let lms_username = std::env::var("LMS_USERNAME")
            .map_err(|_| ConfigError::MissingVar("LMS_USERNAME".to_string()))?;
        let lms_password = std::env::var("LMS_PASSWORD")
            .map_err(|_| ConfigError::MissingVar("LMS_PASSWORD".to_string()))?;
        let lms_service =
            std::env::var("LMS_SERVICE").unwrap_or_else(|_| "moodle_mobile_app".to_string());

        let lms_user_id_str = std::env::var("LMS_USER_ID").unwrap_or_else(|_| "2".to_string());
        let lms_user_id = lms_user_id_str.parse::<i64>().map_err(|_| {
            ConfigError::InvalidValue(
                "LMS_USER_ID".to_string(),
                format!("'{}' is not a valid user id", lms_user_id_str),
            )
        })?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            lms_base_url,
            analysis_base_url,
            lms_username,
            lms_password,
            lms_service,
            lms_user_id,
        })
    }
}
