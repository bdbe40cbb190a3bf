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
    pub allowed_origin: String,
    pub openai_api_key: Option<String>,
    pub chat_model: String,
    pub classify_model: String,
    pub title_model: String,
    pub auth_base_url: String,
    pub auth_api_key: Option<String>,
    /// Emails granted the admin role when first seen.
    pub admin_emails: Vec<String>,
    /// Chat request budget per user per window.
    pub chat_rate_limit: u32,
    pub chat_rate_window_ms: i64,
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
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let allowed_origin = std::env::var("ALLOWED_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        // --- Load API Keys and Provider Settings ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();

        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let classify_model =
            std::env::var("CLASSIFY_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let title_model =
            std::env::var("TITLE_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let auth_base_url = std::env::var("AUTH_BASE_URL")
            .map_err(|_| ConfigError::MissingVar("AUTH_BASE_URL".to_string()))?;
        let auth_api_key = std::env::var("AUTH_API_KEY").ok();

        let admin_emails = std::env::var("ADMIN_EMAILS")
            .map(|raw| {
                raw.split(',')
                    .map(|e| e.trim().to_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        // --- Load Rate-Limit Settings ---
        let chat_rate_limit = match std::env::var("CHAT_RATE_LIMIT") {
            Ok(raw) => raw.parse::<u32>().map_err(|e| {
                ConfigError::InvalidValue("CHAT_RATE_LIMIT".to_string(), e.to_string())
            })?,
            Err(_) => 10,
        };
        let chat_rate_window_ms = match std::env::var("CHAT_RATE_WINDOW_MS") {
            Ok(raw) => raw.parse::<i64>().map_err(|e| {
                ConfigError::InvalidValue("CHAT_RATE_WINDOW_MS".to_string(), e.to_string())
            })?,
            Err(_) => 60_000,
        };

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            allowed_origin,
            openai_api_key,
            chat_model,
            classify_model,
            title_model,
            auth_base_url,
            auth_api_key,
            admin_emails,
            chat_rate_limit,
            chat_rate_window_ms,
        })
    }

    /// Whether an identity email belongs to the configured admin allow-list.
    pub fn is_admin_email(&self, email: Option<&str>) -> bool {
        match email {
            Some(email) => self.admin_emails.contains(&email.to_lowercase()),
            None => false,
        }
    }
}
