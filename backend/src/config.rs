//! Application configuration loaded from environment variables.

use std::env;

use crate::error::{AppError, Result};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,

    /// Maximum database connections in the pool
    pub db_max_connections: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| AppError::Config("DATABASE_URL not set".into()))?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        })
    }
}
