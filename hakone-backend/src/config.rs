use crate::error::{AppError, Result};
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_address: String,
    pub max_request_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://hakone.db?mode=rwc".to_string()),

            server_address: env::var("SERVER_ADDRESS")
                .unwrap_or_else(|_| "127.0.0.1:3000".to_string()),

            max_request_body_bytes: env::var("MAX_REQUEST_BODY_BYTES")
                .unwrap_or_else(|_| "65536".to_string()) // Default 64KB
                .parse::<usize>()
                .map_err(|_| AppError::ConfigError("Invalid MAX_REQUEST_BODY_BYTES".to_string()))?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "sqlite::memory:".to_string(),
            server_address: "127.0.0.1:3000".to_string(),
            max_request_body_bytes: 64 * 1024,
        }
    }
}
