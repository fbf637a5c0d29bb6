use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Unset means the in-memory store.
    pub database_url: Option<String>,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub store_timeout: Duration,
    pub frontend_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            store_timeout: Duration::from_secs(
                std::env::var("STORE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse::<u64>()
                    .context("STORE_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            frontend_url: optional_env("FRONTEND_URL"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
