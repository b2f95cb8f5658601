//! Environment-derived configuration for the CLI.
//!
//! The library itself takes the base URL and access token as parameters;
//! token lifecycle (refresh, expiry) belongs to whoever supplies it.

use thiserror::Error;

/// Fallback agent API base URL when `TAKEOFF_API_BASE_URL` is unset.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TAKEOFF_ACCESS_TOKEN is not set; export a bearer token for the agent API")]
    MissingAccessToken,
}

/// Runtime configuration read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the agent API, e.g. `http://localhost:3000/api`.
    pub api_base_url: String,
    /// Bearer token for the agent API, if present.
    pub access_token: Option<String>,
}

impl Config {
    /// Read configuration from `TAKEOFF_API_BASE_URL` and `TAKEOFF_ACCESS_TOKEN`.
    pub fn from_env() -> Self {
        let api_base_url = std::env::var("TAKEOFF_API_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let access_token = std::env::var("TAKEOFF_ACCESS_TOKEN")
            .ok()
            .filter(|v| !v.trim().is_empty());
        Self {
            api_base_url,
            access_token,
        }
    }

    /// Return the access token or fail with a configuration error.
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.access_token
            .as_deref()
            .ok_or(ConfigError::MissingAccessToken)
    }
}
