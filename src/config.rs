use std::{env, net::SocketAddr};

use thiserror::Error;
use tracing::warn;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub username: String,
    pub api_token: String,
    pub bind_addr: String,
    pub bind_port: u16,
    pub mcp_api_token: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("CONFLUENCE_BASE_URL is required and must not be empty")]
    MissingBaseUrl,
    #[error("CONFLUENCE_USERNAME is required and must not be empty")]
    MissingUsername,
    #[error("CONFLUENCE_API_TOKEN is required and must not be empty")]
    MissingApiToken,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an injectable variable lookup, so tests
    /// do not have to mutate process-wide environment state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = require(&lookup, "CONFLUENCE_BASE_URL", ConfigError::MissingBaseUrl)?;
        let username = require(&lookup, "CONFLUENCE_USERNAME", ConfigError::MissingUsername)?;
        let api_token = require(&lookup, "CONFLUENCE_API_TOKEN", ConfigError::MissingApiToken)?;

        let bind_addr = lookup("BIND_ADDR")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        // An unparseable PORT falls back to the default instead of aborting.
        let bind_port = lookup("PORT")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .and_then(|value| match value.parse::<u16>() {
                Ok(port) => Some(port),
                Err(_) => {
                    warn!(port = %value, "invalid PORT value, using default");
                    None
                }
            })
            .unwrap_or(DEFAULT_PORT);

        let mcp_api_token = lookup("MCP_API_TOKEN")
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        let config = Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            api_token,
            bind_addr,
            bind_port,
            mcp_api_token,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

fn require(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    missing: ConfigError,
) -> Result<String, ConfigError> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(missing)
}
