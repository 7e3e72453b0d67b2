//! Confluence REST transport adapter
//!
//! Turns a path plus parameter mapping into an authenticated HTTP call and
//! normalizes every failure into a `RequestError`. Nothing panics or
//! propagates past this boundary; tool handlers only ever see the tagged
//! error value.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Method, StatusCode};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::Config;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const MISSING_CREDENTIALS_MESSAGE: &str =
    "Error: Please set your Confluence username and API token";

/// Immutable Confluence connection settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub base_url: String,
    pub username: String,
    pub api_token: String,
}

impl From<&Config> for Credentials {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            username: config.username.clone(),
            api_token: config.api_token.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestErrorKind {
    MissingCredentials,
    Http,
    Network,
    Decode,
}

/// Uniform error value for upstream failures. `Display` yields the bare
/// message, which handlers return verbatim as tool output.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RequestError {
    pub kind: RequestErrorKind,
    pub message: String,
}

impl RequestError {
    pub fn missing_credentials() -> Self {
        Self {
            kind: RequestErrorKind::MissingCredentials,
            message: MISSING_CREDENTIALS_MESSAGE.to_string(),
        }
    }

    pub fn http(status: StatusCode) -> Self {
        Self {
            kind: RequestErrorKind::Http,
            message: format!("Error making request: HTTP status {status}"),
        }
    }

    pub fn network(detail: impl std::fmt::Display) -> Self {
        Self {
            kind: RequestErrorKind::Network,
            message: format!("Error making request: {detail}"),
        }
    }

    pub fn decode(detail: impl std::fmt::Display) -> Self {
        Self {
            kind: RequestErrorKind::Decode,
            message: format!("Unexpected error: {detail}"),
        }
    }
}

#[async_trait]
pub trait ConfluenceApi: Send + Sync {
    async fn request(
        &self,
        path: &str,
        method: Method,
        params: &Map<String, Value>,
    ) -> Result<Value, RequestError>;
}

#[derive(Debug)]
pub struct HttpConfluenceClient {
    credentials: Credentials,
}

impl HttpConfluenceClient {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl ConfluenceApi for HttpConfluenceClient {
    async fn request(
        &self,
        path: &str,
        method: Method,
        params: &Map<String, Value>,
    ) -> Result<Value, RequestError> {
        if self.credentials.username.is_empty() || self.credentials.api_token.is_empty() {
            return Err(RequestError::missing_credentials());
        }

        // One client per call; the connection is scoped to this request and
        // released on completion either way.
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(RequestError::network)?;

        let url = format!("{}{}", self.credentials.base_url, path);
        let request = if method == Method::GET {
            client.get(&url).query(&query_pairs(params))
        } else {
            client.request(method, &url).json(params)
        };

        let response = request
            .basic_auth(&self.credentials.username, Some(&self.credentials.api_token))
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(RequestError::network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::http(status));
        }

        response.json::<Value>().await.map_err(RequestError::decode)
    }
}

fn query_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(key, value)| {
            let rendered = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            (key.clone(), rendered)
        })
        .collect()
}
