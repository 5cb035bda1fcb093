//! HTTP client for the building-energy-model calculate endpoint.
//!
//! Configured from the environment:
//!
//! - `PATHWAYS_API_KEY` (required) is sent as the `X-API-Key` header.
//! - `PATHWAYS_API_URL` overrides [`DEFAULT_API_URL`].
//!
//! Each call is a single POST. Failures surface as [`EngineError`] so that
//! batch callers can record them per query.

use async_trait::async_trait;
use pathways_engine_models::{BuildingQuery, EngineResponse};

use crate::{EmissionsEngine, EngineError};

/// Public calculate endpoint.
pub const DEFAULT_API_URL: &str = "https://ei.palmetto.com/api/v0/bem/calculate";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "PATHWAYS_API_KEY";

/// Environment variable overriding the endpoint URL.
pub const API_URL_ENV: &str = "PATHWAYS_API_URL";

/// Maximum number of characters of an error body kept in [`EngineError::Status`].
const BODY_PREVIEW_LEN: usize = 500;

/// Endpoint and credentials for [`BemClient`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Calculate endpoint URL.
    pub api_url: String,
    /// API key.
    pub api_key: String,
}

impl EngineConfig {
    /// Reads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if `PATHWAYS_API_KEY` is unset or
    /// empty.
    pub fn from_env() -> Result<Self, EngineError> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| EngineError::Config {
                message: format!("{API_KEY_ENV} environment variable not set"),
            })?;
        let api_url = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Ok(Self { api_url, api_key })
    }
}

/// [`EmissionsEngine`] backed by the HTTP calculate endpoint.
pub struct BemClient {
    config: EngineConfig,
    client: reqwest::Client,
}

impl BemClient {
    /// Creates a client with a default `reqwest` client.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Creates a client reusing an existing `reqwest` client.
    #[must_use]
    pub fn with_client(config: EngineConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Creates a client configured from the environment.
    ///
    /// # Errors
    ///
    /// See [`EngineConfig::from_env`].
    pub fn from_env() -> Result<Self, EngineError> {
        Ok(Self::new(EngineConfig::from_env()?))
    }
}

#[async_trait]
impl EmissionsEngine for BemClient {
    async fn calculate(&self, query: &BuildingQuery) -> Result<EngineResponse, EngineError> {
        let request = query.to_request();
        log::debug!(
            "POST {} ({} .. {})",
            self.config.api_url,
            request.parameters.from_datetime,
            request.parameters.to_datetime
        );

        let resp = self
            .client
            .post(&self.config.api_url)
            .header("accept", "application/json")
            .header("content-type", "application/json")
            .header("X-API-Key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        parse_response(status, &body)
    }
}

/// Interprets a calculate response.
fn parse_response(status: reqwest::StatusCode, body: &str) -> Result<EngineResponse, EngineError> {
    if !status.is_success() {
        log::warn!("Engine call failed with HTTP {status}");
        return Err(EngineError::Status {
            status: status.as_u16(),
            body: preview(body),
        });
    }

    serde_json::from_str(body).map_err(|e| {
        log::error!(
            "Engine response is not valid JSON: {e}\n  \
             received: {} bytes\n  \
             body preview: {}",
            body.len(),
            preview(body)
        );
        EngineError::Json(e)
    })
}

fn preview(body: &str) -> String {
    if body.chars().count() > BODY_PREVIEW_LEN {
        let head: String = body.chars().take(BODY_PREVIEW_LEN).collect();
        format!("{head}...")
    } else {
        body.to_string()
    }
}
