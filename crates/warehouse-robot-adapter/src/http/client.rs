/*
[INPUT]:  HTTP configuration (base URL, timeouts)
[OUTPUT]: Configured reqwest client ready for engine calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::http::{Result, RobotError};
use crate::types::ErrorResponse;

/// Default engine location; all task routes live under `/api/`.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the robot task engine
#[derive(Debug, Clone)]
pub struct WarehouseClient {
    http_client: Client,
    base_url: Url,
}

impl WarehouseClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::with_config_and_base_url(config, DEFAULT_BASE_URL)
    }

    /// Create a client against an explicit engine base URL.
    ///
    /// Used by tests to point at a wiremock server.
    pub fn with_config_and_base_url(config: ClientConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: normalize_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build full URL from path segments; each segment is percent-encoded.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RobotError::Config(format!("base URL cannot hold a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build request builder for an engine endpoint
    pub(crate) fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.endpoint(segments)?;
        Ok(self.http_client.request(method, url))
    }

    /// Send a request; only transport failures are errors here.
    pub(crate) async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        tracing::debug!(
            url = %response.url(),
            status = response.status().as_u16(),
            "engine response"
        );
        Ok(response)
    }

    /// Decode a success body
    pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(RobotError::InvalidResponse("empty response body".to_string()));
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Read the engine's error envelope from a non-success response
    pub(crate) async fn read_error(response: Response) -> (StatusCode, ErrorResponse) {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        (status, ErrorResponse::from_body(&body))
    }
}

fn normalize_base_url(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash)?;
    if url.cannot_be_a_base() {
        return Err(RobotError::Config(format!("base URL cannot hold a path: {url}")));
    }
    Ok(url)
}
