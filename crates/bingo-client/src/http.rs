//! HTTP implementation of [`LobbyApi`].
//!
//! A thin layer over reqwest: it attaches the bearer token, maps statuses and
//! bodies onto [`ApiError`], and validates listings before handing them on.
//! Scheduling and retry live in the synchronizer, not here.

use async_trait::async_trait;
use bingo_core::{LobbyDirectory, LobbyListing};
use reqwest::Response;

use crate::{
    ApiError,
    api::{ClientConfig, HealthStatus, JoinReceipt, JoinRequest, LobbyApi, error_detail},
};

/// Lobby service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpLobbyApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpLobbyApi {
    /// Build a client from configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            return Err(ApiError::Configuration("base url must not be empty".into()));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ApiError::Configuration(format!("base url {base_url} is not http(s)")));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Configuration(e.to_string()))?;

        Ok(Self { base_url, http })
    }

    /// Service base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probe the service's health endpoint. Unauthenticated.
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let response = self.http.get(format!("{}/health", self.base_url)).send().await?;
        let body = success_body(response).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Read the body of a 2xx response, or turn the response into an error.
async fn success_body(response: Response) -> Result<Vec<u8>, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Status { status: status.as_u16(), message: error_detail(&body) });
    }
    Ok(response.bytes().await?.to_vec())
}

#[async_trait]
impl LobbyApi for HttpLobbyApi {
    async fn list_lobbies(&self, token: &str) -> Result<LobbyDirectory, ApiError> {
        let response = self
            .http
            .get(format!("{}/api/lobbies", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;

        let body = success_body(response).await?;
        let listing: LobbyListing = serde_json::from_slice(&body)?;
        tracing::trace!(count = listing.lobbies.len(), "lobby listing received");
        Ok(LobbyDirectory::from_listing(listing)?)
    }

    async fn join_lobby(&self, token: &str, request: &JoinRequest) -> Result<JoinReceipt, ApiError> {
        let body = serde_json::to_vec(request)?;
        let response = self
            .http
            .post(format!("{}/api/game/join", self.base_url))
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let body = success_body(response).await?;
        Ok(JoinReceipt(serde_json::from_slice(&body)?))
    }
}
