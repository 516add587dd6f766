//! Lobby service interface and wire types.

use std::time::Duration;

use async_trait::async_trait;
use bingo_core::LobbyDirectory;
use serde::{Deserialize, Serialize};

use crate::ApiError;

/// Default lobby service address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default buy-in attached to join requests, in coins.
pub const DEFAULT_BUY_IN: u64 = 1000;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base URL, without a trailing slash.
    pub base_url: String,
    /// Whole-request timeout.
    pub request_timeout: Duration,
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Body of a join request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Joining player.
    pub alien_id: String,
    /// Coins staked.
    pub buy_in_amount: u64,
    /// Target lobby.
    pub lobby_id: String,
}

/// Service acknowledgement of a join. The game service owns its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinReceipt(pub serde_json::Value);

/// Service health probe reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `"healthy"` when the service is up.
    pub status: String,
    /// Whether the service reaches its backing store.
    #[serde(default)]
    pub redis_connected: bool,
    /// Server time, ISO 8601.
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Lobby service operations used by the client.
///
/// Production uses [`crate::HttpLobbyApi`]; tests substitute scripted
/// implementations with controllable latency and outcomes.
#[async_trait]
pub trait LobbyApi: Send + Sync + 'static {
    /// Fetch the current lobby directory.
    ///
    /// Any failure (transport, status, decoding, validation) is an `Err`; the
    /// caller keeps its previous directory.
    async fn list_lobbies(&self, token: &str) -> Result<LobbyDirectory, ApiError>;

    /// Ask the service to seat the player in a lobby.
    async fn join_lobby(&self, token: &str, request: &JoinRequest) -> Result<JoinReceipt, ApiError>;
}

/// Pull the human-readable reason out of an error body.
///
/// The service reports errors as `{"detail": "..."}`; anything else is passed
/// through trimmed, or replaced by a placeholder when empty.
pub fn error_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: serde_json::Value,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { detail: serde_json::Value::String(detail) }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if body.trim().is_empty() => "no details".to_owned(),
        Err(_) => body.trim().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_string_is_extracted() {
        assert_eq!(error_detail(r#"{"detail":"Invalid token"}"#), "Invalid token");
    }

    #[test]
    fn structured_detail_is_rendered_as_json() {
        assert_eq!(error_detail(r#"{"detail":[{"loc":["body"]}]}"#), r#"[{"loc":["body"]}]"#);
    }

    #[test]
    fn plain_bodies_pass_through() {
        assert_eq!(error_detail("  Bad Gateway\n"), "Bad Gateway");
        assert_eq!(error_detail(""), "no details");
    }

    #[test]
    fn join_request_wire_names() {
        let request =
            JoinRequest { alien_id: "p".into(), buy_in_amount: DEFAULT_BUY_IN, lobby_id: "l".into() };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"alien_id": "p", "buy_in_amount": 1000, "lobby_id": "l"})
        );
    }

    #[test]
    fn health_tolerates_missing_fields() {
        let health: HealthStatus = serde_json::from_str(r#"{"status":"healthy"}"#).unwrap();
        assert_eq!(health.status, "healthy");
        assert!(!health.redis_connected);
        assert!(health.timestamp.is_none());
    }
}
