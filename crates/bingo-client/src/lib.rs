//! Lobby service client
//!
//! The network edge of the bingo client: the [`LobbyApi`] trait the
//! synchronizer and join flow call through, its wire types, and (with the
//! default `http` feature) the reqwest-backed [`HttpLobbyApi`].
//!
//! # Endpoints
//!
//! - `GET /api/lobbies`: lobby directory, bearer-authenticated
//! - `POST /api/game/join`: seat the player in a lobby, bearer-authenticated
//! - `GET /health`: service health, unauthenticated

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod api;
mod error;

#[cfg(feature = "http")]
mod http;

pub use api::{
    ClientConfig, DEFAULT_BASE_URL, DEFAULT_BUY_IN, HealthStatus, JoinReceipt, JoinRequest, LobbyApi,
    error_detail,
};
pub use error::ApiError;
#[cfg(feature = "http")]
pub use http::HttpLobbyApi;
