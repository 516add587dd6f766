//! Lobby service errors.

use bingo_core::LobbyValidationError;
use thiserror::Error;

/// Errors returned by [`crate::LobbyApi`] implementations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Client could not be constructed from its configuration.
    #[error("lobby service configuration error: {0}")]
    Configuration(String),

    /// Request never produced a response (DNS, connect, timeout, reset).
    #[error("lobby service unreachable: {0}")]
    Transport(String),

    /// Service answered with a non-2xx status.
    #[error("lobby service error ({status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// `detail` from the error body, or the raw body.
        message: String,
    },

    /// Response body did not match the expected shape.
    #[error("lobby service sent an unreadable response: {0}")]
    Decode(String),

    /// Listing decoded but breaks directory invariants.
    #[error("lobby service sent an invalid directory: {0}")]
    InvalidDirectory(#[from] LobbyValidationError),
}

impl ApiError {
    /// Returns true if the same request may succeed later unchanged.
    ///
    /// Polling retries every error regardless; this only informs logging and
    /// the join flow.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Configuration(_) | Self::Decode(_) | Self::InvalidDirectory(_) => false,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}
