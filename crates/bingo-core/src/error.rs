//! Error types for the bingo client core.
//!
//! Two families: claim decoding failures, which the identity resolver
//! swallows (the player id is simply dropped), and lobby validation failures,
//! which turn an otherwise well-formed listing into a fetch failure so the
//! previous directory survives.

use thiserror::Error;

/// Reasons a bearer token's payload did not yield a player id.
#[derive(Error, Debug)]
pub enum ClaimsError {
    /// Token has fewer than two dot-separated segments.
    #[error("token has no payload segment")]
    MissingPayload,

    /// Payload segment is not base64 in either alphabet.
    #[error("payload is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// Payload bytes are not a JSON document.
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload has no non-empty string `sub` claim.
    #[error("payload has no usable `sub` claim")]
    MissingSubject,
}

/// A listing that decoded but violates directory invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LobbyValidationError {
    /// `player_count` exceeds `max_players`.
    #[error("lobby {lobby_id} reports {player_count} players but holds {max_players}")]
    OverCapacity {
        /// Offending lobby.
        lobby_id: String,
        /// Reported player count.
        player_count: u32,
        /// Reported capacity.
        max_players: u32,
    },

    /// The same lobby id appears twice in one listing.
    #[error("lobby {lobby_id} listed more than once")]
    DuplicateId {
        /// Repeated lobby id.
        lobby_id: String,
    },
}
