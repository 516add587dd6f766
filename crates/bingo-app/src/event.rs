//! Application input events.
//!
//! This module defines [`AppEvent`], the inputs that drive the [`crate::App`]
//! state machine. They come from the player (selecting a lobby, asking for a
//! refresh) and from the runtime (identity changes, published snapshots,
//! join outcomes).

use bingo_core::{AuthState, DirectorySnapshot};

/// Events processed by the App state machine.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Identity was re-resolved.
    AuthChanged(AuthState),

    /// The synchronizer published a snapshot.
    DirectoryUpdated(DirectorySnapshot),

    /// Player picked a lobby.
    SelectLobby {
        /// Lobby to join.
        lobby_id: String,
    },

    /// A join request finished.
    JoinFinished {
        /// Lobby the request was for.
        lobby_id: String,
        /// Error message on failure.
        result: Result<(), String>,
    },

    /// Player asked for a fresh directory.
    Refresh,
}
