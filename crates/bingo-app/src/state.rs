//! Observable application state types.
//!
//! [`LobbyRow`] and [`JoinState`] are the view model the lobby browser
//! renders from: the directory joined with a per-lobby join decision, and
//! where the player's join attempt stands.

use bingo_core::{JoinGateDecision, LobbyInfo};

/// One rendered lobby.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyRow {
    /// Lobby as last fetched.
    pub lobby: LobbyInfo,
    /// Whether the join control is enabled and what it says.
    pub decision: JoinGateDecision,
}

/// Progress of the player's join attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JoinState {
    /// No join attempted.
    #[default]
    Idle,
    /// Request outstanding. Every join control is disabled meanwhile.
    Joining {
        /// Target lobby.
        lobby_id: String,
    },
    /// Service accepted the join.
    Joined {
        /// Lobby the player now sits in.
        lobby_id: String,
    },
    /// Last attempt failed.
    Failed {
        /// Target lobby.
        lobby_id: String,
        /// Reason shown to the player.
        message: String,
    },
}

impl JoinState {
    /// Whether a join request is outstanding.
    pub fn is_joining(&self) -> bool {
        matches!(self, Self::Joining { .. })
    }
}
