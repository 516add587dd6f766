//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::App`] state machine for the runtime to execute.

use bingo_client::JoinRequest;

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Publish the updated view.
    Render,

    /// Fetch the lobby directory once, outside the polling schedule.
    Refetch,

    /// Ask the service to seat the player.
    JoinLobby {
        /// Bearer token to authenticate with.
        token: String,
        /// Join payload.
        request: JoinRequest,
    },
}
