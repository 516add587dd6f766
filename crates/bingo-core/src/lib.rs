//! Bingo lobby client core
//!
//! Sans-IO logic behind lobby discovery: resolving who the player is,
//! deciding when to poll the lobby directory and what to keep from each
//! result, and deciding whether a lobby may be joined.
//!
//! # Architecture
//!
//! Nothing here performs I/O or reads the clock directly. State machines
//! receive events and return actions for a driver to execute, so the same
//! code runs under a real tokio runtime and in deterministic tests.
//!
//! # Components
//!
//! - [`identity`]: [`IdentityResolver`] turning host bridge readings into an
//!   [`AuthState`]
//! - [`sync`]: [`DirectorySync`] polling schedule and snapshot ownership
//! - [`gate`]: [`decide`] join eligibility per lobby
//! - [`lobby`]: lobby records and the [`LobbyDirectory`] snapshot
//! - [`env`]: [`Environment`] abstraction over time and randomness

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod error;
pub mod gate;
pub mod identity;
pub mod lobby;
pub mod sync;

pub use env::Environment;
pub use error::{ClaimsError, LobbyValidationError};
pub use gate::{JoinGateDecision, JoinLabel, decide};
pub use identity::{AuthState, BridgeInput, IdentityResolver, PlayerId};
pub use lobby::{LobbyDirectory, LobbyInfo, LobbyListing, LobbyStatus};
pub use sync::{
    DirectorySnapshot, DirectorySync, Generation, OverlapPolicy, SyncAction, SyncConfig, SyncError,
    SyncEvent,
};
