//! Application layer for the bingo lobby client
//!
//! Wires the Sans-IO core to tokio: a host bridge supplying credentials, a
//! poller executing the synchronizer's actions, and a lobby browser state
//! machine, all owned by one runtime task.
//!
//! # Components
//!
//! - [`App`]: lobby browser state machine (rows, join gating, join flow)
//! - [`HostBridge`]: injected source of the host's token and availability
//! - [`DirectoryPoller`]: async driver for [`bingo_core::DirectorySync`]
//! - [`Runtime`]: single-task orchestration loop behind a [`RuntimeHandle`]
//! - [`SystemEnv`]: production [`bingo_core::Environment`]

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
pub mod bridge;
mod event;
mod poller;
mod runtime;
mod state;
mod system_env;

pub use action::AppAction;
pub use app::App;
pub use bridge::{BridgeHandle, BridgeStatus, HostBridge, WatchBridge};
pub use event::AppEvent;
pub use poller::{DirectoryPoller, PollerEvent};
pub use runtime::{Runtime, RuntimeConfig, RuntimeError, RuntimeHandle};
pub use state::{JoinState, LobbyRow};
pub use system_env::SystemEnv;
