//! Deterministic test harness for the bingo client.
//!
//! Test doubles for the three things the client does not control: time and
//! randomness ([`SimEnv`]), the lobby service as seen through its trait
//! ([`ScriptedApi`]), and the lobby service as seen over real HTTP
//! ([`StubServer`]).
//!
//! Timing tests run under `#[tokio::test(start_paused = true)]` so that the
//! poller's timer and the scripted delays share one virtual clock.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod scripted_api;
pub mod sim_env;
pub mod stub_http;

pub use scripted_api::{Gate, ListCall, ListOutcome, ScriptedApi};
pub use sim_env::SimEnv;
pub use stub_http::{RecordedRequest, StubResponse, StubServer};
