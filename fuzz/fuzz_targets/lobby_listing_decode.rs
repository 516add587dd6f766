//! Fuzz target for lobby listing decoding
//!
//! Feeds arbitrary bytes through the same path a listing response takes:
//! JSON decode, then directory validation.
//!
//! # Invariants
//!
//! - NEVER panic on malformed bodies
//! - Every accepted directory has unique ids and no lobby over capacity

#![no_main]

use std::collections::HashSet;

use bingo_core::{LobbyDirectory, LobbyListing};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(listing) = serde_json::from_slice::<LobbyListing>(data) else {
        return;
    };
    let Ok(directory) = LobbyDirectory::from_listing(listing) else {
        return;
    };

    let mut seen = HashSet::new();
    for lobby in &directory {
        assert!(seen.insert(lobby.id.clone()), "duplicate id {}", lobby.id);
        assert!(lobby.player_count <= lobby.max_players);
    }
});
