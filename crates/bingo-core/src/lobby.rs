//! Lobby records and the directory snapshot.
//!
//! [`LobbyInfo`] mirrors one entry of the listing endpoint's JSON. A
//! [`LobbyDirectory`] is an immutable, cheaply clonable sequence of lobbies in
//! server order; it is only ever replaced wholesale, never patched.

use std::{collections::HashSet, sync::Arc};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::LobbyValidationError;

/// Lifecycle of a lobby as far as joining is concerned.
///
/// Decoding is total: `waiting` and `forming` are [`LobbyStatus::Waiting`],
/// every other status string (`active`, `arranging`, `finished`, ...) is
/// [`LobbyStatus::Active`]. One lobby in an unfamiliar state never rejects
/// the whole listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LobbyStatus {
    /// Still accepting players.
    Waiting,
    /// Game locked to new players.
    Active,
}

impl<'de> Deserialize<'de> for LobbyStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let status = String::deserialize(deserializer)?;
        Ok(match status.as_str() {
            "waiting" | "forming" => Self::Waiting,
            _ => Self::Active,
        })
    }
}

/// One joinable lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyInfo {
    /// Unique within one directory snapshot.
    #[serde(rename = "lobby_id")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Players currently seated.
    pub player_count: u32,
    /// Seat capacity.
    pub max_players: u32,
    /// Staked coins.
    pub pot: u64,
    /// Lobby status.
    pub status: LobbyStatus,
}

impl LobbyInfo {
    /// No seats left.
    pub fn is_full(&self) -> bool {
        self.player_count >= self.max_players
    }

    /// Game already under way.
    pub fn is_active(&self) -> bool {
        self.status == LobbyStatus::Active
    }
}

/// Body of a successful listing response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LobbyListing {
    /// Lobbies in server order.
    pub lobbies: Vec<LobbyInfo>,
}

/// Ordered set of lobbies from one successful poll.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LobbyDirectory {
    lobbies: Arc<[LobbyInfo]>,
}

impl LobbyDirectory {
    /// Build a directory from a listing, rejecting it if any lobby is over
    /// capacity or an id repeats.
    pub fn from_listing(listing: LobbyListing) -> Result<Self, LobbyValidationError> {
        validate(&listing.lobbies)?;
        Ok(Self { lobbies: listing.lobbies.into() })
    }

    /// Lobbies in server order.
    pub fn as_slice(&self) -> &[LobbyInfo] {
        &self.lobbies
    }

    /// Iterate lobbies in server order.
    pub fn iter(&self) -> std::slice::Iter<'_, LobbyInfo> {
        self.lobbies.iter()
    }

    /// Look up a lobby by id.
    pub fn get(&self, id: &str) -> Option<&LobbyInfo> {
        self.lobbies.iter().find(|lobby| lobby.id == id)
    }

    /// Number of lobbies.
    pub fn len(&self) -> usize {
        self.lobbies.len()
    }

    /// No lobbies listed.
    pub fn is_empty(&self) -> bool {
        self.lobbies.is_empty()
    }
}

fn validate(lobbies: &[LobbyInfo]) -> Result<(), LobbyValidationError> {
    let mut seen = HashSet::with_capacity(lobbies.len());
    for lobby in lobbies {
        if lobby.player_count > lobby.max_players {
            return Err(LobbyValidationError::OverCapacity {
                lobby_id: lobby.id.clone(),
                player_count: lobby.player_count,
                max_players: lobby.max_players,
            });
        }
        if !seen.insert(lobby.id.as_str()) {
            return Err(LobbyValidationError::DuplicateId { lobby_id: lobby.id.clone() });
        }
    }
    Ok(())
}

impl<'a> IntoIterator for &'a LobbyDirectory {
    type Item = &'a LobbyInfo;
    type IntoIter = std::slice::Iter<'a, LobbyInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lobby(id: &str, player_count: u32, max_players: u32) -> LobbyInfo {
        LobbyInfo {
            id: id.to_owned(),
            name: format!("Lobby {id}"),
            player_count,
            max_players,
            pot: 1000,
            status: LobbyStatus::Waiting,
        }
    }

    #[test]
    fn server_order_is_preserved() {
        let listing = LobbyListing { lobbies: vec![lobby("c", 0, 5), lobby("a", 1, 5), lobby("b", 2, 5)] };
        let directory = LobbyDirectory::from_listing(listing).unwrap();

        let ids: Vec<_> = directory.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
        assert_eq!(directory.get("a").map(|l| l.player_count), Some(1));
        assert!(directory.get("z").is_none());
    }

    #[test]
    fn over_capacity_lobby_is_rejected() {
        let listing = LobbyListing { lobbies: vec![lobby("a", 6, 5)] };
        assert_eq!(
            LobbyDirectory::from_listing(listing),
            Err(LobbyValidationError::OverCapacity {
                lobby_id: "a".into(),
                player_count: 6,
                max_players: 5
            })
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let listing = LobbyListing { lobbies: vec![lobby("a", 0, 5), lobby("a", 1, 5)] };
        assert_eq!(
            LobbyDirectory::from_listing(listing),
            Err(LobbyValidationError::DuplicateId { lobby_id: "a".into() })
        );
    }

    #[test]
    fn exactly_full_is_valid() {
        let directory = LobbyDirectory::from_listing(LobbyListing { lobbies: vec![lobby("a", 5, 5)] }).unwrap();
        assert!(directory.as_slice()[0].is_full());
    }

    #[test]
    fn empty_listing_is_empty_directory() {
        let directory = LobbyDirectory::from_listing(LobbyListing::default()).unwrap();
        assert!(directory.is_empty());
        assert_eq!(directory, LobbyDirectory::default());
    }
}
