//! Wire decoding of the lobby listing endpoint.

use bingo_core::{JoinLabel, LobbyDirectory, LobbyListing, LobbyStatus, LobbyValidationError, decide};

const LISTING: &str = r#"{
    "lobbies": [
        {"lobby_id": "l-1", "name": "Saturn", "player_count": 3, "max_players": 10, "pot": 3000, "status": "waiting"},
        {"lobby_id": "l-2", "name": "Mars", "player_count": 10, "max_players": 10, "pot": 10000, "status": "active"},
        {"lobby_id": "l-3", "name": "Venus", "player_count": 1, "max_players": 10, "pot": 1000, "status": "forming", "created_at": "2025-01-01T00:00:00"}
    ]
}"#;

#[test]
fn listing_decodes_in_server_order() {
    let listing: LobbyListing = serde_json::from_str(LISTING).unwrap();
    let directory = LobbyDirectory::from_listing(listing).unwrap();

    let ids: Vec<_> = directory.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, ["l-1", "l-2", "l-3"]);
    assert_eq!(directory.get("l-2").map(|l| l.status), Some(LobbyStatus::Active));
    assert_eq!(directory.get("l-3").map(|l| l.status), Some(LobbyStatus::Waiting));
}

#[test]
fn backend_statuses_normalize_on_reencode() {
    let listing: LobbyListing = serde_json::from_str(
        r#"{"lobbies":[{"lobby_id":"a","name":"A","player_count":2,"max_players":4,"pot":200,"status":"arranging"}]}"#,
    )
    .unwrap();

    insta::assert_json_snapshot!(listing.lobbies[0], @r#"
    {
      "lobby_id": "a",
      "name": "A",
      "player_count": 2,
      "max_players": 4,
      "pot": 200,
      "status": "active"
    }
    "#);
}

#[test]
fn finished_lobby_does_not_reject_listing() {
    let listing: LobbyListing = serde_json::from_str(
        r#"{"lobbies":[
            {"lobby_id":"open","name":"Open","player_count":1,"max_players":4,"pot":100,"status":"waiting"},
            {"lobby_id":"done","name":"Done","player_count":3,"max_players":4,"pot":300,"status":"finished"}
        ]}"#,
    )
    .unwrap();
    let directory = LobbyDirectory::from_listing(listing).unwrap();

    assert_eq!(directory.len(), 2);
    assert_eq!(directory.get("open").map(|l| l.status), Some(LobbyStatus::Waiting));
    let done = directory.get("done").unwrap();
    assert!(done.is_active());

    let decision = decide(done, false);
    assert!(!decision.enabled);
    assert_eq!(decision.label, JoinLabel::Playing);
}

#[test]
fn unfamiliar_status_is_not_joinable() {
    let listing: LobbyListing = serde_json::from_str(
        r#"{"lobbies":[{"lobby_id":"a","name":"A","player_count":0,"max_players":4,"pot":0,"status":"paused"}]}"#,
    )
    .unwrap();
    assert_eq!(listing.lobbies[0].status, LobbyStatus::Active);
    assert!(!decide(&listing.lobbies[0], false).enabled);
}

#[test]
fn non_string_status_is_a_decode_error() {
    let result = serde_json::from_str::<LobbyListing>(
        r#"{"lobbies":[{"lobby_id":"a","name":"A","player_count":0,"max_players":4,"pot":0,"status":3}]}"#,
    );
    assert!(result.is_err());
}

#[test]
fn negative_counts_are_a_decode_error() {
    let result = serde_json::from_str::<LobbyListing>(
        r#"{"lobbies":[{"lobby_id":"a","name":"A","player_count":-1,"max_players":4,"pot":0,"status":"waiting"}]}"#,
    );
    assert!(result.is_err());
}

#[test]
fn missing_lobbies_field_is_a_decode_error() {
    assert!(serde_json::from_str::<LobbyListing>(r#"{"items":[]}"#).is_err());
}

#[test]
fn over_capacity_listing_is_rejected_after_decode() {
    let listing: LobbyListing = serde_json::from_str(
        r#"{"lobbies":[{"lobby_id":"a","name":"A","player_count":5,"max_players":4,"pot":0,"status":"waiting"}]}"#,
    )
    .unwrap();

    let error = LobbyDirectory::from_listing(listing).unwrap_err();
    assert!(matches!(error, LobbyValidationError::OverCapacity { .. }));
    assert_eq!(error.to_string(), "lobby a reports 5 players but holds 4");
}
