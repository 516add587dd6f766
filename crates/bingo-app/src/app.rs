//! Lobby browser state machine.
//!
//! [`App`] holds what the lobby screen shows: the resolved identity, the
//! latest directory snapshot, and the player's join attempt. It consumes
//! [`crate::AppEvent`] inputs and produces [`crate::AppAction`] instructions
//! for the runtime to execute, without performing any I/O itself.
//!
//! # Responsibilities
//!
//! - Pairs every listed lobby with its [`JoinGateDecision`].
//! - Keeps at most one join request outstanding; while it is, every join
//!   control reads as disabled.
//! - Refuses selections the gate would refuse, so a stale click on a lobby
//!   that filled up in the meantime sends nothing.

use bingo_client::JoinRequest;
use bingo_core::{AuthState, DirectorySnapshot, JoinGateDecision, decide};

use crate::{AppAction, AppEvent, JoinState, LobbyRow};

/// Application state machine.
#[derive(Debug, Clone)]
pub struct App {
    /// Current identity.
    auth: AuthState,
    /// Latest published directory.
    directory: DirectorySnapshot,
    /// Player's join attempt.
    join: JoinState,
    /// Coins staked per join.
    buy_in: u64,
}

impl App {
    /// Create an App that stakes `buy_in` coins per join.
    pub fn new(buy_in: u64) -> Self {
        Self {
            auth: AuthState::Pending,
            directory: DirectorySnapshot::default(),
            join: JoinState::Idle,
            buy_in,
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::AuthChanged(auth) => {
                self.auth = auth;
                vec![AppAction::Render]
            },
            AppEvent::DirectoryUpdated(snapshot) => {
                self.directory = snapshot;
                vec![AppAction::Render]
            },
            AppEvent::SelectLobby { lobby_id } => self.select_lobby(lobby_id),
            AppEvent::JoinFinished { lobby_id, result } => self.join_finished(lobby_id, result),
            AppEvent::Refresh => vec![AppAction::Refetch],
        }
    }

    fn select_lobby(&mut self, lobby_id: String) -> Vec<AppAction> {
        let Some(lobby) = self.directory.lobbies.get(&lobby_id) else {
            tracing::debug!(%lobby_id, "selected lobby is no longer listed");
            return Vec::new();
        };

        let decision = decide(lobby, self.join.is_joining());
        if !decision.enabled {
            tracing::debug!(%lobby_id, label = decision.label.as_str(), "join refused by gate");
            return Vec::new();
        }

        let (Some(token), Some(player_id)) = (self.auth.token(), self.auth.player_id()) else {
            self.join = JoinState::Failed {
                lobby_id,
                message: "player identity is not known yet".to_owned(),
            };
            return vec![AppAction::Render];
        };

        let request = JoinRequest {
            alien_id: player_id.as_str().to_owned(),
            buy_in_amount: self.buy_in,
            lobby_id: lobby_id.clone(),
        };
        let token = token.to_owned();
        self.join = JoinState::Joining { lobby_id };
        vec![AppAction::JoinLobby { token, request }, AppAction::Render]
    }

    fn join_finished(&mut self, lobby_id: String, result: Result<(), String>) -> Vec<AppAction> {
        match &self.join {
            JoinState::Joining { lobby_id: pending } if *pending == lobby_id => {},
            _ => {
                tracing::debug!(%lobby_id, "ignoring join result with no matching request");
                return Vec::new();
            },
        }

        self.join = match result {
            Ok(()) => JoinState::Joined { lobby_id },
            Err(message) => JoinState::Failed { lobby_id, message },
        };
        vec![AppAction::Refetch, AppAction::Render]
    }

    /// Current identity.
    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    /// Latest directory snapshot.
    pub fn directory(&self) -> &DirectorySnapshot {
        &self.directory
    }

    /// Player's join attempt.
    pub fn join_state(&self) -> &JoinState {
        &self.join
    }

    /// Coins staked per join.
    pub fn buy_in(&self) -> u64 {
        self.buy_in
    }

    /// Whether a join request is outstanding.
    pub fn is_joining(&self) -> bool {
        self.join.is_joining()
    }

    /// Directory in service order, each lobby with its join decision.
    pub fn rows(&self) -> Vec<LobbyRow> {
        let is_joining = self.is_joining();
        self.directory
            .lobbies
            .iter()
            .map(|lobby| LobbyRow { lobby: lobby.clone(), decision: decide(lobby, is_joining) })
            .collect()
    }

    /// Join decision for one lobby, if it is listed.
    pub fn decision_for(&self, lobby_id: &str) -> Option<JoinGateDecision> {
        self.directory.lobbies.get(lobby_id).map(|lobby| decide(lobby, self.is_joining()))
    }

    /// True whenever the directory lists nothing, error or not.
    ///
    /// The lobby screen shows its empty-state message in this case, below any
    /// surfaced error.
    pub fn shows_empty_state(&self) -> bool {
        self.directory.lobbies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use bingo_core::{JoinLabel, LobbyDirectory, LobbyInfo, LobbyListing, LobbyStatus, PlayerId};

    use super::*;

    fn lobby(id: &str, player_count: u32, max_players: u32, status: LobbyStatus) -> LobbyInfo {
        LobbyInfo {
            id: id.to_owned(),
            name: format!("Lobby {id}"),
            player_count,
            max_players,
            pot: u64::from(player_count) * 1000,
            status,
        }
    }

    fn snapshot(lobbies: Vec<LobbyInfo>) -> DirectorySnapshot {
        DirectorySnapshot {
            lobbies: LobbyDirectory::from_listing(LobbyListing { lobbies }).unwrap(),
            error: None,
        }
    }

    fn ready_app() -> App {
        let mut app = App::new(1000);
        app.handle(AppEvent::AuthChanged(AuthState::Authenticated {
            token: "tok".into(),
            player_id: Some(PlayerId::new("alien-7")),
        }));
        app.handle(AppEvent::DirectoryUpdated(snapshot(vec![
            lobby("open", 2, 10, LobbyStatus::Waiting),
            lobby("full", 10, 10, LobbyStatus::Waiting),
            lobby("live", 4, 10, LobbyStatus::Active),
        ])));
        app
    }

    #[test]
    fn rows_follow_directory_order_with_labels() {
        let app = ready_app();
        let labels: Vec<(String, JoinLabel, bool)> = app
            .rows()
            .into_iter()
            .map(|row| (row.lobby.id, row.decision.label, row.decision.enabled))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("open".into(), JoinLabel::Join, true),
                ("full".into(), JoinLabel::Full, false),
                ("live".into(), JoinLabel::Playing, false),
            ]
        );
    }

    #[test]
    fn selecting_open_lobby_sends_join() {
        let mut app = ready_app();
        let actions = app.handle(AppEvent::SelectLobby { lobby_id: "open".into() });

        assert_eq!(
            actions,
            vec![
                AppAction::JoinLobby {
                    token: "tok".into(),
                    request: JoinRequest {
                        alien_id: "alien-7".into(),
                        buy_in_amount: 1000,
                        lobby_id: "open".into(),
                    },
                },
                AppAction::Render,
            ]
        );
        assert!(app.is_joining());
        assert!(app.rows().iter().all(|row| !row.decision.enabled));
    }

    #[test]
    fn gate_refusals_send_nothing() {
        let mut app = ready_app();
        assert!(app.handle(AppEvent::SelectLobby { lobby_id: "full".into() }).is_empty());
        assert!(app.handle(AppEvent::SelectLobby { lobby_id: "live".into() }).is_empty());
        assert!(app.handle(AppEvent::SelectLobby { lobby_id: "gone".into() }).is_empty());
        assert_eq!(app.join_state(), &JoinState::Idle);
    }

    #[test]
    fn second_selection_while_joining_is_ignored() {
        let mut app = ready_app();
        app.handle(AppEvent::SelectLobby { lobby_id: "open".into() });
        assert!(app.handle(AppEvent::SelectLobby { lobby_id: "open".into() }).is_empty());
    }

    #[test]
    fn join_result_clears_flag_and_refetches() {
        let mut app = ready_app();
        app.handle(AppEvent::SelectLobby { lobby_id: "open".into() });

        let actions =
            app.handle(AppEvent::JoinFinished { lobby_id: "open".into(), result: Ok(()) });
        assert_eq!(actions, vec![AppAction::Refetch, AppAction::Render]);
        assert_eq!(app.join_state(), &JoinState::Joined { lobby_id: "open".into() });
        assert_eq!(app.decision_for("open").map(|d| d.enabled), Some(true));
    }

    #[test]
    fn failed_join_is_reported() {
        let mut app = ready_app();
        app.handle(AppEvent::SelectLobby { lobby_id: "open".into() });
        app.handle(AppEvent::JoinFinished {
            lobby_id: "open".into(),
            result: Err("Insufficient balance".into()),
        });
        assert_eq!(
            app.join_state(),
            &JoinState::Failed { lobby_id: "open".into(), message: "Insufficient balance".into() }
        );
    }

    #[test]
    fn unmatched_join_result_is_ignored() {
        let mut app = ready_app();
        let actions = app.handle(AppEvent::JoinFinished { lobby_id: "open".into(), result: Ok(()) });
        assert!(actions.is_empty());
        assert_eq!(app.join_state(), &JoinState::Idle);
    }

    #[test]
    fn join_without_identity_fails_locally() {
        let mut app = App::new(1000);
        app.handle(AppEvent::DirectoryUpdated(snapshot(vec![lobby(
            "open",
            0,
            4,
            LobbyStatus::Waiting,
        )])));

        let actions = app.handle(AppEvent::SelectLobby { lobby_id: "open".into() });
        assert_eq!(actions, vec![AppAction::Render]);
        assert!(matches!(app.join_state(), JoinState::Failed { .. }));
    }

    #[test]
    fn empty_state_follows_directory_not_error() {
        let mut app = App::new(1000);
        assert!(app.shows_empty_state());

        app.handle(AppEvent::DirectoryUpdated(DirectorySnapshot {
            lobbies: LobbyDirectory::default(),
            error: Some(bingo_core::SyncError::new("timeout")),
        }));
        assert!(app.shows_empty_state());

        app.handle(AppEvent::DirectoryUpdated(DirectorySnapshot {
            error: Some(bingo_core::SyncError::new("timeout")),
            ..snapshot(vec![lobby("open", 0, 4, LobbyStatus::Waiting)])
        }));
        assert!(!app.shows_empty_state());
    }

    #[test]
    fn refresh_requests_refetch() {
        let mut app = App::new(1000);
        assert_eq!(app.handle(AppEvent::Refresh), vec![AppAction::Refetch]);
    }
}
