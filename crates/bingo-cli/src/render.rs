//! Text rendering of the lobby browser view.

use bingo_app::{App, JoinState, LobbyRow};
use bingo_core::{AuthState, LobbyStatus};

/// One line per lobby, in directory order.
pub fn row_line(row: &LobbyRow) -> String {
    let lobby = &row.lobby;
    let status = match lobby.status {
        LobbyStatus::Waiting => "waiting",
        LobbyStatus::Active => "active",
    };
    let control = if row.decision.enabled {
        format!("[{}]", row.decision.label.as_str())
    } else {
        format!("({})", row.decision.label.as_str())
    };
    format!(
        "{:<20} {:>3}/{:<3} pot {:>7}  {:<7} {}  id={}",
        lobby.name, lobby.player_count, lobby.max_players, lobby.pot, status, control, lobby.id
    )
}

/// Lines describing the whole view.
pub fn view_lines(app: &App) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(match app.auth() {
        AuthState::Pending => "identity: waiting for host token".to_owned(),
        AuthState::Fallback { player_id, .. } => format!("identity: {player_id} (offline)"),
        AuthState::Authenticated { player_id: Some(player_id), .. } => {
            format!("identity: {player_id}")
        },
        AuthState::Authenticated { player_id: None, .. } => {
            "identity: authenticated (unknown player)".to_owned()
        },
    });

    if let Some(error) = &app.directory().error {
        lines.push(format!("error: {error}"));
    }

    if app.shows_empty_state() {
        lines.push("no lobbies available".to_owned());
    }
    lines.extend(app.rows().iter().map(row_line));

    match app.join_state() {
        JoinState::Idle => {},
        JoinState::Joining { lobby_id } => lines.push(format!("joining {lobby_id}...")),
        JoinState::Joined { lobby_id } => lines.push(format!("joined {lobby_id}")),
        JoinState::Failed { lobby_id, message } => {
            lines.push(format!("could not join {lobby_id}: {message}"));
        },
    }

    lines
}

#[cfg(test)]
mod tests {
    use bingo_app::AppEvent;
    use bingo_core::{
        DirectorySnapshot, LobbyDirectory, LobbyInfo, LobbyListing, PlayerId, SyncError,
    };

    use super::*;

    fn lobby(id: &str, name: &str, count: u32, max: u32, status: LobbyStatus) -> LobbyInfo {
        LobbyInfo {
            id: id.into(),
            name: name.into(),
            player_count: count,
            max_players: max,
            pot: u64::from(count) * 1000,
            status,
        }
    }

    fn app_with(lobbies: Vec<LobbyInfo>, error: Option<&str>) -> App {
        let mut app = App::new(1000);
        app.handle(AppEvent::AuthChanged(AuthState::Authenticated {
            token: "tok".into(),
            player_id: Some(PlayerId::new("alien-7")),
        }));
        app.handle(AppEvent::DirectoryUpdated(DirectorySnapshot {
            lobbies: LobbyDirectory::from_listing(LobbyListing { lobbies }).unwrap(),
            error: error.map(SyncError::new),
        }));
        app
    }

    #[test]
    fn renders_rows_with_controls() {
        let app = app_with(
            vec![
                lobby("l-1", "Saturn", 3, 10, LobbyStatus::Waiting),
                lobby("l-2", "Mars", 10, 10, LobbyStatus::Waiting),
                lobby("l-3", "Venus", 4, 10, LobbyStatus::Active),
            ],
            None,
        );

        insta::assert_snapshot!(view_lines(&app).join("\n"), @r"
        identity: alien-7
        Saturn                 3/10  pot    3000  waiting [Join]  id=l-1
        Mars                  10/10  pot   10000  waiting (Full)  id=l-2
        Venus                  4/10  pot    4000  active  (Playing)  id=l-3
        ");
    }

    #[test]
    fn empty_directory_shows_indicator() {
        let app = app_with(Vec::new(), None);
        assert_eq!(view_lines(&app), vec!["identity: alien-7", "no lobbies available"]);
    }

    #[test]
    fn failed_fetch_shows_error_and_indicator() {
        let app = app_with(Vec::new(), Some("lobby service unreachable: timeout"));
        assert_eq!(
            view_lines(&app),
            vec![
                "identity: alien-7",
                "error: lobby service unreachable: timeout",
                "no lobbies available"
            ]
        );
    }
}
