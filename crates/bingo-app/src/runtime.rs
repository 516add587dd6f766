//! Lobby screen runtime.
//!
//! The Runtime owns every piece of mutable lobby state on a single task and
//! coordinates between:
//! - [`HostBridge`]: token and availability readings from the host
//! - [`IdentityResolver`]: memoized [`AuthState`] derivation
//! - [`DirectoryPoller`]: the polling schedule and its fetches
//! - [`App`]: the lobby browser state machine
//!
//! Consumers hold a [`RuntimeHandle`]: commands go in over a channel, and
//! identity, directory and view snapshots come out over watch channels.
//! Observers only ever see cloned, read-only state.

use std::sync::Arc;

use bingo_client::{ApiError, DEFAULT_BUY_IN, LobbyApi};
use bingo_core::{AuthState, DirectorySnapshot, Environment, IdentityResolver, SyncConfig};
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::{
    App, AppAction, AppEvent, DirectoryPoller,
    bridge::{BridgeStatus, HostBridge},
};

/// Runtime settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Polling schedule.
    pub sync: SyncConfig,
    /// Coins staked per join.
    pub buy_in: u64,
    /// Whether polling starts enabled.
    pub enabled: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { sync: SyncConfig::default(), buy_in: DEFAULT_BUY_IN, enabled: true }
    }
}

/// Errors returned by [`RuntimeHandle`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeError {
    /// The runtime task has exited.
    #[error("lobby runtime has shut down")]
    Closed,
}

#[derive(Debug)]
enum Command {
    SetEnabled(bool),
    Refresh,
    SelectLobby(String),
    Shutdown,
}

/// Consumer side of a running [`Runtime`].
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    commands: mpsc::UnboundedSender<Command>,
    auth: watch::Receiver<AuthState>,
    directory: watch::Receiver<DirectorySnapshot>,
    view: watch::Receiver<App>,
}

impl RuntimeHandle {
    fn send(&self, command: Command) -> Result<(), RuntimeError> {
        self.commands.send(command).map_err(|_| RuntimeError::Closed)
    }

    /// Enable or disable polling. Disabling stops the schedule immediately
    /// and keeps the last directory.
    pub fn set_enabled(&self, enabled: bool) -> Result<(), RuntimeError> {
        self.send(Command::SetEnabled(enabled))
    }

    /// Fetch once outside the schedule.
    pub fn refresh(&self) -> Result<(), RuntimeError> {
        self.send(Command::Refresh)
    }

    /// Try to join `lobby_id`. Ignored unless its join control is enabled.
    pub fn select_lobby(&self, lobby_id: impl Into<String>) -> Result<(), RuntimeError> {
        self.send(Command::SelectLobby(lobby_id.into()))
    }

    /// Stop polling and end the runtime task.
    pub fn shutdown(&self) -> Result<(), RuntimeError> {
        self.send(Command::Shutdown)
    }

    /// Resolved identity.
    pub fn auth(&self) -> watch::Receiver<AuthState> {
        self.auth.clone()
    }

    /// Published directory snapshots.
    pub fn directory(&self) -> watch::Receiver<DirectorySnapshot> {
        self.directory.clone()
    }

    /// Lobby browser view.
    pub fn view(&self) -> watch::Receiver<App> {
        self.view.clone()
    }
}

/// Single-task owner of identity, polling and browser state.
///
/// # Type Parameters
///
/// - `E`: Environment for time and randomness
/// - `A`: Lobby service
/// - `B`: Host bridge
pub struct Runtime<E, A, B>
where
    E: Environment,
    A: LobbyApi,
    B: HostBridge,
{
    api: Arc<A>,
    bridge: B,
    bridge_open: bool,
    resolver: IdentityResolver<E>,
    poller: DirectoryPoller<E, A>,
    app: App,
    enabled: bool,
    commands: mpsc::UnboundedReceiver<Command>,
    joins_tx: mpsc::UnboundedSender<(String, Result<(), String>)>,
    joins_rx: mpsc::UnboundedReceiver<(String, Result<(), String>)>,
    auth_tx: watch::Sender<AuthState>,
    view_tx: watch::Sender<App>,
}

impl<E, A, B> Runtime<E, A, B>
where
    E: Environment,
    A: LobbyApi,
    B: HostBridge,
{
    /// Create a runtime and the handle that controls it.
    pub fn new(env: E, api: Arc<A>, bridge: B, config: RuntimeConfig) -> (Self, RuntimeHandle) {
        let poller = DirectoryPoller::new(env.clone(), Arc::clone(&api), config.sync);
        let app = App::new(config.buy_in);

        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (joins_tx, joins_rx) = mpsc::unbounded_channel();
        let (auth_tx, auth) = watch::channel(AuthState::Pending);
        let (view_tx, view) = watch::channel(app.clone());
        let handle =
            RuntimeHandle { commands: commands_tx, auth, directory: poller.subscribe(), view };

        let runtime = Self {
            api,
            bridge,
            bridge_open: true,
            resolver: IdentityResolver::new(env),
            poller,
            app,
            enabled: config.enabled,
            commands,
            joins_tx,
            joins_rx,
            auth_tx,
            view_tx,
        };
        (runtime, handle)
    }

    /// Run until [`RuntimeHandle::shutdown`] or until every handle is dropped.
    pub async fn run(mut self) {
        let status = self.bridge.status();
        self.apply_bridge(&status);

        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                status = self.bridge.changed(), if self.bridge_open => match status {
                    Some(status) => self.apply_bridge(&status),
                    None => {
                        tracing::debug!("host bridge closed, keeping last identity");
                        self.bridge_open = false;
                    },
                },
                Some((lobby_id, result)) = self.joins_rx.recv() => {
                    let actions = self.app.handle(AppEvent::JoinFinished { lobby_id, result });
                    self.process_actions(actions);
                },
                event = self.poller.next_event() => {
                    let published = self.poller.handle(event);
                    self.on_published(published);
                },
            }
        }

        self.poller.stop();
        tracing::debug!("lobby runtime stopped");
    }

    fn handle_command(&mut self, command: Command) {
        let actions = match command {
            Command::SetEnabled(enabled) => {
                self.enabled = enabled;
                self.reconfigure();
                return;
            },
            Command::Refresh => self.app.handle(AppEvent::Refresh),
            Command::SelectLobby(lobby_id) => self.app.handle(AppEvent::SelectLobby { lobby_id }),
            Command::Shutdown => return,
        };
        self.process_actions(actions);
    }

    fn apply_bridge(&mut self, status: &BridgeStatus) {
        let auth = self.resolver.resolve(status.to_input()).clone();
        let changed = self.auth_tx.send_if_modified(|current| {
            if *current == auth {
                return false;
            }
            *current = auth.clone();
            true
        });

        if changed {
            tracing::info!(
                ready = auth.is_ready(),
                fallback = auth.is_fallback(),
                player_id = auth.player_id().map(|id| id.as_str()),
                "identity changed"
            );
            let actions = self.app.handle(AppEvent::AuthChanged(auth));
            self.process_actions(actions);
        }
        self.reconfigure();
    }

    fn reconfigure(&mut self) {
        let published = self.poller.configure(self.app.auth().token(), self.enabled);
        self.on_published(published);
    }

    fn on_published(&mut self, published: Option<DirectorySnapshot>) {
        if let Some(snapshot) = published {
            let actions = self.app.handle(AppEvent::DirectoryUpdated(snapshot));
            self.process_actions(actions);
        }
    }

    fn process_actions(&mut self, actions: Vec<AppAction>) {
        for action in actions {
            match action {
                AppAction::Render => {
                    self.view_tx.send_replace(self.app.clone());
                },
                AppAction::Refetch => {
                    let published = self.poller.refetch();
                    self.on_published(published);
                },
                AppAction::JoinLobby { token, request } => {
                    let api = Arc::clone(&self.api);
                    let joins = self.joins_tx.clone();
                    tokio::spawn(async move {
                        let lobby_id = request.lobby_id.clone();
                        let result = match api.join_lobby(&token, &request).await {
                            Ok(_) => {
                                tracing::info!(%lobby_id, "joined lobby");
                                Ok(())
                            },
                            Err(error) => {
                                tracing::warn!(%lobby_id, %error, "join failed");
                                Err(join_failure_message(&error))
                            },
                        };
                        let _ = joins.send((lobby_id, result));
                    });
                },
            }
        }
    }
}

/// Text shown to the player for a failed join.
fn join_failure_message(error: &ApiError) -> String {
    match error {
        ApiError::Status { message, .. } if !message.is_empty() => message.clone(),
        other => other.to_string(),
    }
}
