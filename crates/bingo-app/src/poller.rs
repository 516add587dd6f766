//! Async driver for [`DirectorySync`].
//!
//! The poller owns the synchronizer and executes its actions: fetches are
//! spawned as tasks that report back through a channel tagged with their
//! generation, the single timer is a deadline the owner's loop sleeps
//! towards, and published snapshots go out on a watch channel.
//!
//! All state transitions happen in the methods below, on the owner's task.
//! [`DirectoryPoller::stop`] therefore disarms the timer before it returns,
//! and completions from the stopped session are dropped by generation.

use std::{sync::Arc, time::Duration};

use bingo_client::{ApiError, LobbyApi};
use bingo_core::{
    DirectorySnapshot, DirectorySync, Environment, Generation, LobbyDirectory, SyncAction,
    SyncConfig, SyncEvent,
};
use tokio::sync::{mpsc, watch};

/// Something the poller must react to.
#[derive(Debug)]
pub enum PollerEvent {
    /// The armed deadline passed.
    Tick,
    /// A spawned fetch finished.
    Completed {
        /// Session the fetch was issued under.
        generation: Generation,
        /// What the service returned.
        result: Result<LobbyDirectory, ApiError>,
    },
}

/// Lobby directory poller.
pub struct DirectoryPoller<E: Environment, A: LobbyApi> {
    env: E,
    api: Arc<A>,
    sync: DirectorySync<E::Instant>,
    deadline: Option<E::Instant>,
    completions_tx: mpsc::UnboundedSender<(Generation, Result<LobbyDirectory, ApiError>)>,
    completions_rx: mpsc::UnboundedReceiver<(Generation, Result<LobbyDirectory, ApiError>)>,
    snapshots: watch::Sender<DirectorySnapshot>,
}

impl<E: Environment, A: LobbyApi> DirectoryPoller<E, A> {
    /// Create an idle poller.
    pub fn new(env: E, api: Arc<A>, config: SyncConfig) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(DirectorySnapshot::default());
        Self {
            env,
            api,
            sync: DirectorySync::new(config),
            deadline: None,
            completions_tx,
            completions_rx,
            snapshots,
        }
    }

    /// Receive every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<DirectorySnapshot> {
        self.snapshots.subscribe()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> &DirectorySnapshot {
        self.sync.snapshot()
    }

    /// Whether a polling session is running.
    pub fn is_polling(&self) -> bool {
        self.sync.is_polling()
    }

    /// Whether the timer is armed.
    pub fn is_timer_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fetches issued by the current session that have not completed.
    pub fn in_flight(&self) -> usize {
        self.sync.in_flight()
    }

    /// Apply the current credential and enable flag.
    ///
    /// Returns the snapshot if one was published.
    pub fn configure(&mut self, token: Option<&str>, enabled: bool) -> Option<DirectorySnapshot> {
        let now = self.env.now();
        let actions =
            self.sync.handle(SyncEvent::Configure { token: token.map(str::to_owned), enabled, now });
        self.execute(actions)
    }

    /// Fetch once now, without moving the schedule.
    pub fn refetch(&mut self) -> Option<DirectorySnapshot> {
        let actions = self.sync.handle(SyncEvent::Refetch);
        self.execute(actions)
    }

    /// Stop polling. The timer is disarmed before this returns.
    pub fn stop(&mut self) {
        let actions = self.sync.handle(SyncEvent::Stop);
        self.execute(actions);
    }

    /// Wait for the deadline or a fetch completion.
    ///
    /// Cancel safe: dropping the future loses nothing, so it can sit in a
    /// `select!` next to other inputs.
    pub async fn next_event(&mut self) -> PollerEvent {
        let env = &self.env;
        let deadline = self.deadline;
        let timer = async move {
            match deadline {
                Some(deadline) => {
                    let now = env.now();
                    let wait = if deadline > now { deadline - now } else { Duration::ZERO };
                    env.sleep(wait).await;
                },
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            Some((generation, result)) = self.completions_rx.recv() => {
                PollerEvent::Completed { generation, result }
            },
            () = timer => PollerEvent::Tick,
        }
    }

    /// Feed an event from [`Self::next_event`].
    ///
    /// Returns the snapshot if one was published.
    pub fn handle(&mut self, event: PollerEvent) -> Option<DirectorySnapshot> {
        let actions = match event {
            PollerEvent::Tick => {
                let now = self.env.now();
                self.sync.handle(SyncEvent::Tick { now })
            },
            PollerEvent::Completed { generation, result: Ok(lobbies) } => {
                self.sync.handle(SyncEvent::FetchSucceeded { generation, lobbies })
            },
            PollerEvent::Completed { generation, result: Err(error) } => {
                self.sync.handle(SyncEvent::FetchFailed { generation, message: error.to_string() })
            },
        };
        self.execute(actions)
    }

    fn execute(&mut self, actions: Vec<SyncAction<E::Instant>>) -> Option<DirectorySnapshot> {
        let mut published = None;
        for action in actions {
            match action {
                SyncAction::Fetch { generation, token } => self.spawn_fetch(generation, token),
                SyncAction::ArmTimer { deadline } => self.deadline = Some(deadline),
                SyncAction::CancelTimer => self.deadline = None,
                SyncAction::Publish(snapshot) => {
                    self.snapshots.send_replace(snapshot.clone());
                    published = Some(snapshot);
                },
            }
        }
        published
    }

    fn spawn_fetch(&self, generation: Generation, token: String) {
        let api = Arc::clone(&self.api);
        let completions = self.completions_tx.clone();
        tracing::trace!(%generation, "fetching lobby directory");
        tokio::spawn(async move {
            let result = api.list_lobbies(&token).await;
            // Receiver gone means the poller was dropped mid-fetch.
            let _ = completions.send((generation, result));
        });
    }
}
