//! Scripted lobby service.
//!
//! [`ScriptedApi`] answers listing requests from a queue of scripted steps,
//! falling back to a default outcome once the queue is drained. A step can be
//! held open with a [`Gate`] or delayed on the virtual clock, which is how
//! tests put fetches "in flight" and control the order they complete in.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use bingo_client::{ApiError, JoinReceipt, JoinRequest, LobbyApi};
use bingo_core::LobbyDirectory;
use tokio::sync::{oneshot, watch};

/// Outcome of one listing request.
pub type ListOutcome = Result<LobbyDirectory, ApiError>;

/// Held-open step. Dropping the gate releases it as well.
pub struct Gate {
    release: oneshot::Sender<()>,
}

impl Gate {
    /// Let the held request complete.
    pub fn release(self) {
        let _ = self.release.send(());
    }
}

enum Hold {
    None,
    Gate(oneshot::Receiver<()>),
    Delay(Duration),
}

struct Step {
    outcome: ListOutcome,
    hold: Hold,
}

/// A recorded listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCall {
    /// Bearer token presented.
    pub token: String,
    /// Virtual time the request started.
    pub at: tokio::time::Instant,
}

struct State {
    script: VecDeque<Step>,
    fallback: ListOutcome,
    list_calls: Vec<ListCall>,
    joins: Vec<(String, JoinRequest)>,
    join_outcomes: VecDeque<Result<JoinReceipt, ApiError>>,
}

/// In-memory [`LobbyApi`] with scripted responses.
#[derive(Clone)]
pub struct ScriptedApi {
    state: Arc<Mutex<State>>,
    calls: Arc<watch::Sender<usize>>,
}

impl ScriptedApi {
    /// Service that returns an empty directory until scripted otherwise.
    pub fn new() -> Self {
        Self::with_fallback(Ok(LobbyDirectory::default()))
    }

    /// Service that answers `fallback` whenever the script is empty.
    pub fn with_fallback(fallback: ListOutcome) -> Self {
        let state = State {
            script: VecDeque::new(),
            fallback,
            list_calls: Vec::new(),
            joins: Vec::new(),
            join_outcomes: VecDeque::new(),
        };
        let (calls, _) = watch::channel(0);
        Self { state: Arc::new(Mutex::new(state)), calls: Arc::new(calls) }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer the next request immediately.
    pub fn push(&self, outcome: ListOutcome) {
        self.lock().script.push_back(Step { outcome, hold: Hold::None });
    }

    /// Answer the next request only once the returned gate is released.
    pub fn push_gated(&self, outcome: ListOutcome) -> Gate {
        let (release, held) = oneshot::channel();
        self.lock().script.push_back(Step { outcome, hold: Hold::Gate(held) });
        Gate { release }
    }

    /// Answer the next request after `delay` of (virtual) time.
    pub fn push_delayed(&self, outcome: ListOutcome, delay: Duration) {
        self.lock().script.push_back(Step { outcome, hold: Hold::Delay(delay) });
    }

    /// Replace the outcome used once the script is drained.
    pub fn set_fallback(&self, outcome: ListOutcome) {
        self.lock().fallback = outcome;
    }

    /// Queue the outcome of the next join request.
    pub fn push_join(&self, outcome: Result<JoinReceipt, ApiError>) {
        self.lock().join_outcomes.push_back(outcome);
    }

    /// Listing requests received so far.
    pub fn list_calls(&self) -> Vec<ListCall> {
        self.lock().list_calls.clone()
    }

    /// Number of listing requests received so far.
    pub fn list_call_count(&self) -> usize {
        *self.calls.borrow()
    }

    /// Join requests received so far, with the token each carried.
    pub fn joins(&self) -> Vec<(String, JoinRequest)> {
        self.lock().joins.clone()
    }

    /// Wait until at least `count` listing requests have started.
    pub async fn wait_for_calls(&self, count: usize) {
        let mut calls = self.calls.subscribe();
        let _ = calls.wait_for(|seen| *seen >= count).await;
    }
}

impl Default for ScriptedApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LobbyApi for ScriptedApi {
    async fn list_lobbies(&self, token: &str) -> Result<LobbyDirectory, ApiError> {
        let (outcome, hold) = {
            let mut state = self.lock();
            state.list_calls.push(ListCall { token: token.to_owned(), at: tokio::time::Instant::now() });
            match state.script.pop_front() {
                Some(step) => (step.outcome, step.hold),
                None => (state.fallback.clone(), Hold::None),
            }
        };
        self.calls.send_modify(|seen| *seen += 1);

        match hold {
            Hold::None => {},
            Hold::Gate(held) => {
                let _ = held.await;
            },
            Hold::Delay(delay) => tokio::time::sleep(delay).await,
        }

        outcome
    }

    async fn join_lobby(&self, token: &str, request: &JoinRequest) -> Result<JoinReceipt, ApiError> {
        let mut state = self.lock();
        state.joins.push((token.to_owned(), request.clone()));
        state
            .join_outcomes
            .pop_front()
            .unwrap_or_else(|| Ok(JoinReceipt(serde_json::json!({ "lobby_id": request.lobby_id }))))
    }
}
