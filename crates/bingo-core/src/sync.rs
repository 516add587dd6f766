//! Lobby directory synchronization state machine.
//!
//! [`DirectorySync`] decides *when* to fetch the lobby listing and *what* to
//! do with each result. It performs no I/O: the caller feeds it
//! [`SyncEvent`]s (configuration changes, timer expiry, fetch completions) and
//! executes the [`SyncAction`]s it returns (start a fetch, arm or cancel the
//! timer, publish a snapshot).
//!
//! # Sessions
//!
//! Every transition into polling opens a new session tagged with a
//! [`Generation`]. Fetches carry the generation they were issued under, and a
//! completion is only applied if its generation is the current one and the
//! machine is still polling. Stopping therefore makes every in-flight fetch
//! inert without needing to cancel it.
//!
//! # Schedule
//!
//! Polling is fixed-rate: one fetch on entry, then one per
//! [`SyncConfig::poll_interval`] measured from the previous deadline, not from
//! fetch completion. Deadlines that were missed entirely are skipped rather
//! than fired in a burst.
//!
//! # Failures
//!
//! A failed fetch records a [`SyncError`] and leaves the directory untouched.
//! The schedule carries on; the next tick retries with no backoff.

use std::{fmt, ops::Add, time::Duration};

use crate::lobby::LobbyDirectory;

/// Default interval between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Shortest interval accepted; smaller values are raised to this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// What to do when a tick fires while a fetch is still outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Fetch anyway; whichever completion arrives last wins.
    #[default]
    LastWriteWins,
    /// Drop the tick while any fetch of the current session is in flight.
    SkipIfBusy,
}

/// Synchronizer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Interval between scheduled fetches.
    pub poll_interval: Duration,
    /// Overlapping fetch policy.
    pub overlap: OverlapPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { poll_interval: DEFAULT_POLL_INTERVAL, overlap: OverlapPolicy::default() }
    }
}

/// Polling session identifier. Strictly increasing per synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// Raw counter value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// Human-readable description of the last failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncError {
    message: String,
}

impl SyncError {
    /// Wrap an error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    /// The message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// What presentation sees: the latest directory plus the latest error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectorySnapshot {
    /// Last successfully fetched directory.
    pub lobbies: LobbyDirectory,
    /// Set by a failed fetch, cleared by the next success.
    pub error: Option<SyncError>,
}

/// Inputs to the synchronizer.
///
/// Generic over `I` (Instant type) so tests can drive virtual time.
#[derive(Debug, Clone)]
pub enum SyncEvent<I> {
    /// Credential or enablement changed.
    ///
    /// Polling runs iff `token` is present and `enabled` is true. A changed
    /// token while polling starts a fresh session.
    Configure {
        /// Bearer token, if the identity is ready.
        token: Option<String>,
        /// Caller-level enable flag.
        enabled: bool,
        /// Current time.
        now: I,
    },

    /// Stop polling and release the timer.
    Stop,

    /// The armed timer expired.
    Tick {
        /// Current time.
        now: I,
    },

    /// Fetch once, outside the schedule.
    Refetch,

    /// A fetch returned a valid directory.
    FetchSucceeded {
        /// Session the fetch was issued under.
        generation: Generation,
        /// Fetched directory.
        lobbies: LobbyDirectory,
    },

    /// A fetch failed (network, HTTP status, or decoding).
    FetchFailed {
        /// Session the fetch was issued under.
        generation: Generation,
        /// Error description.
        message: String,
    },
}

/// Instructions for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction<I> {
    /// Fetch the listing with `token` and report back tagged `generation`.
    Fetch {
        /// Session tag to echo in the completion event.
        generation: Generation,
        /// Bearer token.
        token: String,
    },

    /// (Re)arm the single timer to fire a [`SyncEvent::Tick`] at `deadline`.
    ArmTimer {
        /// Earliest time to tick.
        deadline: I,
    },

    /// Disarm the timer. No tick may be delivered afterwards.
    CancelTimer,

    /// The snapshot changed.
    Publish(DirectorySnapshot),
}

#[derive(Debug)]
enum Phase<I> {
    Idle,
    Polling { generation: Generation, token: String, next_tick: I, in_flight: usize },
}

/// Lobby directory synchronizer.
pub struct DirectorySync<I> {
    config: SyncConfig,
    phase: Phase<I>,
    next_generation: u64,
    snapshot: DirectorySnapshot,
}

impl<I> DirectorySync<I>
where
    I: Copy + Ord + fmt::Debug + Add<Duration, Output = I>,
{
    /// Create an idle synchronizer with an empty directory.
    pub fn new(mut config: SyncConfig) -> Self {
        if config.poll_interval < MIN_POLL_INTERVAL {
            tracing::warn!(interval = ?config.poll_interval, "poll interval too small, clamping");
            config.poll_interval = MIN_POLL_INTERVAL;
        }
        Self { config, phase: Phase::Idle, next_generation: 0, snapshot: DirectorySnapshot::default() }
    }

    /// Active configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Latest snapshot.
    pub fn snapshot(&self) -> &DirectorySnapshot {
        &self.snapshot
    }

    /// Whether a session is running.
    pub fn is_polling(&self) -> bool {
        matches!(self.phase, Phase::Polling { .. })
    }

    /// Current session, if polling.
    pub fn generation(&self) -> Option<Generation> {
        match self.phase {
            Phase::Polling { generation, .. } => Some(generation),
            Phase::Idle => None,
        }
    }

    /// Fetches of the current session not yet completed.
    pub fn in_flight(&self) -> usize {
        match self.phase {
            Phase::Polling { in_flight, .. } => in_flight,
            Phase::Idle => 0,
        }
    }

    /// Process an event and return resulting actions.
    pub fn handle(&mut self, event: SyncEvent<I>) -> Vec<SyncAction<I>> {
        match event {
            SyncEvent::Configure { token, enabled, now } => self.handle_configure(token, enabled, now),
            SyncEvent::Stop => self.handle_stop(),
            SyncEvent::Tick { now } => self.handle_tick(now),
            SyncEvent::Refetch => self.handle_refetch(),
            SyncEvent::FetchSucceeded { generation, lobbies } => {
                self.handle_completion(generation, Ok(lobbies))
            },
            SyncEvent::FetchFailed { generation, message } => {
                self.handle_completion(generation, Err(message))
            },
        }
    }

    fn handle_configure(&mut self, token: Option<String>, enabled: bool, now: I) -> Vec<SyncAction<I>> {
        let token = match token.filter(|_| enabled) {
            Some(token) => token,
            None => return self.handle_stop(),
        };

        if let Phase::Polling { token: current, .. } = &self.phase
            && *current == token
        {
            return Vec::new();
        }

        let mut actions = self.handle_stop();

        let generation = Generation(self.next_generation);
        self.next_generation += 1;
        let next_tick = now + self.config.poll_interval;

        tracing::debug!(%generation, "lobby polling started");

        actions.push(SyncAction::Fetch { generation, token: token.clone() });
        actions.push(SyncAction::ArmTimer { deadline: next_tick });
        self.phase = Phase::Polling { generation, token, next_tick, in_flight: 1 };
        actions
    }

    fn handle_stop(&mut self) -> Vec<SyncAction<I>> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Polling { generation, in_flight, .. } => {
                tracing::debug!(%generation, abandoned = in_flight, "lobby polling stopped");
                vec![SyncAction::CancelTimer]
            },
            Phase::Idle => Vec::new(),
        }
    }

    fn handle_tick(&mut self, now: I) -> Vec<SyncAction<I>> {
        let interval = self.config.poll_interval;
        let overlap = self.config.overlap;

        let Phase::Polling { generation, token, next_tick, in_flight } = &mut self.phase else {
            return Vec::new();
        };

        if now < *next_tick {
            return vec![SyncAction::ArmTimer { deadline: *next_tick }];
        }

        let mut deadline = *next_tick + interval;
        let mut skipped = 0u32;
        while deadline <= now {
            deadline = deadline + interval;
            skipped += 1;
        }
        if skipped > 0 {
            tracing::debug!(%generation, skipped, "missed poll deadlines skipped");
        }
        *next_tick = deadline;

        let mut actions = Vec::with_capacity(2);
        if overlap == OverlapPolicy::SkipIfBusy && *in_flight > 0 {
            tracing::debug!(%generation, in_flight = *in_flight, "fetch in flight, skipping tick");
        } else {
            *in_flight += 1;
            actions.push(SyncAction::Fetch { generation: *generation, token: token.clone() });
        }
        actions.push(SyncAction::ArmTimer { deadline });
        actions
    }

    fn handle_refetch(&mut self) -> Vec<SyncAction<I>> {
        let overlap = self.config.overlap;
        let Phase::Polling { generation, token, in_flight, .. } = &mut self.phase else {
            return Vec::new();
        };

        if overlap == OverlapPolicy::SkipIfBusy && *in_flight > 0 {
            tracing::debug!(%generation, "fetch in flight, ignoring refetch");
            return Vec::new();
        }

        *in_flight += 1;
        vec![SyncAction::Fetch { generation: *generation, token: token.clone() }]
    }

    fn handle_completion(
        &mut self,
        generation: Generation,
        result: Result<LobbyDirectory, String>,
    ) -> Vec<SyncAction<I>> {
        let in_flight = match &mut self.phase {
            Phase::Polling { generation: current, in_flight, .. } if *current == generation => {
                in_flight
            },
            _ => {
                tracing::debug!(%generation, "discarding completion from superseded session");
                return Vec::new();
            },
        };
        *in_flight = in_flight.saturating_sub(1);

        match result {
            Ok(lobbies) => {
                tracing::trace!(%generation, count = lobbies.len(), "lobby directory replaced");
                self.snapshot = DirectorySnapshot { lobbies, error: None };
            },
            Err(message) => {
                tracing::warn!(%generation, error = %message, "lobby fetch failed, keeping last directory");
                self.snapshot.error = Some(SyncError::new(message));
            },
        }

        vec![SyncAction::Publish(self.snapshot.clone())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lobby::{LobbyInfo, LobbyListing, LobbyStatus};

    /// Milliseconds since an arbitrary origin.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    struct Ms(u64);

    impl Add<Duration> for Ms {
        type Output = Ms;
        fn add(self, rhs: Duration) -> Ms {
            Ms(self.0 + rhs.as_millis() as u64)
        }
    }

    fn directory(ids: &[&str]) -> LobbyDirectory {
        let lobbies = ids
            .iter()
            .map(|id| LobbyInfo {
                id: (*id).to_owned(),
                name: (*id).to_owned(),
                player_count: 0,
                max_players: 5,
                pot: 0,
                status: LobbyStatus::Waiting,
            })
            .collect();
        LobbyDirectory::from_listing(LobbyListing { lobbies }).unwrap()
    }

    fn started(config: SyncConfig) -> (DirectorySync<Ms>, Generation) {
        let mut sync = DirectorySync::new(config);
        let actions =
            sync.handle(SyncEvent::Configure { token: Some("tok".into()), enabled: true, now: Ms(0) });
        let generation = sync.generation().unwrap();
        assert_eq!(
            actions,
            vec![
                SyncAction::Fetch { generation, token: "tok".into() },
                SyncAction::ArmTimer { deadline: Ms(3000) },
            ]
        );
        (sync, generation)
    }

    fn fetch_count(actions: &[SyncAction<Ms>]) -> usize {
        actions.iter().filter(|a| matches!(a, SyncAction::Fetch { .. })).count()
    }

    #[test]
    fn disabled_without_token_or_flag() {
        let mut sync = DirectorySync::<Ms>::new(SyncConfig::default());

        assert!(sync.handle(SyncEvent::Configure { token: None, enabled: true, now: Ms(0) }).is_empty());
        assert!(
            sync.handle(SyncEvent::Configure { token: Some("t".into()), enabled: false, now: Ms(0) })
                .is_empty()
        );
        assert!(sync.handle(SyncEvent::Tick { now: Ms(10_000) }).is_empty());
        assert!(sync.handle(SyncEvent::Refetch).is_empty());
        assert!(!sync.is_polling());
    }

    #[test]
    fn fixed_rate_ticks() {
        let (mut sync, generation) = started(SyncConfig::default());

        let actions = sync.handle(SyncEvent::Tick { now: Ms(3000) });
        assert_eq!(
            actions,
            vec![
                SyncAction::Fetch { generation, token: "tok".into() },
                SyncAction::ArmTimer { deadline: Ms(6000) },
            ]
        );

        // Late wake-up does not shift the schedule.
        let actions = sync.handle(SyncEvent::Tick { now: Ms(6040) });
        assert_eq!(actions.last(), Some(&SyncAction::ArmTimer { deadline: Ms(9000) }));
    }

    #[test]
    fn early_tick_rearms_without_fetching() {
        let (mut sync, _) = started(SyncConfig::default());
        assert_eq!(
            sync.handle(SyncEvent::Tick { now: Ms(2999) }),
            vec![SyncAction::ArmTimer { deadline: Ms(3000) }]
        );
    }

    #[test]
    fn missed_deadlines_are_skipped_not_bursted() {
        let (mut sync, _) = started(SyncConfig::default());

        let actions = sync.handle(SyncEvent::Tick { now: Ms(10_500) });
        assert_eq!(fetch_count(&actions), 1);
        assert_eq!(actions.last(), Some(&SyncAction::ArmTimer { deadline: Ms(12_000) }));
    }

    #[test]
    fn success_failure_success_ends_clean() {
        let (mut sync, generation) = started(SyncConfig::default());

        sync.handle(SyncEvent::FetchSucceeded { generation, lobbies: directory(&["a"]) });
        sync.handle(SyncEvent::Tick { now: Ms(3000) });
        let actions = sync.handle(SyncEvent::FetchFailed { generation, message: "boom".into() });
        assert_eq!(
            actions,
            vec![SyncAction::Publish(DirectorySnapshot {
                lobbies: directory(&["a"]),
                error: Some(SyncError::new("boom")),
            })]
        );

        sync.handle(SyncEvent::Tick { now: Ms(6000) });
        sync.handle(SyncEvent::FetchSucceeded { generation, lobbies: directory(&["b"]) });

        assert_eq!(sync.snapshot(), &DirectorySnapshot { lobbies: directory(&["b"]), error: None });
        assert_eq!(sync.in_flight(), 0);
    }

    #[test]
    fn failure_keeps_schedule_running() {
        let (mut sync, generation) = started(SyncConfig::default());
        sync.handle(SyncEvent::FetchFailed { generation, message: "down".into() });

        assert!(sync.is_polling());
        assert_eq!(fetch_count(&sync.handle(SyncEvent::Tick { now: Ms(3000) })), 1);
    }

    #[test]
    fn stop_discards_in_flight_completion() {
        let (mut sync, generation) = started(SyncConfig::default());
        sync.handle(SyncEvent::FetchSucceeded { generation, lobbies: directory(&["a"]) });
        sync.handle(SyncEvent::Tick { now: Ms(3000) });

        assert_eq!(sync.handle(SyncEvent::Stop), vec![SyncAction::CancelTimer]);
        assert!(
            sync.handle(SyncEvent::FetchSucceeded { generation, lobbies: directory(&["late"]) })
                .is_empty()
        );
        assert_eq!(sync.snapshot().lobbies, directory(&["a"]));
        assert!(sync.handle(SyncEvent::Tick { now: Ms(6000) }).is_empty());
    }

    #[test]
    fn disable_retains_directory() {
        let (mut sync, generation) = started(SyncConfig::default());
        sync.handle(SyncEvent::FetchSucceeded { generation, lobbies: directory(&["a"]) });

        let actions = sync.handle(SyncEvent::Configure { token: None, enabled: true, now: Ms(100) });
        assert_eq!(actions, vec![SyncAction::CancelTimer]);
        assert_eq!(sync.snapshot().lobbies, directory(&["a"]));
    }

    #[test]
    fn restart_opens_new_session() {
        let (mut sync, old) = started(SyncConfig::default());
        sync.handle(SyncEvent::Stop);

        let actions =
            sync.handle(SyncEvent::Configure { token: Some("tok".into()), enabled: true, now: Ms(500) });
        let new = sync.generation().unwrap();
        assert!(new > old);
        assert_eq!(actions.last(), Some(&SyncAction::ArmTimer { deadline: Ms(3500) }));

        assert!(sync.handle(SyncEvent::FetchFailed { generation: old, message: "stale".into() }).is_empty());
        assert!(sync.snapshot().error.is_none());
    }

    #[test]
    fn token_change_restarts_session() {
        let (mut sync, old) = started(SyncConfig::default());

        let actions =
            sync.handle(SyncEvent::Configure { token: Some("other".into()), enabled: true, now: Ms(10) });
        let new = sync.generation().unwrap();

        assert_ne!(new, old);
        assert_eq!(actions[0], SyncAction::CancelTimer);
        assert_eq!(actions[1], SyncAction::Fetch { generation: new, token: "other".into() });
    }

    #[test]
    fn same_configuration_is_idempotent() {
        let (mut sync, generation) = started(SyncConfig::default());
        let actions =
            sync.handle(SyncEvent::Configure { token: Some("tok".into()), enabled: true, now: Ms(1000) });

        assert!(actions.is_empty());
        assert_eq!(sync.generation(), Some(generation));
    }

    #[test]
    fn last_write_wins_overlaps() {
        let (mut sync, generation) = started(SyncConfig::default());

        assert_eq!(fetch_count(&sync.handle(SyncEvent::Tick { now: Ms(3000) })), 1);
        assert_eq!(sync.in_flight(), 2);

        // Second fetch resolves first; the slower first fetch then overwrites it.
        sync.handle(SyncEvent::FetchSucceeded { generation, lobbies: directory(&["fresh"]) });
        sync.handle(SyncEvent::FetchSucceeded { generation, lobbies: directory(&["stale"]) });
        assert_eq!(sync.snapshot().lobbies, directory(&["stale"]));
    }

    #[test]
    fn skip_if_busy_drops_overlapping_ticks() {
        let config = SyncConfig { overlap: OverlapPolicy::SkipIfBusy, ..SyncConfig::default() };
        let (mut sync, generation) = started(config);

        let actions = sync.handle(SyncEvent::Tick { now: Ms(3000) });
        assert_eq!(actions, vec![SyncAction::ArmTimer { deadline: Ms(6000) }]);
        assert!(sync.handle(SyncEvent::Refetch).is_empty());

        sync.handle(SyncEvent::FetchSucceeded { generation, lobbies: directory(&["a"]) });
        assert_eq!(fetch_count(&sync.handle(SyncEvent::Tick { now: Ms(6000) })), 1);
    }

    #[test]
    fn refetch_fetches_without_moving_schedule() {
        let (mut sync, generation) = started(SyncConfig::default());

        assert_eq!(
            sync.handle(SyncEvent::Refetch),
            vec![SyncAction::Fetch { generation, token: "tok".into() }]
        );
        assert_eq!(
            sync.handle(SyncEvent::Tick { now: Ms(3000) }).last(),
            Some(&SyncAction::ArmTimer { deadline: Ms(6000) })
        );
    }

    #[test]
    fn zero_interval_is_clamped() {
        let sync = DirectorySync::<Ms>::new(SyncConfig {
            poll_interval: Duration::ZERO,
            overlap: OverlapPolicy::LastWriteWins,
        });
        assert_eq!(sync.config().poll_interval, MIN_POLL_INTERVAL);
    }
}
