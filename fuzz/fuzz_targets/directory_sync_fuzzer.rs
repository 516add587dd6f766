//! Fuzz target for the DirectorySync state machine
//!
//! # Strategy
//!
//! - Arbitrary interleavings of configure, stop, tick, refetch and
//!   completions, including completions for sessions long since replaced
//! - Time moves forward by arbitrary steps, so ticks can arrive early, on
//!   time, or several intervals late
//!
//! # Invariants
//!
//! - A completion from a superseded session never publishes
//! - No timer is armed while idle, and armed deadlines lie in the future
//! - Under SkipIfBusy at most one fetch is outstanding
//! - NEVER panic

#![no_main]

use std::{ops::Add, time::Duration};

use arbitrary::Arbitrary;
use bingo_core::{
    DirectorySync, Generation, LobbyDirectory, OverlapPolicy, SyncAction, SyncConfig, SyncEvent,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Ms(u64);

impl Add<Duration> for Ms {
    type Output = Ms;
    fn add(self, rhs: Duration) -> Ms {
        Ms(self.0.saturating_add(u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX)))
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Configure { token: Option<u8>, enabled: bool },
    Stop,
    Advance { millis: u16 },
    Tick,
    Refetch,
    Complete { issued: u8, success: bool },
}

#[derive(Debug, Clone, Arbitrary)]
struct Input {
    skip_if_busy: bool,
    interval_ms: u16,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let overlap =
        if input.skip_if_busy { OverlapPolicy::SkipIfBusy } else { OverlapPolicy::LastWriteWins };
    let config =
        SyncConfig { poll_interval: Duration::from_millis(u64::from(input.interval_ms)), overlap };
    let mut sync = DirectorySync::new(config);

    let mut now = Ms(0);
    let mut issued: Vec<Generation> = Vec::new();
    let mut armed: Option<Ms> = None;

    for op in input.ops {
        let event = match op {
            Op::Configure { token, enabled } => SyncEvent::Configure {
                token: token.map(|t| format!("tok-{}", t % 4)),
                enabled,
                now,
            },
            Op::Stop => SyncEvent::Stop,
            Op::Advance { millis } => {
                now = now + Duration::from_millis(u64::from(millis));
                continue;
            },
            Op::Tick => match armed {
                Some(deadline) if deadline <= now => SyncEvent::Tick { now },
                _ => continue,
            },
            Op::Refetch => SyncEvent::Refetch,
            Op::Complete { issued: pick, success } => {
                if issued.is_empty() {
                    continue;
                }
                let generation = issued.remove(usize::from(pick) % issued.len());
                if success {
                    SyncEvent::FetchSucceeded { generation, lobbies: LobbyDirectory::default() }
                } else {
                    SyncEvent::FetchFailed { generation, message: "boom".into() }
                }
            },
        };

        let completing = match &event {
            SyncEvent::FetchSucceeded { generation, .. }
            | SyncEvent::FetchFailed { generation, .. } => Some(*generation),
            _ => None,
        };
        let current = sync.generation();

        for action in sync.handle(event) {
            match action {
                SyncAction::Fetch { generation, .. } => issued.push(generation),
                SyncAction::ArmTimer { deadline } => {
                    assert!(deadline > now, "deadline {deadline:?} not after {now:?}");
                    armed = Some(deadline);
                },
                SyncAction::CancelTimer => armed = None,
                SyncAction::Publish(_) => {
                    assert!(completing.is_some() && completing == current, "stale publish");
                },
            }
        }

        if !sync.is_polling() {
            assert!(armed.is_none(), "timer armed while idle");
        }
        if overlap == OverlapPolicy::SkipIfBusy {
            assert!(sync.in_flight() <= 1, "overlapping fetches under SkipIfBusy");
        }
    }
});
