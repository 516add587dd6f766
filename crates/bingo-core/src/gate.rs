//! Join eligibility.
//!
//! A pure per-lobby decision, cheap enough to evaluate on every render.

use crate::lobby::LobbyInfo;

/// Label shown on a lobby's join control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinLabel {
    /// Seats available, game not started.
    Join,
    /// No seats left.
    Full,
    /// Game under way.
    Playing,
}

impl JoinLabel {
    /// Display text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Join => "Join",
            Self::Full => "Full",
            Self::Playing => "Playing",
        }
    }
}

/// Whether the join control is enabled and what it says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinGateDecision {
    /// Join may be invoked.
    pub enabled: bool,
    /// Control label.
    pub label: JoinLabel,
}

/// Decide whether `lobby` may be joined while a join is (or is not) already
/// in flight.
///
/// Activity outranks fullness when labelling: a full, active lobby reads
/// [`JoinLabel::Playing`].
pub fn decide(lobby: &LobbyInfo, is_joining: bool) -> JoinGateDecision {
    let is_full = lobby.is_full();
    let is_active = lobby.is_active();
    let can_join = !is_full && !is_active;

    let label = if is_active {
        JoinLabel::Playing
    } else if is_full {
        JoinLabel::Full
    } else {
        JoinLabel::Join
    };

    JoinGateDecision { enabled: can_join && !is_joining, label }
}
