//! Match configuration and the session phase machine.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// MatchConfig
// ---------------------------------------------------------------------------

/// Tunables shared by every lobby's session.
///
/// Every field has a default, so a partial `[game]` table in the config
/// file is enough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// A countdown that fires while anyone joined less than this many
    /// seconds ago is pushed back.
    pub grace_window_secs: u64,

    /// How far a deferred countdown is pushed back.
    pub grace_retry_secs: u64,

    /// Upper bound on arenas offered in a vote. At least 1.
    pub vote_candidates: usize,

    pub vote_timeout_secs: u64,

    pub match_duration_secs: u64,

    /// Length of the blindness applied while players are moved.
    pub blindness_ticks: u32,

    /// Seconds-remaining marks that get a reminder.
    pub reminder_marks: Vec<u64>,

    /// Every second at or below this gets a reminder too.
    pub final_countdown_secs: u64,

    /// Seeds the role draw, arena shuffle, and vote tie-break. `None`
    /// seeds from the OS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            grace_window_secs: 15,
            grace_retry_secs: 5,
            vote_candidates: 3,
            vote_timeout_secs: 15,
            match_duration_secs: 300,
            blindness_ticks: 20,
            reminder_marks: vec![60, 30, 10],
            final_countdown_secs: 5,
            rng_seed: None,
        }
    }
}

impl MatchConfig {
    /// Clamps values that would stall or spin the session.
    pub fn validated(mut self) -> Self {
        if self.vote_candidates == 0 {
            warn!("vote_candidates is 0, using 1");
            self.vote_candidates = 1;
        }
        if self.grace_retry_secs == 0 {
            warn!("grace_retry_secs is 0, using 1");
            self.grace_retry_secs = 1;
        }
        if self.vote_timeout_secs == 0 {
            warn!("vote_timeout_secs is 0, using 1");
            self.vote_timeout_secs = 1;
        }
        if self.match_duration_secs == 0 {
            warn!("match_duration_secs is 0, using 1");
            self.match_duration_secs = 1;
        }
        self
    }

    /// Whether `remaining` seconds gets a reminder.
    pub fn is_reminder(&self, remaining: u64) -> bool {
        remaining <= self.final_countdown_secs || self.reminder_marks.contains(&remaining)
    }
}

// ---------------------------------------------------------------------------
// MatchPhase
// ---------------------------------------------------------------------------

/// Why a session stopped short of starting a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StallReason {
    /// The lobby has no eligible arenas.
    NoEligibleArenas,
    /// Every eligible arena is claimed by another lobby (or unknown).
    NoFreeArenas,
    /// The chosen arena's world isn't loaded.
    WorldUnavailable,
}

impl fmt::Display for StallReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoEligibleArenas => "no arenas are set up for this lobby",
            Self::NoFreeArenas => "every arena is in use",
            Self::WorldUnavailable => "the arena world is not loaded",
        })
    }
}

/// Where a session is in its lifecycle.
///
/// ```text
/// Waiting ─→ Countdown ─→ [roles] ─→ ArenaSelection ─→ InProgress ─→ PostMatch
///    ↑           │                    (vote, or direct)                │
///    └───────────┘ (drops below 2)                                     │
///    └──────────────────────────── reset() ─────────────────────────────┘
/// ```
///
/// Role assignment runs synchronously between `Countdown` and arena
/// selection, so it has no phase of its own. A step that can't proceed
/// leaves the session `Stalled` until it is force-started or reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchPhase {
    Waiting,
    Countdown,
    /// Arena vote open.
    ArenaSelection,
    InProgress,
    /// The match has ended; occupants and roles are kept until reset.
    PostMatch,
    Stalled(StallReason),
}

impl MatchPhase {
    /// Whether a match (vote or round) is running.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::ArenaSelection | Self::InProgress)
    }

    /// Whether occupants may still pick their own role.
    pub fn allows_role_choice(&self) -> bool {
        matches!(self, Self::Waiting | Self::Countdown | Self::Stalled(_))
    }
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Countdown => write!(f, "Countdown"),
            Self::ArenaSelection => write!(f, "ArenaSelection"),
            Self::InProgress => write!(f, "InProgress"),
            Self::PostMatch => write!(f, "PostMatch"),
            Self::Stalled(reason) => write!(f, "Stalled({reason:?})"),
        }
    }
}
