//! Match lifecycle orchestration for Shroud.
//!
//! A [`MatchSession`] per lobby drives players from waiting, through a
//! countdown, role assignment, and arena selection, into a timed round and
//! back out again. The [`MatchDirector`] owns every session, keeps each
//! player in at most one lobby, and wraps joins and leaves in snapshot
//! capture and restore.
//!
//! # How it fits in the stack
//!
//! ```text
//! Runtime (above)  ← feeds ticks and commands into the director
//!     ↕
//! Match layer (this crate)  ← sessions, roles, votes, notices
//!     ↕
//! Registry / snapshot / tick (below)  ← lobbies, arena claims, timers
//! ```
//!
//! # Threading
//!
//! Everything runs on one thread. Sessions share the registries, timer
//! queue, host, and RNG through a [`MatchContext`] handed to them at
//! construction; nothing is looked up globally.

mod config;
mod context;
mod director;
mod error;
mod host;
mod notice;
mod role;
mod session;
mod vote;

pub use config::{MatchConfig, MatchPhase, StallReason};
pub use context::{MatchContext, MatchTimer, TimerKind};
pub use director::MatchDirector;
pub use error::MatchError;
pub use host::MatchHost;
pub use notice::{Channel, Notice};
pub use role::{Role, RoleKit, ShroudedKit, SurvivorKit};
pub use session::{BLINDNESS, MIN_PLAYERS, MatchSession};
pub use vote::{Ballot, draw_weighted};
