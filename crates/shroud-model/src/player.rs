//! Player identity, opaque player-state pieces, and the world primitive.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Location;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// A newtype over `u64` so a player id can't be confused with any other
/// number. `#[serde(transparent)]` stores it as a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Timed status effects
// ---------------------------------------------------------------------------

/// An active, time-limited status effect (blindness, speed, ...).
///
/// `effect` is the host's namespaced key (e.g. `"minecraft:blindness"`);
/// the core never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEffect {
    pub effect: String,
    /// Remaining duration in host ticks.
    pub duration_ticks: u32,
    #[serde(default)]
    pub amplifier: u8,
    #[serde(default)]
    pub ambient: bool,
    #[serde(default = "default_true")]
    pub particles: bool,
    #[serde(default = "default_true")]
    pub icon: bool,
}

fn default_true() -> bool {
    true
}

impl TimedEffect {
    pub fn new(effect: impl Into<String>, duration_ticks: u32) -> Self {
        Self {
            effect: effect.into(),
            duration_ticks,
            amplifier: 0,
            ambient: false,
            particles: true,
            icon: true,
        }
    }

    /// Suppresses the particle swirl around the player.
    pub fn without_particles(mut self) -> Self {
        self.particles = false;
        self
    }
}

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

/// A slot that can hold one item stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentSlot {
    /// Main inventory: hotbar and storage, `0..36`.
    Storage(u8),
    Helmet,
    Chestplate,
    Leggings,
    Boots,
    MainHand,
    OffHand,
}

/// An item stack in the host's own serialized form (e.g. base64 NBT).
///
/// The core stores and hands these back; it never decodes them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemBlob(pub String);

// ---------------------------------------------------------------------------
// WorldAccess
// ---------------------------------------------------------------------------

/// The host primitives for finding and moving players.
///
/// Implemented by the host game server. All methods are synchronous and
/// run on the host's game-logic thread.
pub trait WorldAccess {
    /// Whether the named world is currently loaded.
    fn is_world_loaded(&self, world: &str) -> bool;

    /// Whether the player is connected right now. Offline players are
    /// skipped by everything that would touch their entity.
    fn is_online(&self, player: PlayerId) -> bool;

    /// Teleports the player. Callers check [`is_world_loaded`] first; the
    /// move is then assumed to succeed synchronously.
    ///
    /// [`is_world_loaded`]: WorldAccess::is_world_loaded
    fn relocate(&self, player: PlayerId, to: &Location);
}
