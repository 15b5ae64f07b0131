//! What a snapshot holds, and the host primitives to read and write it.

use serde::{Deserialize, Serialize};
use shroud_model::{EquipmentSlot, ItemBlob, Location, PlayerId, TimedEffect, WorldAccess};

/// One occupied equipment slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotContents {
    pub slot: EquipmentSlot,
    pub item: ItemBlob,
}

/// Experience counters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Progression {
    pub level: u32,
    /// Progress towards the next level, `0.0..1.0`.
    pub progress: f32,
}

/// Everything about a player that a match may disturb.
///
/// Empty slots are simply absent from `slots`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub location: Location,
    #[serde(default)]
    pub slots: Vec<SlotContents>,
    #[serde(default)]
    pub progression: Progression,
    #[serde(default)]
    pub effects: Vec<TimedEffect>,
}

/// A stored capture of one player's state. Immutable once taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub player: PlayerId,
    pub state: PlayerState,
}

/// Host primitives for reading and overwriting a live player's state.
pub trait PlayerStateAccess: WorldAccess {
    /// The player's current state, or `None` if they aren't online.
    fn read_state(&self, player: PlayerId) -> Option<PlayerState>;

    /// Empties every equipment slot.
    fn clear_slots(&self, player: PlayerId);

    fn set_slot(&self, player: PlayerId, slot: EquipmentSlot, item: &ItemBlob);

    fn set_progression(&self, player: PlayerId, progression: Progression);

    /// Removes every active effect.
    fn clear_effects(&self, player: PlayerId);

    fn add_effect(&self, player: PlayerId, effect: &TimedEffect);
}
