//! The lobby record: where players gather before a match.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use shroud_model::{BlockPos, Location, Pose, Region};

/// Countdown used when a lobby has none configured.
pub const DEFAULT_COUNTDOWN_SECS: u32 = 30;

/// A registered lobby.
///
/// Lobbies are created by an admin and live for the whole process; every
/// field here is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lobby {
    pub name: String,
    pub region: Region,
    /// Countdown length in seconds. `0` means unset.
    #[serde(default)]
    countdown_secs: u32,
    /// Blocks that add the clicking player to this lobby.
    #[serde(default)]
    pub join_markers: Vec<BlockPos>,
    /// Blocks that take the clicking player out of this lobby.
    #[serde(default)]
    pub leave_markers: Vec<BlockPos>,
    /// Arenas this lobby may play in.
    #[serde(default)]
    pub eligible_arenas: BTreeSet<String>,
    /// Overrides the region's floor centre as the spot players are moved to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn: Option<Pose>,
}

impl Lobby {
    pub fn new(name: impl Into<String>, region: Region) -> Self {
        Self {
            name: name.into(),
            region,
            countdown_secs: 0,
            join_markers: Vec::new(),
            leave_markers: Vec::new(),
            eligible_arenas: BTreeSet::new(),
            spawn: None,
        }
    }

    /// Maximum number of occupants.
    pub fn capacity(&self) -> usize {
        self.region.capacity
    }

    /// Countdown length, falling back to [`DEFAULT_COUNTDOWN_SECS`].
    pub fn countdown_secs(&self) -> u32 {
        if self.countdown_secs == 0 {
            DEFAULT_COUNTDOWN_SECS
        } else {
            self.countdown_secs
        }
    }

    pub(crate) fn set_countdown_secs(&mut self, secs: u32) {
        self.countdown_secs = secs;
    }

    /// Where joining players are moved to.
    pub fn spawn_location(&self) -> Location {
        match self.spawn {
            Some(pose) => Location::new(self.region.world.clone(), pose),
            None => self.region.center_location(),
        }
    }

    pub fn has_join_marker(&self, pos: &BlockPos) -> bool {
        self.join_markers.contains(pos)
    }

    pub fn has_leave_marker(&self, pos: &BlockPos) -> bool {
        self.leave_markers.contains(pos)
    }

    /// Eligible arena names as an owned list.
    pub fn eligible(&self) -> Vec<String> {
        self.eligible_arenas.iter().cloned().collect()
    }
}
