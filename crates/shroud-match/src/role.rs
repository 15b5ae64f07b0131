//! Roles and the kit each one is equipped with.

use std::fmt;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use shroud_model::PlayerId;
use shroud_registry::SpawnGroup;

use crate::MatchHost;

/// Every role a player can hold in a match.
///
/// Exactly one occupant per match holds the hidden role; everyone else
/// holds one of [`Role::regular`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The hidden role. Moves unseen and hunts the rest.
    Shrouded,
    Survivor,
}

impl Role {
    /// The single hidden role.
    pub const HIDDEN: Role = Role::Shrouded;

    /// Every role in menu order.
    pub const ALL: [Role; 2] = [Role::Shrouded, Role::Survivor];

    /// The roles handed out to everyone but the hidden player.
    pub fn regular() -> &'static [Role] {
        &[Role::Survivor]
    }

    /// A regular role chosen uniformly at random.
    pub fn random_regular<R: Rng + ?Sized>(rng: &mut R) -> Role {
        Self::regular()
            .choose(rng)
            .copied()
            .unwrap_or(Role::Survivor)
    }

    pub fn is_hidden(self) -> bool {
        self == Self::HIDDEN
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Shrouded => "Shrouded",
            Self::Survivor => "Survivor",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Shrouded => "A stealthy combatant who moves unseen through the darkness.",
            Self::Survivor => {
                "A well-rounded fighter with no special tools. Relies on teamwork and awareness."
            }
        }
    }

    /// Host item key shown for this role in selection menus.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Shrouded => "minecraft:leather_chestplate",
            Self::Survivor => "minecraft:iron_chestplate",
        }
    }

    /// Which arena spawn list players of this role start from.
    pub fn spawn_group(self) -> SpawnGroup {
        if self.is_hidden() {
            SpawnGroup::Hidden
        } else {
            SpawnGroup::Regular
        }
    }

    /// The kit provider for this role.
    pub fn kit(self) -> &'static dyn RoleKit {
        match self {
            Self::Shrouded => &ShroudedKit,
            Self::Survivor => &SurvivorKit,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ---------------------------------------------------------------------------
// RoleKit
// ---------------------------------------------------------------------------

/// Equips a player for their role when the match starts.
pub trait RoleKit {
    fn equip(&self, host: &dyn MatchHost, player: PlayerId);
}

/// Hands out the survivor kit through the host.
pub struct SurvivorKit;

impl RoleKit for SurvivorKit {
    fn equip(&self, host: &dyn MatchHost, player: PlayerId) {
        host.equip_role_kit(player, Role::Survivor);
    }
}

/// The hidden role starts empty-handed; its abilities are the host's.
pub struct ShroudedKit;

impl RoleKit for ShroudedKit {
    fn equip(&self, _host: &dyn MatchHost, _player: PlayerId) {}
}
