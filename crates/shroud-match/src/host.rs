//! What the host game server provides to the match core.

use shroud_model::PlayerId;
use shroud_snapshot::PlayerStateAccess;

use crate::{Notice, Role};

/// The full set of host primitives a match needs.
///
/// On top of moving players and reading or writing their state
/// ([`PlayerStateAccess`]), the host equips role kits and shows notices.
/// Both are fire-and-forget; the core never waits on them.
pub trait MatchHost: PlayerStateAccess {
    /// Gives the player the item kit for `role`.
    fn equip_role_kit(&self, player: PlayerId, role: Role);

    /// Shows a notice to one player. Offline players are never notified.
    fn notify(&self, player: PlayerId, notice: &Notice);
}
