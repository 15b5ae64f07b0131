//! Capture and restore.

use shroud_model::PlayerId;
use tracing::{debug, info, warn};

use crate::{PlayerSnapshot, PlayerStateAccess, SnapshotError, SnapshotStore};

/// Takes and gives back player snapshots.
///
/// ## Lifecycle
///
/// ```text
/// capture() ──→ [live snapshot on disk] ──→ restore() ──→ [deleted]
///     │                                          │
///     └─ AlreadyExists if one is live            └─ NotFound if none
/// ```
pub struct SnapshotManager {
    store: Box<dyn SnapshotStore>,
}

impl SnapshotManager {
    pub fn new(store: Box<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    /// Records the player's current state and writes it to the store.
    ///
    /// # Errors
    /// - [`SnapshotError::AlreadyExists`] if a live snapshot exists. The
    ///   stored one is not touched.
    /// - [`SnapshotError::PlayerOffline`] if the host can't read the player.
    /// - A persistence error if the write fails; nothing is captured then.
    pub fn capture<H>(&self, host: &H, player: PlayerId) -> Result<PlayerSnapshot, SnapshotError>
    where
        H: PlayerStateAccess + ?Sized,
    {
        if self.store.exists(player)? {
            warn!(%player, "refusing to overwrite live snapshot");
            return Err(SnapshotError::AlreadyExists(player));
        }
        let state = host
            .read_state(player)
            .ok_or(SnapshotError::PlayerOffline(player))?;
        let snapshot = PlayerSnapshot { player, state };
        self.store.save(&snapshot).inspect_err(|e| {
            warn!(%player, error = %e, "failed to save snapshot");
        })?;
        debug!(
            %player,
            at = %snapshot.state.location,
            slots = snapshot.state.slots.len(),
            effects = snapshot.state.effects.len(),
            "snapshot captured"
        );
        Ok(snapshot)
    }

    /// Puts the player back exactly as captured and deletes the snapshot.
    ///
    /// Slots missing from the capture end up empty, and effects the
    /// player picked up since are removed.
    ///
    /// # Errors
    /// - [`SnapshotError::NotFound`] if there is no live snapshot.
    /// - [`SnapshotError::PlayerOffline`] or
    ///   [`SnapshotError::WorldUnavailable`] if the player can't be moved
    ///   back right now. The snapshot is kept for a later retry.
    /// - A persistence error if the delete fails. The player has been
    ///   restored by then.
    pub fn restore<H>(&self, host: &H, player: PlayerId) -> Result<(), SnapshotError>
    where
        H: PlayerStateAccess + ?Sized,
    {
        let snapshot = self
            .store
            .load(player)?
            .ok_or(SnapshotError::NotFound(player))?;
        let state = &snapshot.state;

        if !host.is_online(player) {
            return Err(SnapshotError::PlayerOffline(player));
        }
        if !host.is_world_loaded(&state.location.world) {
            warn!(%player, world = %state.location.world, "cannot restore, world not loaded");
            return Err(SnapshotError::WorldUnavailable {
                player,
                world: state.location.world.clone(),
            });
        }

        host.relocate(player, &state.location);
        host.clear_slots(player);
        for contents in &state.slots {
            host.set_slot(player, contents.slot, &contents.item);
        }
        host.set_progression(player, state.progression);
        host.clear_effects(player);
        for effect in &state.effects {
            host.add_effect(player, effect);
        }

        self.store.delete(player).inspect_err(|e| {
            warn!(%player, error = %e, "restored, but failed to delete snapshot");
        })?;
        debug!(%player, to = %state.location, "snapshot restored");
        Ok(())
    }

    /// Whether the player has a live snapshot.
    pub fn has_snapshot(&self, player: PlayerId) -> Result<bool, SnapshotError> {
        self.store.exists(player)
    }

    /// Players whose snapshots were never restored, e.g. because the
    /// process stopped mid-match.
    pub fn pending(&self) -> Result<Vec<PlayerId>, SnapshotError> {
        let players = self.store.list()?;
        if !players.is_empty() {
            info!(count = players.len(), "found unrestored snapshots");
        }
        Ok(players)
    }
}
