//! The match director: one session per lobby, the join/leave flow around
//! snapshots, and timer dispatch.

use std::collections::{BTreeMap, HashMap};

use shroud_model::{BlockPos, PlayerId};
use shroud_snapshot::{SnapshotError, SnapshotManager};
use shroud_tick::{Fired, Tick};
use tracing::{debug, info, warn};

use crate::{MatchContext, MatchError, MatchSession, MatchTimer, Role};

/// Routes players and timers to the right [`MatchSession`].
///
/// Enforces that a player is in at most one lobby at a time, and wraps
/// every join and leave in a snapshot capture and restore so nothing a
/// match does to a player outlives it.
pub struct MatchDirector {
    ctx: MatchContext,
    snapshots: SnapshotManager,
    sessions: BTreeMap<String, MatchSession>,
    /// Which lobby each player is in.
    player_lobbies: HashMap<PlayerId, String>,
}

impl MatchDirector {
    /// Creates a session for every lobby currently registered.
    pub fn new(ctx: MatchContext, snapshots: SnapshotManager) -> Self {
        let mut director = Self {
            ctx,
            snapshots,
            sessions: BTreeMap::new(),
            player_lobbies: HashMap::new(),
        };
        director.sync_lobbies();
        director
    }

    pub fn context(&self) -> &MatchContext {
        &self.ctx
    }

    pub fn snapshots(&self) -> &SnapshotManager {
        &self.snapshots
    }

    /// Creates sessions for lobbies registered since the last call.
    pub fn sync_lobbies(&mut self) {
        let names: Vec<String> = self
            .ctx
            .lobbies
            .borrow()
            .names()
            .filter(|name| !self.sessions.contains_key(*name))
            .map(str::to_owned)
            .collect();
        for name in names {
            debug!(lobby = %name, "session created");
            self.sessions
                .insert(name.clone(), MatchSession::new(name, self.ctx.clone()));
        }
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn session(&self, lobby: &str) -> Option<&MatchSession> {
        self.sessions.get(lobby)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &MatchSession> {
        self.sessions.values()
    }

    /// The lobby the player is currently in.
    pub fn lobby_of(&self, player: PlayerId) -> Option<&str> {
        self.player_lobbies.get(&player).map(String::as_str)
    }

    /// The lobby whose join marker is at `pos`.
    pub fn lobby_for_join_marker(&self, pos: &BlockPos) -> Option<String> {
        self.ctx
            .lobbies
            .borrow()
            .lobby_for_join_marker(pos)
            .map(|l| l.name.clone())
    }

    /// The lobby whose leave marker is at `pos`.
    pub fn lobby_for_leave_marker(&self, pos: &BlockPos) -> Option<String> {
        self.ctx
            .lobbies
            .borrow()
            .lobby_for_leave_marker(pos)
            .map(|l| l.name.clone())
    }

    // -----------------------------------------------------------------------
    // Join / leave
    // -----------------------------------------------------------------------

    /// Snapshots the player, moves them to the lobby spawn, and adds them
    /// to the session.
    ///
    /// # Errors
    /// Checked in this order:
    /// 1. [`MatchError::LobbyNotFound`]
    /// 2. [`MatchError::AlreadyInLobby`] (any lobby)
    /// 3. [`MatchError::LobbyFull`]
    /// 4. [`MatchError::WorldUnavailable`] for the lobby's world
    /// 5. [`MatchError::Snapshot`] if the capture fails, including a live
    ///    snapshot left over from an earlier session
    pub fn join(&mut self, player: PlayerId, lobby: &str) -> Result<(), MatchError> {
        let session = self
            .sessions
            .get_mut(lobby)
            .ok_or_else(|| MatchError::LobbyNotFound(lobby.to_owned()))?;
        if let Some(current) = self.player_lobbies.get(&player) {
            return Err(MatchError::AlreadyInLobby(player, current.clone()));
        }
        if session.is_full() {
            return Err(MatchError::LobbyFull(lobby.to_owned()));
        }

        let spawn = self
            .ctx
            .lobbies
            .borrow()
            .get(lobby)
            .map(|l| l.spawn_location())
            .ok_or_else(|| MatchError::LobbyNotFound(lobby.to_owned()))?;
        let host = self.ctx.host.clone();
        if !host.is_world_loaded(&spawn.world) {
            return Err(MatchError::WorldUnavailable {
                lobby: lobby.to_owned(),
                world: spawn.world,
            });
        }

        self.snapshots.capture(&*host, player)?;
        host.relocate(player, &spawn);

        if !session.add(player) {
            // Checked above; only reachable if the session changed its mind.
            warn!(%player, %lobby, "session refused join after capture, restoring");
            self.snapshots.restore(&*host, player)?;
            return Err(MatchError::LobbyFull(lobby.to_owned()));
        }
        self.player_lobbies.insert(player, lobby.to_owned());
        Ok(())
    }

    /// Takes the player out of their lobby and restores their snapshot.
    ///
    /// The player is out of the lobby even if the restore fails; the
    /// snapshot is then kept for [`recover_player`](Self::recover_player).
    pub fn leave(&mut self, player: PlayerId) -> Result<(), MatchError> {
        let lobby = self
            .player_lobbies
            .remove(&player)
            .ok_or(MatchError::NotInAnyLobby(player))?;
        if let Some(session) = self.sessions.get_mut(&lobby) {
            session.remove(player);
        }
        let host = self.ctx.host.clone();
        self.snapshots.restore(&*host, player).inspect_err(|e| {
            warn!(%player, %lobby, error = %e, "left lobby, snapshot not restored");
        })?;
        Ok(())
    }

    /// Ends the post-match phase: empties the session and gives every
    /// former occupant their snapshot back. Returns the former occupants.
    ///
    /// Restore failures are logged and the snapshot kept.
    pub fn dismiss(&mut self, lobby: &str) -> Result<Vec<PlayerId>, MatchError> {
        let session = self
            .sessions
            .get_mut(lobby)
            .ok_or_else(|| MatchError::LobbyNotFound(lobby.to_owned()))?;
        let former = session.reset();
        let host = self.ctx.host.clone();
        for &player in &former {
            self.player_lobbies.remove(&player);
            if let Err(e) = self.snapshots.restore(&*host, player) {
                warn!(%player, %lobby, error = %e, "dismissed, snapshot not restored");
            }
        }
        info!(%lobby, players = former.len(), "lobby dismissed");
        Ok(former)
    }

    // -----------------------------------------------------------------------
    // In-lobby actions
    // -----------------------------------------------------------------------

    pub fn set_role(&mut self, player: PlayerId, role: Role) -> Result<(), MatchError> {
        self.session_of_mut(player)?.set_role(player, role)
    }

    pub fn record_vote(&mut self, player: PlayerId, arena: &str) -> Result<(), MatchError> {
        self.session_of_mut(player)?.record_vote(player, arena)
    }

    /// See [`MatchSession::force_start`].
    pub fn force_start(&mut self, lobby: &str) -> Result<bool, MatchError> {
        let session = self
            .sessions
            .get_mut(lobby)
            .ok_or_else(|| MatchError::LobbyNotFound(lobby.to_owned()))?;
        Ok(session.force_start())
    }

    fn session_of_mut(&mut self, player: PlayerId) -> Result<&mut MatchSession, MatchError> {
        let lobby = self
            .player_lobbies
            .get(&player)
            .ok_or(MatchError::NotInAnyLobby(player))?;
        self.sessions
            .get_mut(lobby)
            .ok_or_else(|| MatchError::LobbyNotFound(lobby.clone()))
    }

    // -----------------------------------------------------------------------
    // Recovery
    // -----------------------------------------------------------------------

    /// Restores a player whose snapshot outlived their lobby (they
    /// disconnected mid-match, or the process restarted). Returns whether
    /// anything was restored.
    pub fn recover_player(&mut self, player: PlayerId) -> Result<bool, MatchError> {
        if self.player_lobbies.contains_key(&player) || !self.snapshots.has_snapshot(player)? {
            return Ok(false);
        }
        let host = self.ctx.host.clone();
        self.snapshots.restore(&*host, player)?;
        info!(%player, "stranded player restored");
        Ok(true)
    }

    /// Restores every online player with a leftover snapshot. Returns the
    /// players restored; failures are logged and left for later.
    pub fn recover_stranded(&mut self) -> Result<Vec<PlayerId>, MatchError> {
        let host = self.ctx.host.clone();
        let mut restored = Vec::new();
        for player in self.snapshots.pending()? {
            if !host.is_online(player) {
                continue;
            }
            match self.recover_player(player) {
                Ok(true) => restored.push(player),
                Ok(false) => {}
                Err(MatchError::Snapshot(SnapshotError::WorldUnavailable { world, .. })) => {
                    warn!(%player, %world, "stranded player's world not loaded");
                }
                Err(e) => warn!(%player, error = %e, "could not restore stranded player"),
            }
        }
        Ok(restored)
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Runs every timer due up to and including `tick`, in order, then
    /// moves the clock to `tick`.
    pub fn advance_to(&mut self, tick: Tick) {
        while let Some(fired) = self.next_due(tick) {
            match self.sessions.get_mut(&fired.event.lobby) {
                Some(session) => session.on_timer(&fired),
                None => warn!(lobby = %fired.event.lobby, "timer for unknown lobby"),
            }
        }
        self.ctx.timers.borrow_mut().settle(tick);
    }

    /// Advances the clock by `ticks`.
    pub fn advance_by(&mut self, ticks: u64) {
        let target = self.now().after(ticks);
        self.advance_to(target);
    }

    /// Advances the clock by whole seconds.
    pub fn advance_secs(&mut self, secs: u64) {
        self.advance_by(self.ctx.ticks(secs));
    }

    pub fn now(&self) -> Tick {
        self.ctx.now()
    }

    fn next_due(&self, tick: Tick) -> Option<Fired<MatchTimer>> {
        self.ctx.timers.borrow_mut().pop_due(tick)
    }
}
