//! The `Shroud` runtime: startup loading, admin operations, and the
//! host-tick driver loop.

use std::cell::RefCell;
use std::rc::Rc;

use shroud_match::{MatchContext, MatchDirector, MatchError, MatchHost, Role};
use shroud_model::{BlockPos, PlayerId, Pose, Region};
use shroud_registry::{
    ArenaAllocator, DefinitionStore, JsonDirStore, LobbyRegistry, SpawnGroup,
};
use shroud_snapshot::{JsonDirSnapshotStore, SnapshotError, SnapshotManager, SnapshotStore};
use shroud_tick::{Tick, TickClock};
use tracing::{debug, info, warn};

use crate::handle::{Command, Commands, LobbyStatus, MarkerAction};
use crate::{ShroudConfig, ShroudError};

/// The match core plus its persistent definitions.
///
/// Not `Send`: it lives on the host's game-logic thread (or a
/// current-thread runtime) and everything else reaches it through a
/// [`ShroudHandle`](crate::ShroudHandle).
pub struct Shroud {
    config: ShroudConfig,
    director: MatchDirector,
}

impl Shroud {
    /// Loads lobby and arena definitions and pending snapshots from
    /// `config.data_dir`.
    pub fn open(config: ShroudConfig, host: Rc<dyn MatchHost>) -> Result<Self, ShroudError> {
        let definitions: Rc<dyn DefinitionStore> = Rc::new(JsonDirStore::new(config.data_dir.clone()));
        let snapshots = Box::new(JsonDirSnapshotStore::new(config.snapshot_dir()));
        Self::with_stores(config, host, definitions, snapshots)
    }

    /// Like [`open`](Self::open) with caller-supplied stores.
    pub fn with_stores(
        config: ShroudConfig,
        host: Rc<dyn MatchHost>,
        definitions: Rc<dyn DefinitionStore>,
        snapshots: Box<dyn SnapshotStore>,
    ) -> Result<Self, ShroudError> {
        let lobbies = LobbyRegistry::load(Rc::clone(&definitions))?;
        let arenas = ArenaAllocator::load(definitions)?;
        info!(
            lobbies = lobbies.len(),
            arenas = arenas.len(),
            data_dir = %config.data_dir.display(),
            "definitions loaded"
        );

        let snapshots = SnapshotManager::new(snapshots);
        let pending = snapshots.pending()?;
        if !pending.is_empty() {
            warn!(count = pending.len(), "snapshots left over from a previous run");
        }

        let ctx = MatchContext::new(
            Rc::new(RefCell::new(lobbies)),
            Rc::new(RefCell::new(arenas)),
            host,
            config.game.clone(),
            config.tick,
        );
        let director = MatchDirector::new(ctx, snapshots);
        Ok(Self { config, director })
    }

    pub fn config(&self) -> &ShroudConfig {
        &self.config
    }

    pub fn director(&self) -> &MatchDirector {
        &self.director
    }

    pub fn director_mut(&mut self) -> &mut MatchDirector {
        &mut self.director
    }

    // -----------------------------------------------------------------------
    // Admin
    // -----------------------------------------------------------------------

    /// Defines a new lobby and gives it a session.
    pub fn register_lobby(&mut self, name: &str, region: Region) -> Result<(), ShroudError> {
        let registered = self
            .director
            .context()
            .lobbies
            .borrow_mut()
            .register(name, region)
            .map(|_| ());
        // A failed save still leaves the lobby in memory, so it needs a session.
        self.director.sync_lobbies();
        registered?;
        info!(lobby = %name, "lobby registered");
        Ok(())
    }

    pub fn add_join_marker(&mut self, lobby: &str, pos: BlockPos) -> Result<(), ShroudError> {
        self.with_lobbies(|l| l.add_join_marker(lobby, pos))
    }

    pub fn add_leave_marker(&mut self, lobby: &str, pos: BlockPos) -> Result<(), ShroudError> {
        self.with_lobbies(|l| l.add_leave_marker(lobby, pos))
    }

    /// `0` resets to the default countdown.
    pub fn set_countdown(&mut self, lobby: &str, secs: u32) -> Result<(), ShroudError> {
        self.with_lobbies(|l| l.set_countdown(lobby, secs))
    }

    pub fn set_lobby_spawn(&mut self, lobby: &str, pose: Pose) -> Result<(), ShroudError> {
        self.with_lobbies(|l| l.set_spawn(lobby, pose))
    }

    /// Returns `false` if the arena was already eligible.
    pub fn add_eligible_arena(&mut self, lobby: &str, arena: &str) -> Result<bool, ShroudError> {
        self.with_lobbies(|l| l.add_eligible_arena(lobby, arena))
    }

    /// Returns `false` if the arena wasn't eligible.
    pub fn remove_eligible_arena(&mut self, lobby: &str, arena: &str) -> Result<bool, ShroudError> {
        self.with_lobbies(|l| l.remove_eligible_arena(lobby, arena))
    }

    /// Defines an arena, or moves an existing one (keeping its spawns).
    pub fn register_arena(&mut self, name: &str, region: Region) -> Result<(), ShroudError> {
        self.director
            .context()
            .arenas
            .borrow_mut()
            .register(name, region)?;
        info!(arena = %name, "arena registered");
        Ok(())
    }

    pub fn add_arena_spawn(
        &mut self,
        arena: &str,
        group: SpawnGroup,
        pose: Pose,
    ) -> Result<(), ShroudError> {
        self.director
            .context()
            .arenas
            .borrow_mut()
            .add_spawn(arena, group, pose)?;
        Ok(())
    }

    fn with_lobbies<T>(
        &self,
        f: impl FnOnce(&mut LobbyRegistry) -> Result<T, shroud_registry::RegistryError>,
    ) -> Result<T, ShroudError> {
        let mut lobbies = self.director.context().lobbies.borrow_mut();
        Ok(f(&mut *lobbies)?)
    }

    // -----------------------------------------------------------------------
    // Player operations
    // -----------------------------------------------------------------------

    pub fn join(&mut self, player: PlayerId, lobby: &str) -> Result<(), ShroudError> {
        Ok(self.director.join(player, lobby)?)
    }

    pub fn leave(&mut self, player: PlayerId) -> Result<(), ShroudError> {
        Ok(self.director.leave(player)?)
    }

    pub fn set_role(&mut self, player: PlayerId, role: Role) -> Result<(), ShroudError> {
        Ok(self.director.set_role(player, role)?)
    }

    pub fn vote(&mut self, player: PlayerId, arena: &str) -> Result<(), ShroudError> {
        Ok(self.director.record_vote(player, arena)?)
    }

    pub fn force_start(&mut self, lobby: &str) -> Result<bool, ShroudError> {
        Ok(self.director.force_start(lobby)?)
    }

    pub fn dismiss(&mut self, lobby: &str) -> Result<Vec<PlayerId>, ShroudError> {
        Ok(self.director.dismiss(lobby)?)
    }

    /// A player clicked the block at `pos`. Join markers join; leave
    /// markers leave, but only the lobby they belong to.
    pub fn use_marker(
        &mut self,
        player: PlayerId,
        pos: &BlockPos,
    ) -> Result<Option<MarkerAction>, ShroudError> {
        if let Some(lobby) = self.director.lobby_for_join_marker(pos) {
            self.director.join(player, &lobby)?;
            return Ok(Some(MarkerAction::Joined(lobby)));
        }
        if let Some(lobby) = self.director.lobby_for_leave_marker(pos) {
            if self.director.lobby_of(player) != Some(lobby.as_str()) {
                return Err(MatchError::NotAnOccupant(player, lobby).into());
            }
            self.director.leave(player)?;
            return Ok(Some(MarkerAction::Left(lobby)));
        }
        Ok(None)
    }

    /// Restores a returning player's leftover snapshot, if any.
    pub fn player_connected(&mut self, player: PlayerId) -> Result<bool, ShroudError> {
        Ok(self.director.recover_player(player)?)
    }

    /// Takes a disconnecting player out of their lobby.
    ///
    /// If the host already reports them offline the snapshot can't be
    /// applied; it stays on disk for [`player_connected`].
    ///
    /// [`player_connected`]: Self::player_connected
    pub fn player_disconnected(&mut self, player: PlayerId) -> Result<bool, ShroudError> {
        if self.director.lobby_of(player).is_none() {
            return Ok(false);
        }
        match self.director.leave(player) {
            Ok(()) => Ok(true),
            Err(MatchError::Snapshot(SnapshotError::PlayerOffline(_))) => {
                debug!(%player, "snapshot kept until the player returns");
                Ok(true)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Restores every online player holding a leftover snapshot.
    pub fn recover_stranded(&mut self) -> Result<Vec<PlayerId>, ShroudError> {
        let restored = self.director.recover_stranded()?;
        if !restored.is_empty() {
            info!(count = restored.len(), "stranded players restored");
        }
        Ok(restored)
    }

    pub fn status(&self, lobby: &str) -> Result<LobbyStatus, ShroudError> {
        let session = self
            .director
            .session(lobby)
            .ok_or_else(|| MatchError::LobbyNotFound(lobby.to_owned()))?;
        Ok(LobbyStatus {
            lobby: lobby.to_owned(),
            phase: session.phase(),
            occupants: session.occupants(),
            capacity: session.capacity(),
            arena: session.arena().map(str::to_owned),
            remaining_secs: session.remaining_secs(),
        })
    }

    // -----------------------------------------------------------------------
    // Driving
    // -----------------------------------------------------------------------

    /// Runs due timers up to `tick`. For hosts that own their tick loop.
    pub fn advance_to(&mut self, tick: Tick) {
        self.director.advance_to(tick);
    }

    /// Drives the core from its own [`TickClock`] and applies commands
    /// between ticks, until [`ShroudHandle::shutdown`] is called or every
    /// handle is dropped.
    ///
    /// Stranded players are recovered first.
    ///
    /// [`ShroudHandle::shutdown`]: crate::ShroudHandle::shutdown
    pub async fn run(&mut self, mut commands: Commands) {
        let mut clock = TickClock::new(self.config.tick);
        let base = self.director.now();
        info!(
            rate_hz = clock.config().tick_rate_hz,
            lobbies = self.director.sessions().count(),
            "shroud running"
        );
        if let Err(e) = self.recover_stranded() {
            warn!(error = %e, "stranded player recovery failed");
        }

        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.apply(cmd),
                },
                tick = clock.wait_for_tick() => {
                    self.director.advance_to(base.after(tick.0));
                }
            }
        }
        info!(tick = %self.director.now(), "shroud stopped");
    }

    fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Join {
                player,
                lobby,
                reply,
            } => {
                let _ = reply.send(self.join(player, &lobby));
            }
            Command::Leave { player, reply } => {
                let _ = reply.send(self.leave(player));
            }
            Command::UseMarker { player, pos, reply } => {
                let _ = reply.send(self.use_marker(player, &pos));
            }
            Command::SetRole {
                player,
                role,
                reply,
            } => {
                let _ = reply.send(self.set_role(player, role));
            }
            Command::Vote {
                player,
                arena,
                reply,
            } => {
                let _ = reply.send(self.vote(player, &arena));
            }
            Command::ForceStart { lobby, reply } => {
                let _ = reply.send(self.force_start(&lobby));
            }
            Command::Dismiss { lobby, reply } => {
                let _ = reply.send(self.dismiss(&lobby));
            }
            Command::PlayerConnected { player, reply } => {
                let _ = reply.send(self.player_connected(player));
            }
            Command::PlayerDisconnected { player, reply } => {
                let _ = reply.send(self.player_disconnected(player));
            }
            Command::Status { lobby, reply } => {
                let _ = reply.send(self.status(&lobby));
            }
            // Handled by the loop.
            Command::Shutdown => {}
        }
    }
}
