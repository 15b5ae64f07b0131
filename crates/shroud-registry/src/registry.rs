//! The lobby registry: every lobby definition, keyed by name.

use std::collections::BTreeMap;
use std::rc::Rc;

use shroud_model::{BlockPos, Pose, Region};
use tracing::{info, warn};

use crate::{DefinitionStore, Lobby, RegistryError};

/// Owns all lobby definitions.
///
/// Loaded once from a [`DefinitionStore`] at startup. Every mutation is
/// written back immediately; a failed write returns
/// [`RegistryError::Persistence`] but the in-memory change stays.
pub struct LobbyRegistry {
    lobbies: BTreeMap<String, Lobby>,
    store: Rc<dyn DefinitionStore>,
}

impl LobbyRegistry {
    /// An empty registry writing to `store`. Nothing is loaded.
    pub fn new(store: Rc<dyn DefinitionStore>) -> Self {
        Self {
            lobbies: BTreeMap::new(),
            store,
        }
    }

    /// Loads every stored lobby.
    pub fn load(store: Rc<dyn DefinitionStore>) -> Result<Self, RegistryError> {
        let mut registry = Self::new(store);
        for lobby in registry.store.load_lobbies().map_err(RegistryError::Load)? {
            registry.lobbies.insert(lobby.name.clone(), lobby);
        }
        info!(count = registry.lobbies.len(), "lobbies loaded");
        Ok(registry)
    }

    /// Registers a new lobby.
    ///
    /// # Errors
    /// [`RegistryError::LobbyExists`] if the name is taken; the existing
    /// lobby is left untouched.
    pub fn register(&mut self, name: &str, region: Region) -> Result<&Lobby, RegistryError> {
        if self.lobbies.contains_key(name) {
            return Err(RegistryError::LobbyExists(name.to_owned()));
        }
        self.lobbies
            .insert(name.to_owned(), Lobby::new(name, region));
        info!(lobby = %name, "lobby registered");
        self.persist(name)?;
        self.get(name).ok_or_else(|| RegistryError::LobbyNotFound(name.to_owned()))
    }

    pub fn get(&self, name: &str) -> Option<&Lobby> {
        self.lobbies.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lobbies.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.lobbies.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lobby> {
        self.lobbies.values()
    }

    pub fn len(&self) -> usize {
        self.lobbies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lobbies.is_empty()
    }

    pub fn add_join_marker(&mut self, lobby: &str, pos: BlockPos) -> Result<(), RegistryError> {
        self.lobby_mut(lobby)?.join_markers.push(pos);
        self.persist(lobby)
    }

    pub fn add_leave_marker(&mut self, lobby: &str, pos: BlockPos) -> Result<(), RegistryError> {
        self.lobby_mut(lobby)?.leave_markers.push(pos);
        self.persist(lobby)
    }

    /// Sets the countdown length. `0` clears it back to the default.
    pub fn set_countdown(&mut self, lobby: &str, secs: u32) -> Result<(), RegistryError> {
        self.lobby_mut(lobby)?.set_countdown_secs(secs);
        self.persist(lobby)
    }

    /// Sets the explicit spawn pose.
    ///
    /// # Errors
    /// [`RegistryError::SpawnOutOfBounds`] if a player standing at `pose`
    /// would be outside the lobby region.
    pub fn set_spawn(&mut self, lobby: &str, pose: Pose) -> Result<(), RegistryError> {
        let entry = self.lobby_mut(lobby)?;
        if !entry.region.contains_point(pose.x, pose.y, pose.z) {
            return Err(RegistryError::SpawnOutOfBounds {
                lobby: lobby.to_owned(),
                x: pose.x,
                y: pose.y,
                z: pose.z,
            });
        }
        entry.spawn = Some(pose);
        self.persist(lobby)
    }

    /// Adds an arena to the lobby's eligible set. Returns `false` if it
    /// was already there (nothing is written).
    ///
    /// The arena name is not checked against the allocator; unknown names
    /// are skipped at selection time.
    pub fn add_eligible_arena(&mut self, lobby: &str, arena: &str) -> Result<bool, RegistryError> {
        if !self.lobby_mut(lobby)?.eligible_arenas.insert(arena.to_owned()) {
            return Ok(false);
        }
        self.persist(lobby)?;
        Ok(true)
    }

    /// Removes an arena from the lobby's eligible set. Returns `false` if
    /// it wasn't there.
    pub fn remove_eligible_arena(&mut self, lobby: &str, arena: &str) -> Result<bool, RegistryError> {
        if !self.lobby_mut(lobby)?.eligible_arenas.remove(arena) {
            return Ok(false);
        }
        self.persist(lobby)?;
        Ok(true)
    }

    /// The lobby whose join marker is at `pos`.
    pub fn lobby_for_join_marker(&self, pos: &BlockPos) -> Option<&Lobby> {
        self.lobbies.values().find(|l| l.has_join_marker(pos))
    }

    /// The lobby whose leave marker is at `pos`.
    pub fn lobby_for_leave_marker(&self, pos: &BlockPos) -> Option<&Lobby> {
        self.lobbies.values().find(|l| l.has_leave_marker(pos))
    }

    fn lobby_mut(&mut self, name: &str) -> Result<&mut Lobby, RegistryError> {
        self.lobbies
            .get_mut(name)
            .ok_or_else(|| RegistryError::LobbyNotFound(name.to_owned()))
    }

    fn persist(&self, name: &str) -> Result<(), RegistryError> {
        let Some(lobby) = self.lobbies.get(name) else {
            return Ok(());
        };
        self.store.save_lobby(lobby).map_err(|source| {
            warn!(lobby = %name, error = %source, "failed to save lobby");
            RegistryError::Persistence {
                record: format!("lobby {name}"),
                source,
            }
        })
    }
}
