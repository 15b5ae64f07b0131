//! The arena allocator: arena definitions plus exclusive claims.

use std::collections::BTreeMap;
use std::rc::Rc;

use shroud_model::{BlockPos, Location, Pose, Region};
use tracing::{debug, info, warn};

use crate::{Arena, DefinitionStore, RegistryError, SpawnGroup};

/// Owns all arenas and decides which lobby may use each one.
///
/// A claim is the only state shared between lobbies. [`claim`] checks and
/// sets in one call, so two lobbies can never hold the same arena.
///
/// [`claim`]: ArenaAllocator::claim
pub struct ArenaAllocator {
    arenas: BTreeMap<String, Arena>,
    store: Rc<dyn DefinitionStore>,
}

impl ArenaAllocator {
    pub fn new(store: Rc<dyn DefinitionStore>) -> Self {
        Self {
            arenas: BTreeMap::new(),
            store,
        }
    }

    /// Loads every stored arena, all unclaimed.
    pub fn load(store: Rc<dyn DefinitionStore>) -> Result<Self, RegistryError> {
        let mut allocator = Self::new(store);
        for mut arena in allocator.store.load_arenas().map_err(RegistryError::Load)? {
            arena.claimed_by = None;
            allocator.arenas.insert(arena.name.clone(), arena);
        }
        info!(count = allocator.arenas.len(), "arenas loaded");
        Ok(allocator)
    }

    // -----------------------------------------------------------------------
    // Admin
    // -----------------------------------------------------------------------

    /// Creates or replaces an arena's region. Spawn lists and any live
    /// claim are kept when replacing.
    pub fn register(&mut self, name: &str, region: Region) -> Result<(), RegistryError> {
        match self.arenas.get_mut(name) {
            Some(existing) => {
                existing.region = region;
                info!(arena = %name, "arena region replaced");
            }
            None => {
                self.arenas.insert(name.to_owned(), Arena::new(name, region));
                info!(arena = %name, "arena registered");
            }
        }
        self.persist(name)
    }

    /// Appends a spawn pose to one of the arena's lists.
    pub fn add_spawn(&mut self, arena: &str, group: SpawnGroup, pose: Pose) -> Result<(), RegistryError> {
        self.arenas
            .get_mut(arena)
            .ok_or_else(|| RegistryError::ArenaNotFound(arena.to_owned()))?
            .spawns_mut(group)
            .push(pose);
        self.persist(arena)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn get(&self, name: &str) -> Option<&Arena> {
        self.arenas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.arenas.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arena> {
        self.arenas.values()
    }

    pub fn len(&self) -> usize {
        self.arenas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arenas.is_empty()
    }

    /// The candidates that exist and are not claimed, in the given order.
    pub fn list_available<S: AsRef<str>>(&self, candidates: &[S]) -> Vec<String> {
        candidates
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| self.arenas.get(*name).is_some_and(|a| !a.is_claimed()))
            .map(str::to_owned)
            .collect()
    }

    /// The arena whose region contains `pos`.
    pub fn arena_containing(&self, pos: &BlockPos) -> Option<&Arena> {
        self.arenas.values().find(|a| a.region.contains_block(pos))
    }

    /// The spawn for the `index`-th player of `group`, wrapping around
    /// the list. `None` if the arena is unknown.
    pub fn spawn_for(&self, arena: &str, group: SpawnGroup, index: usize) -> Option<Location> {
        self.arenas.get(arena).map(|a| a.spawn_for(group, index))
    }

    // -----------------------------------------------------------------------
    // Claims
    // -----------------------------------------------------------------------

    /// Claims the arena for `lobby` if it exists and is unclaimed.
    /// Returns whether the claim was taken. Never blocks.
    pub fn claim(&mut self, arena: &str, lobby: &str) -> bool {
        let Some(entry) = self.arenas.get_mut(arena) else {
            return false;
        };
        if let Some(holder) = &entry.claimed_by {
            debug!(arena = %arena, %lobby, %holder, "claim refused");
            return false;
        }
        entry.claimed_by = Some(lobby.to_owned());
        debug!(arena = %arena, %lobby, "arena claimed");
        true
    }

    /// Clears the claim, whoever holds it. Idempotent.
    pub fn release(&mut self, arena: &str) {
        if let Some(entry) = self.arenas.get_mut(arena) {
            if let Some(holder) = entry.claimed_by.take() {
                debug!(arena = %arena, lobby = %holder, "arena released");
            }
        }
    }

    /// The lobby holding the claim on `arena`.
    pub fn claimed_by(&self, arena: &str) -> Option<&str> {
        self.arenas.get(arena).and_then(Arena::claimed_by)
    }

    fn persist(&self, name: &str) -> Result<(), RegistryError> {
        let Some(arena) = self.arenas.get(name) else {
            return Ok(());
        };
        self.store.save_arena(arena).map_err(|source| {
            warn!(arena = %name, error = %source, "failed to save arena");
            RegistryError::Persistence {
                record: format!("arena {name}"),
                source,
            }
        })
    }
}
