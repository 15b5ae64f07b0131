//! Lobby and arena definitions for Shroud.
//!
//! - [`LobbyRegistry`]: every lobby, with its markers, countdown,
//!   eligible arenas, and spawn.
//! - [`ArenaAllocator`]: every arena, its spawn lists, and the exclusive
//!   claim a lobby holds while it plays there.
//! - [`DefinitionStore`]: where both are loaded from and saved to
//!   ([`JsonDirStore`] on disk, [`MemoryStore`] for tests).
//!
//! Both registries are plain owned values. The runtime constructs them
//! once and hands shared references to every match session; nothing here
//! is global.

mod allocator;
mod arena;
mod error;
mod lobby;
mod registry;
mod store;

pub use allocator::ArenaAllocator;
pub use arena::{Arena, SpawnGroup};
pub use error::{RegistryError, StoreError};
pub use lobby::{DEFAULT_COUNTDOWN_SECS, Lobby};
pub use registry::LobbyRegistry;
pub use store::{DefinitionStore, JsonDirStore, MemoryStore};
