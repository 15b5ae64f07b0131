//! Player state snapshots for Shroud.
//!
//! Before a player enters a lobby their whole transferable state
//! (position, every equipment slot, progression, active effects) is
//! captured and written to durable storage. When they leave, the capture
//! is put back exactly and then deleted.
//!
//! # How it fits in the stack
//!
//! ```text
//! Match layer (above)  ← captures on join, restores on leave / dismiss
//!     ↕
//! Snapshot layer (this crate)  ← SnapshotManager + SnapshotStore
//!     ↕
//! Host (below)  ← PlayerStateAccess: read and write a live player
//! ```
//!
//! At most one live snapshot exists per player. A second capture is
//! refused rather than overwriting the first; that first capture is the
//! only copy of the player's real inventory.

mod error;
mod manager;
mod state;
mod store;

pub use error::SnapshotError;
pub use manager::SnapshotManager;
pub use state::{PlayerSnapshot, PlayerState, PlayerStateAccess, Progression, SlotContents};
pub use store::{JsonDirSnapshotStore, MemorySnapshotStore, SnapshotStore};
