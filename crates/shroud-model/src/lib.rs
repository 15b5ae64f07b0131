//! Shared data model for Shroud.
//!
//! Every other crate in the workspace speaks in these types:
//!
//! - **Identity** ([`PlayerId`]): who a player is.
//! - **Geometry** ([`BlockPos`], [`Location`], [`Pose`], [`Region`]): where
//!   lobbies, arenas, markers, and players are.
//! - **Player state** ([`TimedEffect`], [`EquipmentSlot`], [`ItemBlob`]):
//!   the opaque pieces of a player the core moves around without
//!   interpreting them.
//! - **Host primitives** ([`WorldAccess`]): the minimum the host game
//!   server must provide to move players between worlds.
//! - **Codec** ([`Codec`], [`JsonCodec`]): how records are turned into
//!   bytes for the durable stores.
//! - **Errors** ([`ErrorKind`], [`CodecError`]).
//!
//! # Architecture
//!
//! ```text
//! registry / snapshot / match  →  model (this crate)
//! ```
//!
//! The model crate has no behaviour of its own beyond geometry helpers.
//! It does not know about lobbies, sessions, or timers.

mod codec;
mod error;
mod geometry;
mod player;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::{CodecError, ErrorKind};
pub use geometry::{BlockPos, Location, Pose, Region};
pub use player::{EquipmentSlot, ItemBlob, PlayerId, TimedEffect, WorldAccess};
