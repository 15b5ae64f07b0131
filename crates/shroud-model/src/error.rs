//! Error types shared by every layer.
//!
//! Each crate in Shroud defines its own error enum, but all of them map
//! onto the same small taxonomy ([`ErrorKind`]) so callers can decide how
//! to message a failure without matching on every crate's variants.

use std::fmt;

/// The category of a failure, independent of which layer raised it.
///
/// Callers use this to pick user-facing wording: a `Conflict` is usually
/// "try again later", a `Persistence` failure is "tell an admin".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The referenced lobby, arena, occupant, or snapshot does not exist.
    NotFound,
    /// A duplicate registration or a duplicate live snapshot.
    AlreadyExists,
    /// Capacity exceeded, arena already claimed, player already an
    /// occupant, or a pose outside the lobby bounds.
    Conflict,
    /// A durable write or read failed. In-memory state still reflects the
    /// attempted change.
    Persistence,
    /// The referenced world is not loaded, so nobody can be moved there.
    WorldUnavailable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "not found",
            Self::AlreadyExists => "already exists",
            Self::Conflict => "conflict",
            Self::Persistence => "persistence",
            Self::WorldUnavailable => "world unavailable",
        };
        f.write_str(s)
    }
}

/// Errors raised while encoding or decoding a stored record.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization failed (turning a record into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed. Usually a hand-edited or truncated file.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The bytes decoded, but the record violates a model rule.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}
