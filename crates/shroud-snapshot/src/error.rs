//! Error types for the snapshot layer.

use std::path::PathBuf;

use shroud_model::{CodecError, ErrorKind, PlayerId};

/// Errors from capturing, restoring, or storing a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// A live snapshot already exists for this player.
    #[error("player {0} already has a live snapshot")]
    AlreadyExists(PlayerId),

    /// No live snapshot exists for this player.
    #[error("no snapshot for player {0}")]
    NotFound(PlayerId),

    /// The player isn't online, so there is nothing to read or write.
    #[error("player {0} is not online")]
    PlayerOffline(PlayerId),

    /// The snapshot's world isn't loaded. The snapshot is kept.
    #[error("world {world:?} for player {player} is not loaded")]
    WorldUnavailable { player: PlayerId, world: String },

    /// Reading or writing a snapshot file failed.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A snapshot could not be encoded or decoded.
    #[error("snapshot for player {player}: {source}")]
    Codec {
        player: PlayerId,
        #[source]
        source: CodecError,
    },

    /// The backing store refused the operation.
    #[error("snapshot store unavailable: {0}")]
    StoreUnavailable(String),
}

impl SnapshotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::NotFound(_) | Self::PlayerOffline(_) => ErrorKind::NotFound,
            Self::WorldUnavailable { .. } => ErrorKind::WorldUnavailable,
            Self::Io { .. } | Self::Codec { .. } | Self::StoreUnavailable(_) => {
                ErrorKind::Persistence
            }
        }
    }
}
