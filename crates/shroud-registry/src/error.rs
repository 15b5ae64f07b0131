//! Error types for the registry layer.

use std::path::PathBuf;

use shroud_model::{CodecError, ErrorKind};

/// Errors raised by a [`DefinitionStore`](crate::DefinitionStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing a record file failed.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be encoded or decoded.
    #[error("record {key}: {source}")]
    Codec {
        key: String,
        #[source]
        source: CodecError,
    },

    /// The record name can't be used as a storage key.
    #[error("invalid record key {0:?}")]
    InvalidKey(String),

    /// The backing store refused the write.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors from lobby and arena registration and lookup.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("lobby {0:?} not found")]
    LobbyNotFound(String),

    #[error("arena {0:?} not found")]
    ArenaNotFound(String),

    #[error("lobby {0:?} already exists")]
    LobbyExists(String),

    /// An explicit lobby spawn must stand inside the lobby region.
    #[error("spawn pose {x:.2}, {y:.2}, {z:.2} is outside lobby {lobby:?}")]
    SpawnOutOfBounds { lobby: String, x: f64, y: f64, z: f64 },

    /// The in-memory change was applied but could not be saved.
    #[error("failed to persist {record}: {source}")]
    Persistence {
        record: String,
        #[source]
        source: StoreError,
    },

    /// Loading the stored definitions at startup failed.
    #[error("failed to load definitions: {0}")]
    Load(#[source] StoreError),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LobbyNotFound(_) | Self::ArenaNotFound(_) => ErrorKind::NotFound,
            Self::LobbyExists(_) => ErrorKind::AlreadyExists,
            Self::SpawnOutOfBounds { .. } => ErrorKind::Conflict,
            Self::Persistence { .. } | Self::Load(_) => ErrorKind::Persistence,
        }
    }
}
