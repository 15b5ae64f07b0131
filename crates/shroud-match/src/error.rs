//! Error types for the match layer.

use shroud_model::{ErrorKind, PlayerId};
use shroud_registry::RegistryError;
use shroud_snapshot::SnapshotError;

use crate::{MatchPhase, Role};

/// Errors from match session and director operations.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// No lobby (and so no session) with this name.
    #[error("lobby {0:?} not found")]
    LobbyNotFound(String),

    /// The player is not an occupant of the session.
    #[error("player {0} is not in lobby {1:?}")]
    NotAnOccupant(PlayerId, String),

    /// The player isn't in any lobby.
    #[error("player {0} is not in any lobby")]
    NotInAnyLobby(PlayerId),

    /// The player is already an occupant of some lobby.
    #[error("player {0} is already in lobby {1:?}")]
    AlreadyInLobby(PlayerId, String),

    /// The lobby is at capacity.
    #[error("lobby {0:?} is full")]
    LobbyFull(String),

    /// The lobby's world isn't loaded, so nobody can be moved there.
    #[error("world {world:?} for lobby {lobby:?} is not loaded")]
    WorldUnavailable { lobby: String, world: String },

    /// The hidden role is only ever handed out by the draw.
    #[error("role {0} cannot be chosen")]
    RoleNotSelectable(Role),

    /// Roles are locked once arena selection starts.
    #[error("roles are locked in lobby {lobby:?} while {phase}")]
    RolesLocked { lobby: String, phase: MatchPhase },

    /// No arena vote is open in this lobby.
    #[error("no arena vote is open in lobby {0:?}")]
    NoVoteOpen(String),

    /// The arena isn't one of the vote's candidates.
    #[error("arena {arena:?} is not a candidate in lobby {lobby:?}")]
    NotACandidate { lobby: String, arena: String },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl MatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LobbyNotFound(_)
            | Self::NotAnOccupant(..)
            | Self::NotInAnyLobby(_)
            | Self::NotACandidate { .. } => ErrorKind::NotFound,
            Self::AlreadyInLobby(..)
            | Self::LobbyFull(_)
            | Self::RoleNotSelectable(_)
            | Self::RolesLocked { .. }
            | Self::NoVoteOpen(_) => ErrorKind::Conflict,
            Self::WorldUnavailable { .. } => ErrorKind::WorldUnavailable,
            Self::Snapshot(e) => e.kind(),
            Self::Registry(e) => e.kind(),
        }
    }
}
