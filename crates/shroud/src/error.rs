//! Unified error type for the Shroud facade.

use std::path::PathBuf;

use shroud_match::MatchError;
use shroud_model::ErrorKind;
use shroud_registry::RegistryError;
use shroud_snapshot::SnapshotError;

/// Top-level error that wraps every crate-specific error.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum ShroudError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Match(#[from] MatchError),

    /// The config file exists but can't be read or parsed.
    #[error("config {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// The runtime loop has stopped; commands can no longer be delivered.
    #[error("shroud runtime is not running")]
    Unavailable,
}

impl ShroudError {
    /// Where this error sits in the shared taxonomy. `None` for setup and
    /// runtime errors, which never come out of a match operation.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Registry(e) => Some(e.kind()),
            Self::Snapshot(e) => Some(e.kind()),
            Self::Match(e) => Some(e.kind()),
            Self::Config { .. } | Self::Unavailable => None,
        }
    }
}
