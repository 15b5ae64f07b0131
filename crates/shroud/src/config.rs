//! The `shroud.toml` configuration file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shroud_match::MatchConfig;
use shroud_tick::TickConfig;
use tracing::info;

use crate::{LoggingConfig, ShroudError};

/// Top-level configuration.
///
/// ```toml
/// data_dir = "plugins/shroud"
///
/// [tick]
/// tick_rate_hz = 20
///
/// [game]
/// match_duration_secs = 240
/// vote_candidates = 3
///
/// [logging]
/// level = "info"
/// ```
///
/// Every table and field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShroudConfig {
    /// Lobby and arena definitions go in `lobbies/` and `arenas/` under
    /// this directory, snapshots in `snapshots/`.
    pub data_dir: PathBuf,
    pub tick: TickConfig,
    pub game: MatchConfig,
    pub logging: LoggingConfig,
}

impl Default for ShroudConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("shroud-data"),
            tick: TickConfig::default(),
            game: MatchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ShroudConfig {
    /// Reads a TOML config file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ShroudError> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(config_error(path, e)),
        };
        toml::from_str(&text).map_err(|e| config_error(path, e))
    }

    pub fn from_toml(text: &str) -> Result<Self, ShroudError> {
        toml::from_str(text).map_err(|e| config_error(Path::new("<inline>"), e))
    }

    pub fn snapshot_dir(&self) -> PathBuf {
        self.data_dir.join("snapshots")
    }
}

fn config_error(path: &Path, e: impl std::fmt::Display) -> ShroudError {
    ShroudError::Config {
        path: path.to_owned(),
        message: e.to_string(),
    }
}
