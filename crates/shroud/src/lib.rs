//! # Shroud
//!
//! Match orchestration for a hide-and-seek minigame on a block-world game
//! server: lobbies fill up, a countdown runs, one player is secretly
//! chosen as the hidden role, players vote on an arena, and everyone is
//! moved in for a timed round. Whatever a match does to a player's
//! inventory, levels, and position is undone when they leave.
//!
//! The host game server implements [`MatchHost`] and owns the tick loop;
//! everything else lives here.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shroud::prelude::*;
//!
//! let config = ShroudConfig::load("shroud.toml")?;
//! shroud::logging::init(&config.logging);
//!
//! let mut shroud = Shroud::open(config, host)?;
//! let (handle, commands) = shroud::channel(64);
//! // hand `handle` to the host's event listeners, then:
//! shroud.run(commands).await;
//! ```

mod config;
mod error;
mod handle;
pub mod logging;
mod runtime;

pub use config::ShroudConfig;
pub use error::ShroudError;
pub use handle::{Commands, LobbyStatus, MarkerAction, ShroudHandle, channel};
pub use logging::LoggingConfig;
pub use runtime::Shroud;

pub use shroud_match::{
    Channel, MatchConfig, MatchDirector, MatchError, MatchHost, MatchPhase, Notice, Role,
    StallReason,
};
pub use shroud_model::{BlockPos, ErrorKind, Location, PlayerId, Pose, Region};
pub use shroud_registry::SpawnGroup;
pub use shroud_snapshot::PlayerStateAccess;
pub use shroud_tick::{Tick, TickConfig};

/// Everything a host integration usually needs.
pub mod prelude {
    pub use crate::{
        BlockPos, ErrorKind, Location, LoggingConfig, MarkerAction, MatchConfig, MatchHost,
        MatchPhase, Notice, PlayerId, PlayerStateAccess, Pose, Region, Role, Shroud,
        ShroudConfig, ShroudError, ShroudHandle, SpawnGroup,
    };
    pub use shroud_model::WorldAccess;
}
