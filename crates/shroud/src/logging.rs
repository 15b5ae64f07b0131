//! Tracing subscriber setup.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// The `[logging]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset, e.g. `"info"` or
    /// `"shroud_match=debug,info"`.
    pub level: String,
    /// Print the module path of each event.
    pub with_target: bool,
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            with_target: false,
            ansi: true,
        }
    }
}

/// Installs the global subscriber: an `EnvFilter` that honours `RUST_LOG`
/// and falls back to `config.level`, plus a `fmt` layer.
///
/// Returns `false` if a global subscriber was already installed (the host
/// or an earlier call got there first); that is not an error.
pub fn init(config: &LoggingConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(config.with_target)
                .with_ansi(config.ansi),
        )
        .try_init()
        .is_ok()
}
