//! Fixed-rate host tick clock.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

use crate::Tick;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tick clock configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Host ticks per second. The host game server runs at 20.
    pub tick_rate_hz: u32,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self { tick_rate_hz: 20 }
    }
}

impl TickConfig {
    /// Maximum supported tick rate.
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self { tick_rate_hz }
    }

    /// Clamp the rate into `1..=MAX_TICK_RATE_HZ`.
    ///
    /// Countdowns and votes only resolve on ticks, so the clock always runs.
    pub fn validated(mut self) -> Self {
        let clamped = self.tick_rate_hz.clamp(1, Self::MAX_TICK_RATE_HZ);
        if clamped != self.tick_rate_hz {
            warn!(
                rate = self.tick_rate_hz,
                clamped,
                "tick_rate_hz out of range, clamping"
            );
            self.tick_rate_hz = clamped;
        }
        self
    }

    /// Wall-clock length of one tick.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz.max(1)))
    }

    /// Number of ticks in `secs` seconds.
    pub fn ticks_for_secs(&self, secs: u64) -> u64 {
        secs.saturating_mul(u64::from(self.tick_rate_hz.max(1)))
    }
}

// ---------------------------------------------------------------------------
// TickClock
// ---------------------------------------------------------------------------

/// Paces a host loop at a fixed tick rate.
///
/// Overruns use a skip policy: if the loop wakes up late, the missed
/// ticks are counted (so timers still see the right tick number) and the
/// next deadline is scheduled from now. This keeps a slow tick from
/// snowballing into a burst of catch-up ticks.
pub struct TickClock {
    config: TickConfig,
    tick_duration: Duration,
    tick: Tick,
    next_deadline: Instant,
    paused: bool,
    total_skipped: u64,
}

impl TickClock {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();
        debug!(
            rate_hz = config.tick_rate_hz,
            tick_ms = tick_duration.as_secs_f64() * 1000.0,
            "tick clock created"
        );
        Self {
            config,
            tick_duration,
            tick: Tick(0),
            next_deadline: Instant::now() + tick_duration,
            paused: false,
            total_skipped: 0,
        }
    }

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Waits until the next tick is due and returns its number.
    ///
    /// While paused this future pends forever, so a `select!` loop keeps
    /// serving its other branches.
    pub async fn wait_for_tick(&mut self) -> Tick {
        if self.paused {
            std::future::pending::<()>().await;
        }

        time::sleep_until(self.next_deadline).await;

        let now = Instant::now();
        let late_by = now.saturating_duration_since(self.next_deadline);
        let skipped = (late_by.as_nanos() / self.tick_duration.as_nanos().max(1)) as u64;
        if skipped > 0 {
            warn!(
                tick = self.tick.0,
                skipped,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "tick overrun, skipping ahead"
            );
            self.total_skipped += skipped;
        }

        self.tick = self.tick.after(1 + skipped);
        self.next_deadline = now + self.tick_duration;
        trace!(tick = self.tick.0, "tick");
        self.tick
    }

    /// Stops the clock. Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick.0, "tick clock paused");
        }
    }

    /// Restarts the clock one tick from now, without catch-up for the
    /// time spent paused.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next_deadline = Instant::now() + self.tick_duration;
            debug!(tick = self.tick.0, "tick clock resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// The last tick returned by [`wait_for_tick`](Self::wait_for_tick).
    pub fn current(&self) -> Tick {
        self.tick
    }

    /// Ticks lost to overruns since the clock was created.
    pub fn total_skipped(&self) -> u64 {
        self.total_skipped
    }

    pub fn config(&self) -> TickConfig {
        self.config
    }
}
