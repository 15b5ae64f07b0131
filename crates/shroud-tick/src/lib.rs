//! Host tick pacing and cancellable timers for Shroud.
//!
//! Everything in the match core runs on the host's single game-logic
//! thread. Time is counted in host ticks ([`Tick`]), not wall-clock
//! instants, so a test can drive a whole match by advancing a counter.
//!
//! - [`TimerQueue`]: single-shot and periodic timers, keyed by
//!   [`TimerHandle`]. Cancelling a handle only prevents *future* firings.
//! - [`TickClock`]: paces a standalone host loop at a fixed rate with
//!   tokio's timer. Embedders that already own a tick loop (the usual case
//!   inside a game server) skip it and feed their own tick numbers in.
//!
//! # Integration
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* admin / player commands */ }
//!         tick = clock.wait_for_tick() => director.advance_to(tick),
//!     }
//! }
//! ```

mod clock;
mod timer;

pub use clock::{TickClock, TickConfig};
pub use timer::{Fired, TimerHandle, TimerQueue};

use std::fmt;

/// A host tick number. Tick 0 is the moment the queue was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Tick(pub u64);

impl Tick {
    /// The tick `n` ticks after this one.
    pub fn after(self, n: u64) -> Tick {
        Tick(self.0.saturating_add(n))
    }

    /// Ticks elapsed since `earlier` (0 if `earlier` is in the future).
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}
