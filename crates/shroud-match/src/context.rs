//! The shared collaborators every session is constructed with.

use std::cell::RefCell;
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use shroud_registry::{ArenaAllocator, LobbyRegistry};
use shroud_tick::{Tick, TickConfig, TimerHandle, TimerQueue};

use crate::{MatchConfig, MatchHost};

/// What a match timer is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Countdown,
    VoteTimeout,
    /// Fires once a second while a round is running.
    RoundClock,
}

/// Payload of every timer a session schedules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTimer {
    pub lobby: String,
    pub kind: TimerKind,
}

/// Handles to everything a session works with.
///
/// All of it lives on the host's game-logic thread, so sharing is plain
/// `Rc<RefCell<_>>`. No borrow is ever held across a call into another
/// component.
#[derive(Clone)]
pub struct MatchContext {
    pub lobbies: Rc<RefCell<LobbyRegistry>>,
    pub arenas: Rc<RefCell<ArenaAllocator>>,
    pub timers: Rc<RefCell<TimerQueue<MatchTimer>>>,
    pub host: Rc<dyn MatchHost>,
    pub config: Rc<MatchConfig>,
    pub rng: Rc<RefCell<StdRng>>,
}

impl MatchContext {
    /// Builds a context with a fresh timer queue at tick 0. The RNG is
    /// seeded from `config.rng_seed` when set.
    pub fn new(
        lobbies: Rc<RefCell<LobbyRegistry>>,
        arenas: Rc<RefCell<ArenaAllocator>>,
        host: Rc<dyn MatchHost>,
        config: MatchConfig,
        tick: TickConfig,
    ) -> Self {
        let config = config.validated();
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            lobbies,
            arenas,
            timers: Rc::new(RefCell::new(TimerQueue::new(tick))),
            host,
            config: Rc::new(config),
            rng: Rc::new(RefCell::new(rng)),
        }
    }

    pub fn now(&self) -> Tick {
        self.timers.borrow().now()
    }

    pub fn ticks(&self, secs: u64) -> u64 {
        self.timers.borrow().secs(secs)
    }

    pub(crate) fn schedule_once(&self, secs: u64, lobby: &str, kind: TimerKind) -> TimerHandle {
        let delay = self.ticks(secs);
        self.timers.borrow_mut().schedule_once(
            delay,
            MatchTimer {
                lobby: lobby.to_owned(),
                kind,
            },
        )
    }

    pub(crate) fn schedule_every_second(&self, lobby: &str, kind: TimerKind) -> TimerHandle {
        let second = self.ticks(1);
        self.timers.borrow_mut().schedule_repeating(
            second,
            second,
            MatchTimer {
                lobby: lobby.to_owned(),
                kind,
            },
        )
    }

    /// Cancels the timer in `slot`, if any, and clears the slot.
    pub(crate) fn cancel(&self, slot: &mut Option<TimerHandle>) {
        if let Some(handle) = slot.take() {
            self.timers.borrow_mut().cancel(handle);
        }
    }
}
