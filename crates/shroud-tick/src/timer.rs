//! Cancellable single-shot and periodic timers measured in host ticks.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::trace;

use crate::{Tick, TickConfig};

/// Identifies one scheduled timer. Handles are never reused, so a stale
/// handle can always be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{}", self.0)
    }
}

/// A timer that came due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<E> {
    pub handle: TimerHandle,
    /// The tick the timer was scheduled for.
    pub due: Tick,
    pub event: E,
}

struct Timer<E> {
    key: (Tick, u64),
    period: Option<u64>,
    event: E,
}

/// A queue of pending timers carrying an event payload of type `E`.
///
/// Timers fire in deadline order; timers due on the same tick fire in the
/// order they were scheduled. There is no thread behind this queue: the
/// owner pulls due timers with [`pop_due`](Self::pop_due) (or
/// [`advance`](Self::advance)) from its tick handler.
pub struct TimerQueue<E> {
    rate: TickConfig,
    now: Tick,
    next_id: u64,
    next_seq: u64,
    order: BTreeMap<(Tick, u64), TimerHandle>,
    timers: HashMap<TimerHandle, Timer<E>>,
}

impl<E: Clone> TimerQueue<E> {
    /// Creates an empty queue at tick 0 using the given tick rate for
    /// seconds-based scheduling.
    pub fn new(rate: TickConfig) -> Self {
        Self {
            rate: rate.validated(),
            now: Tick(0),
            next_id: 1,
            next_seq: 0,
            order: BTreeMap::new(),
            timers: HashMap::new(),
        }
    }

    /// The queue's current tick.
    ///
    /// While a fired timer is being handled this is the timer's own due
    /// tick, so anything scheduled from a handler is relative to when the
    /// handler was meant to run.
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Converts seconds into ticks at this queue's rate.
    pub fn secs(&self, secs: u64) -> u64 {
        self.rate.ticks_for_secs(secs)
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.rate.tick_rate_hz
    }

    /// Schedules `event` to fire once, `delay` ticks from now.
    pub fn schedule_once(&mut self, delay: u64, event: E) -> TimerHandle {
        self.insert(self.now.after(delay), None, event)
    }

    /// Schedules `event` to fire `delay` ticks from now and then every
    /// `period` ticks until cancelled. A zero period is treated as 1.
    pub fn schedule_repeating(&mut self, delay: u64, period: u64, event: E) -> TimerHandle {
        self.insert(self.now.after(delay), Some(period.max(1)), event)
    }

    /// Cancels a timer. Returns `false` if it already fired (single-shot)
    /// or was cancelled before. Never affects a firing already returned.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.timers.remove(&handle) {
            Some(timer) => {
                self.order.remove(&timer.key);
                trace!(%handle, "timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Whether the timer is still scheduled.
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(&handle)
    }

    /// The tick the timer will next fire on.
    pub fn deadline(&self, handle: TimerHandle) -> Option<Tick> {
        self.timers.get(&handle).map(|t| t.key.0)
    }

    /// Number of scheduled timers.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Removes and returns the earliest timer due at or before `until`.
    ///
    /// Moves [`now`](Self::now) to the fired timer's deadline. A periodic
    /// timer is re-armed before it is returned, so the handler may cancel
    /// it. Returns `None` when nothing is due; call
    /// [`settle`](Self::settle) afterwards to bring the clock up to
    /// `until`.
    pub fn pop_due(&mut self, until: Tick) -> Option<Fired<E>> {
        let (&key, &handle) = self.order.iter().next()?;
        if key.0 > until {
            return None;
        }
        self.order.remove(&key);
        let due = key.0;
        if due > self.now {
            self.now = due;
        }

        let timer = self.timers.remove(&handle)?;
        let event = timer.event.clone();
        if let Some(period) = timer.period {
            let key = (due.after(period), self.bump_seq());
            self.order.insert(key, handle);
            self.timers.insert(
                handle,
                Timer {
                    key,
                    period: timer.period,
                    event: timer.event,
                },
            );
        }

        trace!(%handle, %due, "timer fired");
        Some(Fired { handle, due, event })
    }

    /// Moves the clock forward to `until` (never backwards).
    pub fn settle(&mut self, until: Tick) {
        if until > self.now {
            self.now = until;
        }
    }

    /// Drains every timer due at or before `until` and settles the clock.
    ///
    /// Convenience for callers that don't schedule from their handlers;
    /// anything scheduled after this returns is not included.
    pub fn advance(&mut self, until: Tick) -> Vec<Fired<E>> {
        let mut fired = Vec::new();
        while let Some(f) = self.pop_due(until) {
            fired.push(f);
        }
        self.settle(until);
        fired
    }

    fn insert(&mut self, deadline: Tick, period: Option<u64>, event: E) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        let key = (deadline, self.bump_seq());
        self.order.insert(key, handle);
        self.timers.insert(handle, Timer { key, period, event });
        trace!(%handle, %deadline, periodic = period.is_some(), "timer scheduled");
        handle
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

impl<E: Clone> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new(TickConfig::default())
    }
}
