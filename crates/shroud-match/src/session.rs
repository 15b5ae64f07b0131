//! The per-lobby match session: the state machine that turns a group of
//! waiting players into a timed match in a claimed arena.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;
use shroud_model::{PlayerId, TimedEffect};
use shroud_registry::{Lobby, SpawnGroup};
use shroud_tick::{Fired, Tick, TimerHandle};
use tracing::{debug, info, trace, warn};

use crate::{
    Ballot, MatchContext, MatchError, MatchHost, MatchPhase, MatchTimer, Notice, Role,
    StallReason, TimerKind,
};

/// Host key of the effect that hides the arena while players are moved.
pub const BLINDNESS: &str = "minecraft:blindness";

/// Fewest occupants that start a countdown.
pub const MIN_PLAYERS: usize = 2;

#[derive(Debug, Clone)]
struct Occupant {
    /// `None` until chosen or assigned.
    role: Option<Role>,
    joined_at: Tick,
}

/// One lobby's match lifecycle.
///
/// Created alongside its lobby and reused for every match; see
/// [`MatchPhase`] for the states. All operations run to completion on the
/// caller's thread. Timers come back in through [`on_timer`].
///
/// [`on_timer`]: MatchSession::on_timer
pub struct MatchSession {
    lobby: String,
    ctx: MatchContext,
    phase: MatchPhase,
    /// Ordered so a seeded draw is reproducible.
    occupants: BTreeMap<PlayerId, Occupant>,
    countdown: Option<TimerHandle>,
    vote_timer: Option<TimerHandle>,
    round_clock: Option<TimerHandle>,
    ballot: Option<Ballot>,
    /// The arena claimed for the running round.
    arena: Option<String>,
    remaining_secs: u64,
}

impl MatchSession {
    pub fn new(lobby: impl Into<String>, ctx: MatchContext) -> Self {
        Self {
            lobby: lobby.into(),
            ctx,
            phase: MatchPhase::Waiting,
            occupants: BTreeMap::new(),
            countdown: None,
            vote_timer: None,
            round_clock: None,
            ballot: None,
            arena: None,
            remaining_secs: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn lobby(&self) -> &str {
        &self.lobby
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn capacity(&self) -> usize {
        self.ctx
            .lobbies
            .borrow()
            .get(&self.lobby)
            .map_or(0, Lobby::capacity)
    }

    pub fn is_full(&self) -> bool {
        self.occupants.len() >= self.capacity()
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.occupants.contains_key(&player)
    }

    /// The player's role, chosen or assigned. `None` for unassigned
    /// occupants and for non-occupants.
    pub fn chosen_role(&self, player: PlayerId) -> Option<Role> {
        self.occupants.get(&player).and_then(|o| o.role)
    }

    pub fn occupant_count(&self) -> usize {
        self.occupants.len()
    }

    /// Occupants in ascending id order.
    pub fn occupants(&self) -> Vec<PlayerId> {
        self.occupants.keys().copied().collect()
    }

    /// The open vote, if any.
    pub fn ballot(&self) -> Option<&Ballot> {
        self.ballot.as_ref()
    }

    /// The arena the current round is played in.
    pub fn arena(&self) -> Option<&str> {
        self.arena.as_deref()
    }

    /// Seconds left in the running round.
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    /// When the pending countdown fires.
    pub fn countdown_deadline(&self) -> Option<Tick> {
        self.countdown
            .and_then(|h| self.ctx.timers.borrow().deadline(h))
    }

    // -----------------------------------------------------------------------
    // Occupancy
    // -----------------------------------------------------------------------

    /// Adds a player with no role. Returns `false` if the lobby is full or
    /// the player is already here.
    ///
    /// Reaching two occupants while `Waiting` starts the countdown. Joins in
    /// any later phase are accepted but never start a second countdown.
    pub fn add(&mut self, player: PlayerId) -> bool {
        if self.contains(player) {
            return false;
        }
        let capacity = self.capacity();
        if self.occupants.len() >= capacity {
            debug!(lobby = %self.lobby, %player, capacity, "lobby full, join refused");
            return false;
        }

        self.occupants.insert(
            player,
            Occupant {
                role: None,
                joined_at: self.ctx.now(),
            },
        );
        let occupants = self.occupants.len();
        info!(lobby = %self.lobby, %player, occupants, "player joined lobby");

        self.notify(
            player,
            &Notice::JoinedLobby {
                lobby: self.lobby.clone(),
                occupants,
                capacity,
            },
        );
        self.broadcast_except(
            player,
            &Notice::OccupancyChanged {
                player,
                joined: true,
                occupants,
                capacity,
            },
        );

        if self.phase == MatchPhase::Waiting
            && occupants >= MIN_PLAYERS
            && self.countdown.is_none()
        {
            self.start_countdown();
        }
        true
    }

    /// Removes an occupant. Returns `false` if they weren't one.
    ///
    /// - Dropping below two during the countdown cancels it.
    /// - A leaver's vote is discarded; if everyone left has voted, the vote
    ///   resolves now.
    /// - If nobody is left mid-vote or mid-round, the match ends.
    pub fn remove(&mut self, player: PlayerId) -> bool {
        if self.occupants.remove(&player).is_none() {
            return false;
        }
        if let Some(ballot) = self.ballot.as_mut() {
            ballot.withdraw(player);
        }
        let occupants = self.occupants.len();
        info!(lobby = %self.lobby, %player, occupants, "player left lobby");

        self.notify(
            player,
            &Notice::LeftLobby {
                lobby: self.lobby.clone(),
            },
        );
        self.broadcast(&Notice::OccupancyChanged {
            player,
            joined: false,
            occupants,
            capacity: self.capacity(),
        });

        match self.phase {
            MatchPhase::Countdown if occupants < MIN_PLAYERS => {
                self.ctx.cancel(&mut self.countdown);
                self.phase = MatchPhase::Waiting;
                info!(lobby = %self.lobby, "countdown cancelled, not enough players");
            }
            MatchPhase::ArenaSelection if occupants == 0 => self.end_match(),
            MatchPhase::ArenaSelection if self.everyone_voted() => {
                debug!(lobby = %self.lobby, "remaining occupants have all voted");
                self.resolve_vote();
            }
            MatchPhase::InProgress if occupants == 0 => self.end_match(),
            MatchPhase::PostMatch | MatchPhase::Stalled(_) if occupants == 0 => {
                self.phase = MatchPhase::Waiting;
            }
            _ => {}
        }
        true
    }

    /// Pre-selects a regular role for an occupant.
    ///
    /// # Errors
    /// - [`MatchError::NotAnOccupant`] if the player isn't here.
    /// - [`MatchError::RoleNotSelectable`] for the hidden role.
    /// - [`MatchError::RolesLocked`] once arena selection has started.
    pub fn set_role(&mut self, player: PlayerId, role: Role) -> Result<(), MatchError> {
        if !self.contains(player) {
            return Err(MatchError::NotAnOccupant(player, self.lobby.clone()));
        }
        if role.is_hidden() {
            return Err(MatchError::RoleNotSelectable(role));
        }
        if !self.phase.allows_role_choice() {
            return Err(MatchError::RolesLocked {
                lobby: self.lobby.clone(),
                phase: self.phase,
            });
        }
        if let Some(occupant) = self.occupants.get_mut(&player) {
            occupant.role = Some(role);
        }
        debug!(lobby = %self.lobby, %player, %role, "role chosen");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Starting
    // -----------------------------------------------------------------------

    /// Skips the countdown and starts now.
    ///
    /// Returns `false` with no occupants, or while a vote or round is
    /// already running.
    pub fn force_start(&mut self) -> bool {
        if self.occupants.is_empty() || self.phase.is_active() {
            return false;
        }
        self.ctx.cancel(&mut self.countdown);
        info!(lobby = %self.lobby, from = %self.phase, "match force-started");
        self.begin_match();
        true
    }

    fn start_countdown(&mut self) {
        let secs = self
            .ctx
            .lobbies
            .borrow()
            .get(&self.lobby)
            .map_or(u64::from(shroud_registry::DEFAULT_COUNTDOWN_SECS), |l| {
                u64::from(l.countdown_secs())
            });
        self.countdown = Some(self.ctx.schedule_once(secs, &self.lobby, TimerKind::Countdown));
        self.phase = MatchPhase::Countdown;
        info!(lobby = %self.lobby, secs, "countdown started");
        self.broadcast(&Notice::CountdownStarted { secs });
    }

    fn on_countdown(&mut self) {
        if self.phase != MatchPhase::Countdown {
            return;
        }

        // Nobody gets a role in the same breath as joining.
        let now = self.ctx.now();
        let grace = self.ctx.ticks(self.ctx.config.grace_window_secs);
        let newest = self.occupants.values().map(|o| o.joined_at).max();
        if newest.is_some_and(|joined| now.since(joined) < grace) {
            let retry = self.ctx.config.grace_retry_secs;
            self.countdown = Some(self.ctx.schedule_once(retry, &self.lobby, TimerKind::Countdown));
            info!(lobby = %self.lobby, retry_secs = retry, "recent join, countdown deferred");
            self.broadcast(&Notice::CountdownDeferred { secs: retry });
            return;
        }

        self.begin_match();
    }

    fn begin_match(&mut self) {
        self.assign_roles();
        self.select_arena();
    }

    /// One occupant gets the hidden role; everyone without a role gets a
    /// random regular one. Then everyone is stripped and blinded.
    fn assign_roles(&mut self) {
        let ids = self.occupants();
        if ids.is_empty() {
            return;
        }
        let mut rng = self.ctx.rng.borrow_mut();
        let hidden = ids[rng.random_range(0..ids.len())];

        for (id, occupant) in self.occupants.iter_mut() {
            if *id == hidden {
                occupant.role = Some(Role::HIDDEN);
            } else if occupant.role.is_none_or(Role::is_hidden) {
                occupant.role = Some(Role::random_regular(&mut *rng));
            }
        }
        drop(rng);
        info!(lobby = %self.lobby, hidden = %hidden, "roles assigned");

        let host = &self.ctx.host;
        let blindness = self.blindness();
        for id in ids {
            if host.is_online(id) {
                prepare_for_round(&**host, id, &blindness);
            }
        }
    }

    fn blindness(&self) -> TimedEffect {
        TimedEffect::new(BLINDNESS, self.ctx.config.blindness_ticks).without_particles()
    }

    // -----------------------------------------------------------------------
    // Arena selection
    // -----------------------------------------------------------------------

    fn select_arena(&mut self) {
        let eligible = self
            .ctx
            .lobbies
            .borrow()
            .get(&self.lobby)
            .map(Lobby::eligible)
            .unwrap_or_default();
        if eligible.is_empty() {
            return self.stall(StallReason::NoEligibleArenas);
        }

        let mut available = self.ctx.arenas.borrow().list_available(&eligible);
        if available.is_empty() {
            return self.stall(StallReason::NoFreeArenas);
        }
        available.shuffle(&mut *self.ctx.rng.borrow_mut());
        available.truncate(self.ctx.config.vote_candidates.max(1));

        // Every candidate is held until the vote is decided.
        let mut candidates = {
            let mut arenas = self.ctx.arenas.borrow_mut();
            available
                .into_iter()
                .filter(|name| arenas.claim(name, &self.lobby))
                .collect::<Vec<_>>()
        };

        match candidates.len() {
            0 => self.stall(StallReason::NoFreeArenas),
            1 => {
                let arena = candidates.remove(0);
                debug!(lobby = %self.lobby, %arena, "single candidate, skipping vote");
                self.transition(arena);
            }
            _ => self.open_vote(candidates),
        }
    }

    fn open_vote(&mut self, candidates: Vec<String>) {
        let secs = self.ctx.config.vote_timeout_secs;
        self.vote_timer = Some(self.ctx.schedule_once(secs, &self.lobby, TimerKind::VoteTimeout));
        self.phase = MatchPhase::ArenaSelection;
        info!(lobby = %self.lobby, ?candidates, secs, "arena vote opened");
        self.broadcast(&Notice::VoteOpened {
            candidates: candidates.clone(),
            secs,
        });
        self.ballot = Some(Ballot::new(candidates));
    }

    /// Records or replaces an occupant's vote. Resolves the vote as soon
    /// as every occupant has voted.
    ///
    /// # Errors
    /// - [`MatchError::NotAnOccupant`] if the player isn't here.
    /// - [`MatchError::NoVoteOpen`] outside arena selection.
    /// - [`MatchError::NotACandidate`] for an arena not on the ballot.
    pub fn record_vote(&mut self, player: PlayerId, arena: &str) -> Result<(), MatchError> {
        if !self.contains(player) {
            return Err(MatchError::NotAnOccupant(player, self.lobby.clone()));
        }
        let Some(ballot) = self.ballot.as_mut() else {
            return Err(MatchError::NoVoteOpen(self.lobby.clone()));
        };
        if !ballot.cast(player, arena) {
            return Err(MatchError::NotACandidate {
                lobby: self.lobby.clone(),
                arena: arena.to_owned(),
            });
        }
        debug!(lobby = %self.lobby, %player, %arena, "vote recorded");
        self.notify(
            player,
            &Notice::VoteCast {
                arena: arena.to_owned(),
            },
        );

        if self.everyone_voted() {
            debug!(lobby = %self.lobby, "all occupants voted, resolving early");
            self.resolve_vote();
        }
        Ok(())
    }

    fn everyone_voted(&self) -> bool {
        self.ballot.as_ref().is_some_and(|b| {
            !self.occupants.is_empty() && self.occupants.keys().all(|p| b.has_voted(*p))
        })
    }

    fn resolve_vote(&mut self) {
        self.ctx.cancel(&mut self.vote_timer);
        let Some(ballot) = self.ballot.take() else {
            return;
        };

        let winner = ballot.draw(&mut *self.ctx.rng.borrow_mut());
        let Some(winner) = winner else {
            return self.stall(StallReason::NoFreeArenas);
        };

        {
            let mut arenas = self.ctx.arenas.borrow_mut();
            for candidate in ballot.candidates() {
                if *candidate != winner {
                    arenas.release(candidate);
                }
            }
        }
        info!(
            lobby = %self.lobby,
            arena = %winner,
            pool = ?ballot.pool(),
            "arena chosen"
        );
        self.broadcast(&Notice::ArenaChosen {
            arena: winner.clone(),
        });
        self.transition(winner);
    }

    // -----------------------------------------------------------------------
    // Round
    // -----------------------------------------------------------------------

    /// Moves everyone into the claimed arena and starts the round clock.
    fn transition(&mut self, arena_name: String) {
        let arena = self.ctx.arenas.borrow().get(&arena_name).cloned();
        let Some(arena) = arena else {
            self.ctx.arenas.borrow_mut().release(&arena_name);
            return self.stall(StallReason::NoFreeArenas);
        };
        let host = self.ctx.host.clone();
        if !host.is_world_loaded(&arena.region.world) {
            self.ctx.arenas.borrow_mut().release(&arena_name);
            return self.stall(StallReason::WorldUnavailable);
        }

        let blindness = self.blindness();
        let mut hidden_index = 0;
        let mut regular_index = 0;
        {
            let mut rng = self.ctx.rng.borrow_mut();
            for (&id, occupant) in self.occupants.iter_mut() {
                let late = occupant.role.is_none();
                // Joined after roles were drawn.
                let role = *occupant
                    .role
                    .get_or_insert_with(|| Role::random_regular(&mut *rng));
                if !host.is_online(id) {
                    continue;
                }
                if late {
                    prepare_for_round(&*host, id, &blindness);
                }
                let group = role.spawn_group();
                let index = match group {
                    SpawnGroup::Hidden => &mut hidden_index,
                    SpawnGroup::Regular => &mut regular_index,
                };
                let spawn = arena.spawn_for(group, *index);
                *index += 1;

                host.relocate(id, &spawn);
                role.kit().equip(&*host, id);
                host.notify(id, &Notice::MatchStarted { role });
                debug!(lobby = %self.lobby, player = %id, %role, at = %spawn, "player placed");
            }
        }

        self.arena = Some(arena_name);
        self.phase = MatchPhase::InProgress;
        self.remaining_secs = self.ctx.config.match_duration_secs;
        self.round_clock = Some(
            self.ctx
                .schedule_every_second(&self.lobby, TimerKind::RoundClock),
        );
        info!(
            lobby = %self.lobby,
            arena = ?self.arena,
            players = self.occupants.len(),
            secs = self.remaining_secs,
            "match started"
        );
    }

    fn on_round_second(&mut self) {
        if self.phase != MatchPhase::InProgress {
            return;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            return self.end_match();
        }
        if self.ctx.config.is_reminder(self.remaining_secs) {
            self.broadcast(&Notice::TimeRemaining {
                secs: self.remaining_secs,
            });
        }
    }

    /// Stops every timer, tells everyone, and frees the arena.
    ///
    /// Occupants and roles stay; the session waits in `PostMatch` for
    /// [`reset`](Self::reset). With nobody left it goes straight back to
    /// `Waiting`.
    fn end_match(&mut self) {
        self.ctx.cancel(&mut self.round_clock);
        self.ctx.cancel(&mut self.vote_timer);
        self.ctx.cancel(&mut self.countdown);
        self.broadcast(&Notice::MatchEnded);
        let arena = self.arena.clone();
        self.release_claims();
        self.remaining_secs = 0;
        self.phase = if self.occupants.is_empty() {
            MatchPhase::Waiting
        } else {
            MatchPhase::PostMatch
        };
        info!(lobby = %self.lobby, ?arena, phase = %self.phase, "match ended");
    }

    /// Gives up on starting. Roles and cleared equipment are not rolled
    /// back; any claim taken so far is released.
    fn stall(&mut self, reason: StallReason) {
        warn!(lobby = %self.lobby, ?reason, "match aborted");
        self.ctx.cancel(&mut self.vote_timer);
        self.release_claims();
        self.phase = MatchPhase::Stalled(reason);
        self.broadcast(&Notice::MatchAborted { reason });
    }

    fn release_claims(&mut self) {
        let mut arenas = self.ctx.arenas.borrow_mut();
        if let Some(arena) = self.arena.take() {
            arenas.release(&arena);
        }
        if let Some(ballot) = self.ballot.take() {
            for candidate in ballot.candidates() {
                arenas.release(candidate);
            }
        }
    }

    /// Returns the session to an empty `Waiting`, ready for reuse, and
    /// hands back the former occupants. Any running timer is cancelled and
    /// any claim released.
    pub fn reset(&mut self) -> Vec<PlayerId> {
        self.ctx.cancel(&mut self.countdown);
        self.ctx.cancel(&mut self.vote_timer);
        self.ctx.cancel(&mut self.round_clock);
        self.release_claims();
        let former = self.occupants();
        self.occupants.clear();
        self.remaining_secs = 0;
        self.phase = MatchPhase::Waiting;
        info!(lobby = %self.lobby, players = former.len(), "session reset");
        former
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    /// Handles one of this session's timers. Timers this session no
    /// longer tracks are ignored.
    pub fn on_timer(&mut self, fired: &Fired<MatchTimer>) {
        match fired.event.kind {
            TimerKind::Countdown if self.countdown == Some(fired.handle) => {
                self.countdown = None;
                self.on_countdown();
            }
            TimerKind::VoteTimeout if self.vote_timer == Some(fired.handle) => {
                self.vote_timer = None;
                debug!(lobby = %self.lobby, "vote timed out");
                self.resolve_vote();
            }
            TimerKind::RoundClock if self.round_clock == Some(fired.handle) => {
                self.on_round_second();
            }
            kind => trace!(lobby = %self.lobby, ?kind, handle = %fired.handle, "stale timer ignored"),
        }
    }

    // -----------------------------------------------------------------------
    // Notices
    // -----------------------------------------------------------------------

    fn notify(&self, player: PlayerId, notice: &Notice) {
        if self.ctx.host.is_online(player) {
            self.ctx.host.notify(player, notice);
        }
    }

    fn broadcast(&self, notice: &Notice) {
        for &player in self.occupants.keys() {
            self.notify(player, notice);
        }
    }

    fn broadcast_except(&self, skip: PlayerId, notice: &Notice) {
        for &player in self.occupants.keys().filter(|p| **p != skip) {
            self.notify(player, notice);
        }
    }
}

/// Strips personal items and blinds a player ahead of the arena.
fn prepare_for_round(host: &dyn MatchHost, id: PlayerId, blindness: &TimedEffect) {
    host.clear_slots(id);
    host.add_effect(id, blindness);
}
