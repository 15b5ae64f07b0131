//! The arena vote and its weighted tie-break.

use std::collections::BTreeMap;

use rand::Rng;
use shroud_model::PlayerId;

/// An open arena vote: the shortlisted candidates and one vote per player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ballot {
    candidates: Vec<String>,
    votes: BTreeMap<PlayerId, String>,
}

impl Ballot {
    pub fn new(candidates: Vec<String>) -> Self {
        Self {
            candidates,
            votes: BTreeMap::new(),
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn is_candidate(&self, arena: &str) -> bool {
        self.candidates.iter().any(|c| c == arena)
    }

    /// Records (or replaces) a player's vote. Returns `false` and records
    /// nothing if `arena` isn't a candidate.
    pub fn cast(&mut self, player: PlayerId, arena: &str) -> bool {
        if !self.is_candidate(arena) {
            return false;
        }
        self.votes.insert(player, arena.to_owned());
        true
    }

    /// Drops a player's vote, e.g. when they leave.
    pub fn withdraw(&mut self, player: PlayerId) {
        self.votes.remove(&player);
    }

    pub fn has_voted(&self, player: PlayerId) -> bool {
        self.votes.contains_key(&player)
    }

    pub fn vote_of(&self, player: PlayerId) -> Option<&str> {
        self.votes.get(&player).map(String::as_str)
    }

    pub fn votes_cast(&self) -> usize {
        self.votes.len()
    }

    pub fn votes_for(&self, arena: &str) -> usize {
        self.votes.values().filter(|v| *v == arena).count()
    }

    /// Each candidate with its weight: one base entry plus one per vote.
    ///
    /// With candidates A (0 votes), B (2), C (1) the pool is
    /// `[(A, 1), (B, 3), (C, 2)]`.
    pub fn pool(&self) -> Vec<(&str, usize)> {
        self.candidates
            .iter()
            .map(|c| (c.as_str(), 1 + self.votes_for(c)))
            .collect()
    }

    /// Draws the winner uniformly from the weighted pool. `None` only if
    /// there are no candidates.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<String> {
        draw_weighted(&self.pool(), rng).map(str::to_owned)
    }
}

/// Picks one entry with probability proportional to its weight.
pub fn draw_weighted<'a, R: Rng + ?Sized>(pool: &[(&'a str, usize)], rng: &mut R) -> Option<&'a str> {
    let total: usize = pool.iter().map(|(_, w)| *w).sum();
    if total == 0 {
        return None;
    }
    let mut pick = rng.random_range(0..total);
    for &(name, weight) in pool {
        if pick < weight {
            return Some(name);
        }
        pick -= weight;
    }
    None
}
