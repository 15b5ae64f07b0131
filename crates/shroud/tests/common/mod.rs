//! A minimal in-memory host.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

use shroud::prelude::*;
use shroud_model::{EquipmentSlot, ItemBlob, TimedEffect};
use shroud_snapshot::{PlayerState, Progression, SlotContents};

#[derive(Default)]
pub struct TestHost {
    pub worlds: RefCell<HashSet<String>>,
    pub players: RefCell<BTreeMap<PlayerId, PlayerState>>,
    pub notices: RefCell<Vec<(PlayerId, Notice)>>,
}

impl TestHost {
    pub fn new() -> Self {
        let host = Self::default();
        for world in ["hub", "arenas", "survival"] {
            host.worlds.borrow_mut().insert(world.into());
        }
        host
    }

    pub fn spawn_player(&self, id: u64) -> PlayerId {
        self.players.borrow_mut().insert(PlayerId(id), home_state(id));
        PlayerId(id)
    }

    pub fn state(&self, player: PlayerId) -> PlayerState {
        self.players.borrow()[&player].clone()
    }

    fn with_state(&self, player: PlayerId, f: impl FnOnce(&mut PlayerState)) {
        if let Some(state) = self.players.borrow_mut().get_mut(&player) {
            f(state);
        }
    }
}

pub fn home_state(id: u64) -> PlayerState {
    PlayerState {
        location: Location::new("survival", Pose::at(id as f64, 70.0, 0.0)),
        slots: vec![SlotContents {
            slot: EquipmentSlot::MainHand,
            item: ItemBlob(format!("pickaxe#{id}")),
        }],
        progression: Progression {
            level: 3,
            progress: 0.25,
        },
        effects: Vec::new(),
    }
}

impl WorldAccess for TestHost {
    fn is_world_loaded(&self, world: &str) -> bool {
        self.worlds.borrow().contains(world)
    }

    fn is_online(&self, player: PlayerId) -> bool {
        self.players.borrow().contains_key(&player)
    }

    fn relocate(&self, player: PlayerId, to: &Location) {
        self.with_state(player, |s| s.location = to.clone());
    }
}

impl PlayerStateAccess for TestHost {
    fn read_state(&self, player: PlayerId) -> Option<PlayerState> {
        self.players.borrow().get(&player).cloned()
    }

    fn clear_slots(&self, player: PlayerId) {
        self.with_state(player, |s| s.slots.clear());
    }

    fn set_slot(&self, player: PlayerId, slot: EquipmentSlot, item: &ItemBlob) {
        self.with_state(player, |s| {
            s.slots.push(SlotContents {
                slot,
                item: item.clone(),
            })
        });
    }

    fn set_progression(&self, player: PlayerId, progression: Progression) {
        self.with_state(player, |s| s.progression = progression);
    }

    fn clear_effects(&self, player: PlayerId) {
        self.with_state(player, |s| s.effects.clear());
    }

    fn add_effect(&self, player: PlayerId, effect: &TimedEffect) {
        self.with_state(player, |s| s.effects.push(effect.clone()));
    }
}

impl MatchHost for TestHost {
    fn equip_role_kit(&self, _player: PlayerId, _role: Role) {}

    fn notify(&self, player: PlayerId, notice: &Notice) {
        self.notices.borrow_mut().push((player, notice.clone()));
    }
}
