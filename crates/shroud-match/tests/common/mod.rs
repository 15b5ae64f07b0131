//! Shared fixtures: a recording fake host and a small world with one
//! lobby and two arenas.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use shroud_match::{MatchConfig, MatchContext, MatchDirector, MatchHost, Notice, Role};
use shroud_model::{
    EquipmentSlot, ItemBlob, Location, PlayerId, Pose, Region, TimedEffect, WorldAccess,
};
use shroud_registry::{ArenaAllocator, LobbyRegistry, MemoryStore, SpawnGroup};
use shroud_snapshot::{
    MemorySnapshotStore, PlayerState, PlayerStateAccess, Progression, SlotContents,
    SnapshotManager,
};
use shroud_tick::TickConfig;

// =========================================================================
// Fake host
// =========================================================================

/// Records every primitive the core calls.
#[derive(Default)]
pub struct FakeHost {
    pub worlds: RefCell<HashSet<String>>,
    /// Online players and their live state.
    pub players: RefCell<BTreeMap<PlayerId, PlayerState>>,
    pub notices: RefCell<Vec<(PlayerId, Notice)>>,
    pub kits: RefCell<Vec<(PlayerId, Role)>>,
}

impl FakeHost {
    pub fn new() -> Self {
        let host = Self::default();
        for world in ["hub", "arenas", "survival"] {
            host.worlds.borrow_mut().insert(world.into());
        }
        host
    }

    /// Brings a player online standing somewhere in the survival world
    /// with a sword and some levels.
    pub fn spawn_player(&self, id: u64) -> PlayerId {
        let player = PlayerId(id);
        self.players.borrow_mut().insert(player, home_state(id));
        player
    }

    pub fn go_offline(&self, player: PlayerId) -> PlayerState {
        self.players.borrow_mut().remove(&player).unwrap()
    }

    pub fn come_online(&self, player: PlayerId, state: PlayerState) {
        self.players.borrow_mut().insert(player, state);
    }

    pub fn state(&self, player: PlayerId) -> PlayerState {
        self.players.borrow()[&player].clone()
    }

    pub fn location(&self, player: PlayerId) -> Location {
        self.state(player).location
    }

    pub fn notices_for(&self, player: PlayerId) -> Vec<Notice> {
        self.notices
            .borrow()
            .iter()
            .filter(|(p, _)| *p == player)
            .map(|(_, n)| n.clone())
            .collect()
    }

    pub fn count_notices(&self, f: impl Fn(&Notice) -> bool) -> usize {
        self.notices.borrow().iter().filter(|(_, n)| f(n)).count()
    }

    fn with_state(&self, player: PlayerId, f: impl FnOnce(&mut PlayerState)) {
        if let Some(state) = self.players.borrow_mut().get_mut(&player) {
            f(state);
        }
    }
}

pub fn home_state(id: u64) -> PlayerState {
    PlayerState {
        location: Location::new("survival", Pose::at(id as f64 * 10.0, 70.0, -5.0).facing(90.0, 0.0)),
        slots: vec![SlotContents {
            slot: EquipmentSlot::Storage(0),
            item: ItemBlob(format!("netherite_sword#{id}")),
        }],
        progression: Progression {
            level: 10 + id as u32,
            progress: 0.5,
        },
        effects: vec![TimedEffect::new("minecraft:night_vision", 6000)],
    }
}

impl WorldAccess for FakeHost {
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

impl PlayerStateAccess for FakeHost {
    fn read_state(&self, player: PlayerId) -> Option<PlayerState> {
        self.players.borrow().get(&player).cloned()
    }

    fn clear_slots(&self, player: PlayerId) {
        self.with_state(player, |s| s.slots.clear());
    }

    fn set_slot(&self, player: PlayerId, slot: EquipmentSlot, item: &ItemBlob) {
        self.with_state(player, |s| {
            s.slots.retain(|c| c.slot != slot);
            s.slots.push(SlotContents {
                slot,
                item: item.clone(),
            });
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

impl MatchHost for FakeHost {
    fn equip_role_kit(&self, player: PlayerId, role: Role) {
        self.kits.borrow_mut().push((player, role));
        self.with_state(player, |s| {
            s.slots.push(SlotContents {
                slot: EquipmentSlot::Storage(0),
                item: ItemBlob(format!("{}_kit", role.display_name().to_lowercase())),
            });
        });
    }

    fn notify(&self, player: PlayerId, notice: &Notice) {
        self.notices.borrow_mut().push((player, notice.clone()));
    }
}

// =========================================================================
// World fixture
// =========================================================================

pub const LOBBY: &str = "L";

/// Lobby "L": capacity 8, countdown 30 s, eligible arenas A1 and A2.
///
/// A1 spans x 0..=20 and A2 x 100..=120 in world "arenas"; each has one
/// hidden spawn and two regular spawns.
pub struct Fixture {
    pub host: Rc<FakeHost>,
    pub store: Rc<MemoryStore>,
    pub director: MatchDirector,
}

pub fn arena_region(x: i32) -> Region {
    Region::new("arenas", (x, 60, 0), (x + 20, 80, 20), 8)
}

pub fn fixture(seed: u64) -> Fixture {
    fixture_with(MatchConfig {
        rng_seed: Some(seed),
        ..MatchConfig::default()
    })
}

pub fn fixture_with(config: MatchConfig) -> Fixture {
    let store = Rc::new(MemoryStore::new());

    let mut lobbies = LobbyRegistry::new(store.clone());
    lobbies
        .register(LOBBY, Region::new("hub", (0, 64, 0), (9, 70, 9), 8))
        .unwrap();
    lobbies.set_countdown(LOBBY, 30).unwrap();
    lobbies.add_eligible_arena(LOBBY, "A1").unwrap();
    lobbies.add_eligible_arena(LOBBY, "A2").unwrap();

    let mut arenas = ArenaAllocator::new(store.clone());
    for (name, x) in [("A1", 0), ("A2", 100)] {
        arenas.register(name, arena_region(x)).unwrap();
        let x = f64::from(x);
        arenas
            .add_spawn(name, SpawnGroup::Hidden, Pose::at(x + 2.5, 61.0, 2.5))
            .unwrap();
        arenas
            .add_spawn(name, SpawnGroup::Regular, Pose::at(x + 10.5, 61.0, 10.5))
            .unwrap();
        arenas
            .add_spawn(name, SpawnGroup::Regular, Pose::at(x + 12.5, 61.0, 12.5))
            .unwrap();
    }

    let host = Rc::new(FakeHost::new());
    let ctx = MatchContext::new(
        Rc::new(RefCell::new(lobbies)),
        Rc::new(RefCell::new(arenas)),
        host.clone(),
        config,
        TickConfig::default(),
    );
    let snapshots = SnapshotManager::new(Box::new(MemorySnapshotStore::new()));
    let director = MatchDirector::new(ctx, snapshots);
    Fixture {
        host,
        store,
        director,
    }
}

impl Fixture {
    /// Brings player `id` online and joins them to lobby L.
    pub fn join(&mut self, id: u64) -> PlayerId {
        let player = self.host.spawn_player(id);
        self.director.join(player, LOBBY).unwrap();
        player
    }

    pub fn session(&self) -> &shroud_match::MatchSession {
        self.director.session(LOBBY).unwrap()
    }

    pub fn claimed_by(&self, arena: &str) -> Option<String> {
        self.director
            .context()
            .arenas
            .borrow()
            .claimed_by(arena)
            .map(str::to_owned)
    }

    /// Registers another lobby in the hub and gives it a session.
    pub fn add_lobby(&mut self, name: &str, x: i32, capacity: usize, arenas: &[&str]) {
        {
            let ctx = self.director.context();
            let mut lobbies = ctx.lobbies.borrow_mut();
            lobbies
                .register(name, Region::new("hub", (x, 64, 0), (x + 9, 70, 9), capacity))
                .unwrap();
            for arena in arenas {
                lobbies.add_eligible_arena(name, arena).unwrap();
            }
        }
        self.director.sync_lobbies();
    }

    /// Which arena region the player is standing in, by x coordinate.
    pub fn arena_of(&self, player: PlayerId) -> Option<&'static str> {
        let loc = self.host.location(player);
        if loc.world != "arenas" {
            return None;
        }
        match loc.pose.x {
            x if (0.0..=21.0).contains(&x) => Some("A1"),
            x if (100.0..=121.0).contains(&x) => Some("A2"),
            _ => None,
        }
    }
}
