//! Runs one scripted match against a console host with everything in
//! memory. Pass a TOML config path to override the short demo timings.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use shroud::prelude::*;
use shroud_model::{EquipmentSlot, ItemBlob, TimedEffect};
use shroud_registry::MemoryStore;
use shroud_snapshot::{MemorySnapshotStore, PlayerState, Progression, SlotContents};
use tracing::info;

// ---------------------------------------------------------------------------
// Console host
// ---------------------------------------------------------------------------

/// Keeps player state in a map and prints every notice.
#[derive(Default)]
struct ConsoleHost {
    players: RefCell<BTreeMap<PlayerId, PlayerState>>,
}

impl ConsoleHost {
    fn connect(&self, id: u64) -> PlayerId {
        let player = PlayerId(id);
        let state = PlayerState {
            location: Location::new("world", Pose::at(100.0 + id as f64, 64.0, 100.0)),
            slots: vec![SlotContents {
                slot: EquipmentSlot::MainHand,
                item: ItemBlob(format!("diamond_pickaxe#{id}")),
            }],
            progression: Progression {
                level: 5,
                progress: 0.0,
            },
            effects: Vec::new(),
        };
        self.players.borrow_mut().insert(player, state);
        player
    }

    fn with_state(&self, player: PlayerId, f: impl FnOnce(&mut PlayerState)) {
        if let Some(state) = self.players.borrow_mut().get_mut(&player) {
            f(state);
        }
    }
}

impl WorldAccess for ConsoleHost {
    fn is_world_loaded(&self, world: &str) -> bool {
        matches!(world, "world" | "hub" | "arenas")
    }

    fn is_online(&self, player: PlayerId) -> bool {
        self.players.borrow().contains_key(&player)
    }

    fn relocate(&self, player: PlayerId, to: &Location) {
        info!(%player, %to, "teleport");
        self.with_state(player, |s| s.location = to.clone());
    }
}

impl PlayerStateAccess for ConsoleHost {
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

impl MatchHost for ConsoleHost {
    fn equip_role_kit(&self, player: PlayerId, role: Role) {
        info!(%player, %role, icon = role.icon(), "kit equipped");
        self.with_state(player, |s| {
            s.slots.push(SlotContents {
                slot: EquipmentSlot::Chestplate,
                item: ItemBlob(role.icon().to_owned()),
            })
        });
    }

    fn notify(&self, player: PlayerId, notice: &Notice) {
        println!("  [{player}] {:?}: {notice}", notice.channel());
    }
}

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

fn demo_config() -> ShroudConfig {
    ShroudConfig {
        game: MatchConfig {
            grace_window_secs: 2,
            grace_retry_secs: 1,
            vote_timeout_secs: 5,
            match_duration_secs: 12,
            reminder_marks: vec![10],
            final_countdown_secs: 3,
            ..MatchConfig::default()
        },
        ..ShroudConfig::default()
    }
}

fn build_world(shroud: &mut Shroud) -> Result<(), ShroudError> {
    shroud.register_lobby("courtyard", Region::new("hub", (0, 64, 0), (15, 70, 15), 6))?;
    shroud.set_countdown("courtyard", 3)?;
    shroud.add_join_marker("courtyard", BlockPos::new("hub", 0, 65, 7))?;

    for (name, x) in [("library", 0), ("greenhouse", 200), ("catacombs", 400)] {
        shroud.register_arena(name, Region::new("arenas", (x, 40, 0), (x + 40, 80, 40), 8))?;
        let x = f64::from(x);
        shroud.add_arena_spawn(name, SpawnGroup::Hidden, Pose::at(x + 35.5, 41.0, 35.5))?;
        for i in 0..3 {
            let offset = 4.0 * f64::from(i);
            shroud.add_arena_spawn(
                name,
                SpawnGroup::Regular,
                Pose::at(x + 4.5 + offset, 41.0, 4.5).facing(180.0, 0.0),
            )?;
        }
        shroud.add_eligible_arena("courtyard", name)?;
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => ShroudConfig::load(path)?,
        None => demo_config(),
    };
    shroud::logging::init(&config.logging);

    let host = Rc::new(ConsoleHost::default());
    let mut shroud = Shroud::with_stores(
        config,
        host.clone(),
        Rc::new(MemoryStore::new()),
        Box::new(MemorySnapshotStore::new()),
    )?;
    build_world(&mut shroud)?;

    let (handle, commands) = shroud::channel(32);
    let players: Vec<PlayerId> = (1..=4).map(|id| host.connect(id)).collect();
    let sign = BlockPos::new("hub", 0, 65, 7);

    let script = async move {
        for &player in &players {
            handle.use_marker(player, sign.clone()).await?;
        }
        handle.set_role(players[0], Role::Survivor).await?;

        // Countdown, then the vote opens.
        tokio::time::sleep(Duration::from_secs(4)).await;
        for (i, &player) in players.iter().enumerate() {
            let arena = if i % 2 == 0 { "library" } else { "catacombs" };
            if let Err(e) = handle.vote(player, arena).await {
                info!(%player, error = %e, "vote not counted");
            }
        }

        let status = handle.status("courtyard").await?;
        info!(phase = %status.phase, arena = ?status.arena, "after the vote");

        tokio::time::sleep(Duration::from_secs(14)).await;
        let restored = handle.dismiss("courtyard").await?;
        info!(players = restored.len(), "everyone sent home");
        handle.shutdown().await?;
        Ok::<_, ShroudError>(())
    };

    let ((), outcome) = tokio::join!(shroud.run(commands), script);
    outcome?;

    for (player, state) in host.players.borrow().iter() {
        println!("{player}: {} holding {:?}", state.location, state.slots);
    }
    Ok(())
}
