//! Integration tests for the `Shroud` runtime: config loading, persisted
//! definitions, stranded-player recovery, markers, and the tick loop.

mod common;

use std::rc::Rc;
use std::time::Duration;

use common::{TestHost, home_state};
use shroud::Tick;
use shroud::prelude::*;
use shroud_registry::MemoryStore;
use shroud_snapshot::MemorySnapshotStore;
use tempfile::TempDir;

fn config_in(dir: &TempDir) -> ShroudConfig {
    ShroudConfig {
        data_dir: dir.path().to_path_buf(),
        game: MatchConfig {
            rng_seed: Some(21),
            ..MatchConfig::default()
        },
        ..ShroudConfig::default()
    }
}

/// Lobby "L" in the hub with arena "A1" as its only eligible arena.
fn define_world(shroud: &mut Shroud) {
    shroud
        .register_lobby("L", Region::new("hub", (0, 64, 0), (9, 70, 9), 4))
        .unwrap();
    shroud.set_countdown("L", 30).unwrap();
    shroud
        .register_arena("A1", Region::new("arenas", (0, 60, 0), (20, 80, 20), 8))
        .unwrap();
    shroud
        .add_arena_spawn("A1", SpawnGroup::Hidden, Pose::at(2.5, 61.0, 2.5))
        .unwrap();
    shroud
        .add_arena_spawn("A1", SpawnGroup::Regular, Pose::at(10.5, 61.0, 10.5))
        .unwrap();
    assert!(shroud.add_eligible_arena("L", "A1").unwrap());
}

fn in_memory(host: &Rc<TestHost>) -> Shroud {
    let config = ShroudConfig {
        game: MatchConfig {
            rng_seed: Some(3),
            ..MatchConfig::default()
        },
        ..ShroudConfig::default()
    };
    let mut shroud = Shroud::with_stores(
        config,
        host.clone(),
        Rc::new(MemoryStore::new()),
        Box::new(MemorySnapshotStore::new()),
    )
    .unwrap();
    define_world(&mut shroud);
    shroud
}

// =========================================================================
// Config
// =========================================================================

#[test]
fn test_missing_config_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let cfg = ShroudConfig::load(dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg, ShroudConfig::default());
}

#[test]
fn test_config_file_loads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shroud.toml");
    std::fs::write(
        &path,
        r#"
        data_dir = "/srv/shroud"

        [tick]
        tick_rate_hz = 10

        [game]
        vote_candidates = 2
        reminder_marks = [120, 60]

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();

    let cfg = ShroudConfig::load(&path).unwrap();
    assert_eq!(cfg.data_dir, std::path::PathBuf::from("/srv/shroud"));
    assert_eq!(cfg.tick.tick_rate_hz, 10);
    assert_eq!(cfg.game.vote_candidates, 2);
    assert_eq!(cfg.game.reminder_marks, vec![120, 60]);
    assert_eq!(cfg.game.match_duration_secs, 300);
    assert_eq!(cfg.logging.level, "debug");
}

#[test]
fn test_bad_config_file_names_the_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shroud.toml");
    std::fs::write(&path, "data_dir = [").unwrap();

    let err = ShroudConfig::load(&path).unwrap_err();
    assert!(matches!(err, ShroudError::Config { .. }));
    assert!(err.to_string().contains("shroud.toml"));
}

// =========================================================================
// Persistence
// =========================================================================

#[test]
fn test_definitions_survive_restart() {
    let dir = TempDir::new().unwrap();
    let host = Rc::new(TestHost::new());
    {
        let mut shroud = Shroud::open(config_in(&dir), host.clone()).unwrap();
        define_world(&mut shroud);
    }

    let shroud = Shroud::open(config_in(&dir), host).unwrap();
    let status = shroud.status("L").unwrap();
    assert_eq!(status.phase, MatchPhase::Waiting);
    assert_eq!(status.capacity, 4);

    let ctx = shroud.director().context();
    let lobbies = ctx.lobbies.borrow();
    let lobby = lobbies.get("L").unwrap();
    assert_eq!(lobby.countdown_secs(), 30);
    assert_eq!(lobby.eligible(), vec!["A1".to_owned()]);
    let arenas = ctx.arenas.borrow();
    assert_eq!(arenas.get("A1").unwrap().spawns(SpawnGroup::Regular).len(), 1);
    assert_eq!(arenas.claimed_by("A1"), None);
}

#[test]
fn test_duplicate_lobby_rejected() {
    let host = Rc::new(TestHost::new());
    let mut shroud = in_memory(&host);
    let err = shroud
        .register_lobby("L", Region::new("hub", (0, 0, 0), (1, 1, 1), 2))
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::AlreadyExists));
}

#[test]
fn test_lobby_usable_after_failed_save() {
    let host = Rc::new(TestHost::new());
    let store = Rc::new(MemoryStore::new());
    let mut shroud = Shroud::with_stores(
        ShroudConfig::default(),
        host.clone(),
        store.clone(),
        Box::new(MemorySnapshotStore::new()),
    )
    .unwrap();

    store.set_fail_writes(true);
    let err = shroud
        .register_lobby("L", Region::new("hub", (0, 64, 0), (9, 70, 9), 4))
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Persistence));
    assert!(store.stored_lobby("L").is_none());

    let p = host.spawn_player(1);
    shroud.join(p, "L").unwrap();
    let status = shroud.status("L").unwrap();
    assert_eq!(status.occupants, vec![p]);
    assert_eq!(status.phase, MatchPhase::Waiting);
}

#[test]
fn test_lobby_spawn_must_be_inside() {
    let host = Rc::new(TestHost::new());
    let mut shroud = in_memory(&host);
    let err = shroud
        .set_lobby_spawn("L", Pose::at(50.0, 65.0, 5.0))
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Conflict));

    shroud.set_lobby_spawn("L", Pose::at(9.9, 64.0, 1.0)).unwrap();
    let p = host.spawn_player(1);
    shroud.join(p, "L").unwrap();
    assert_eq!(host.state(p).location.pose.x, 9.9);
}

#[test]
fn test_stranded_player_restored_after_restart() {
    let dir = TempDir::new().unwrap();
    let host = Rc::new(TestHost::new());
    let p = host.spawn_player(7);
    {
        let mut shroud = Shroud::open(config_in(&dir), host.clone()).unwrap();
        define_world(&mut shroud);
        shroud.join(p, "L").unwrap();
        // The process dies here with the player still in the hub.
    }
    assert_ne!(host.state(p), home_state(7));

    let mut shroud = Shroud::open(config_in(&dir), host.clone()).unwrap();
    assert_eq!(shroud.director().snapshots().pending().unwrap(), vec![p]);
    assert_eq!(shroud.recover_stranded().unwrap(), vec![p]);
    assert_eq!(host.state(p), home_state(7));
    assert!(shroud.director().snapshots().pending().unwrap().is_empty());
}

// =========================================================================
// Player operations
// =========================================================================

#[test]
fn test_markers_join_and_leave() {
    let host = Rc::new(TestHost::new());
    let mut shroud = in_memory(&host);
    let join_sign = BlockPos::new("hub", 1, 65, 1);
    let leave_sign = BlockPos::new("hub", 8, 65, 8);
    shroud.add_join_marker("L", join_sign.clone()).unwrap();
    shroud.add_leave_marker("L", leave_sign.clone()).unwrap();
    let p = host.spawn_player(1);

    let err = shroud.use_marker(p, &leave_sign).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotFound));

    assert_eq!(
        shroud.use_marker(p, &join_sign).unwrap(),
        Some(MarkerAction::Joined("L".into()))
    );
    assert_eq!(
        shroud.use_marker(p, &BlockPos::new("hub", 4, 65, 4)).unwrap(),
        None
    );
    assert_eq!(
        shroud.use_marker(p, &leave_sign).unwrap(),
        Some(MarkerAction::Left("L".into()))
    );
    assert_eq!(host.state(p), home_state(1));
}

#[test]
fn test_disconnect_then_reconnect() {
    let host = Rc::new(TestHost::new());
    let mut shroud = in_memory(&host);
    let p = host.spawn_player(1);
    shroud.join(p, "L").unwrap();

    let parked = host.players.borrow_mut().remove(&p).unwrap();
    assert!(shroud.player_disconnected(p).unwrap());
    assert!(!shroud.player_disconnected(p).unwrap());
    assert!(shroud.status("L").unwrap().occupants.is_empty());

    host.players.borrow_mut().insert(p, parked);
    assert!(shroud.player_connected(p).unwrap());
    assert_eq!(host.state(p), home_state(1));
    assert!(!shroud.player_connected(p).unwrap());
}

// =========================================================================
// Runtime loop
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_run_loop_drives_a_match() {
    let host = Rc::new(TestHost::new());
    let mut shroud = in_memory(&host);
    let (handle, commands) = shroud::channel(8);
    let p1 = host.spawn_player(1);
    let p2 = host.spawn_player(2);

    let script = async {
        handle.join(p1, "L").await.unwrap();
        handle.join(p2, "L").await.unwrap();
        assert_eq!(
            handle.status("L").await.unwrap().phase,
            MatchPhase::Countdown
        );

        tokio::time::sleep(Duration::from_secs(31)).await;
        let status = handle.status("L").await.unwrap();
        assert_eq!(status.phase, MatchPhase::InProgress);
        assert_eq!(status.arena.as_deref(), Some("A1"));

        let err = handle.set_role(p1, Role::Survivor).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Conflict));

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(
            handle.status("L").await.unwrap().phase,
            MatchPhase::PostMatch
        );
        assert_eq!(handle.dismiss("L").await.unwrap(), vec![p1, p2]);
        handle.shutdown().await.unwrap();
    };

    tokio::join!(shroud.run(commands), script);

    assert_eq!(host.state(p1), home_state(1));
    assert_eq!(host.state(p2), home_state(2));
    assert!(shroud.director().now() >= Tick(330 * 20));
    assert!(matches!(
        handle.status("L").await,
        Err(ShroudError::Unavailable)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_stops_when_handles_drop() {
    let host = Rc::new(TestHost::new());
    let mut shroud = in_memory(&host);
    let (handle, commands) = shroud::channel(8);

    let script = async move {
        let p = host.spawn_player(1);
        handle.join(p, "L").await.unwrap();
        let err = handle.join(p, "nowhere").await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
        drop(handle);
    };
    tokio::join!(shroud.run(commands), script);
    assert_eq!(shroud.status("L").unwrap().occupants, vec![PlayerId(1)]);
}
