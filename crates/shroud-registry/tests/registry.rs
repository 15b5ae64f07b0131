//! Integration tests for lobby registration, arena allocation, and the
//! persistence-failure contract.

use std::rc::Rc;

use shroud_model::{BlockPos, ErrorKind, Pose, Region};
use shroud_registry::{
    ArenaAllocator, DefinitionStore, JsonDirStore, LobbyRegistry, MemoryStore, RegistryError,
    SpawnGroup,
};

// =========================================================================
// Helpers
// =========================================================================

fn lobby_region() -> Region {
    Region::new("hub", (0, 64, 0), (9, 70, 9), 8)
}

fn arena_region(x: i32) -> Region {
    Region::new("arenas", (x, 60, 0), (x + 20, 80, 20), 8)
}

fn memory() -> Rc<MemoryStore> {
    Rc::new(MemoryStore::new())
}

fn allocator_with(names: &[&str]) -> ArenaAllocator {
    let mut alloc = ArenaAllocator::new(memory());
    for (i, name) in names.iter().enumerate() {
        alloc.register(name, arena_region(i as i32 * 100)).unwrap();
    }
    alloc
}

// =========================================================================
// Lobby registry
// =========================================================================

#[test]
fn test_register_lobby_and_duplicate() {
    let mut reg = LobbyRegistry::new(memory());
    reg.register("L", lobby_region()).unwrap();
    let err = reg.register("L", lobby_region()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(reg.len(), 1);
}

#[test]
fn test_mutations_on_unknown_lobby_are_not_found() {
    let mut reg = LobbyRegistry::new(memory());
    let err = reg.set_countdown("nope", 10).unwrap_err();
    assert!(matches!(err, RegistryError::LobbyNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(
        reg.add_join_marker("nope", BlockPos::new("hub", 0, 0, 0))
            .unwrap_err()
            .kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn test_eligible_arena_set_semantics() {
    let mut reg = LobbyRegistry::new(memory());
    reg.register("L", lobby_region()).unwrap();
    assert!(reg.add_eligible_arena("L", "A1").unwrap());
    assert!(!reg.add_eligible_arena("L", "A1").unwrap());
    assert!(reg.add_eligible_arena("L", "A2").unwrap());
    assert_eq!(reg.get("L").unwrap().eligible(), vec!["A1", "A2"]);

    assert!(reg.remove_eligible_arena("L", "A1").unwrap());
    assert!(!reg.remove_eligible_arena("L", "A1").unwrap());
    assert_eq!(reg.get("L").unwrap().eligible(), vec!["A2"]);
}

#[test]
fn test_spawn_must_be_inside_lobby() {
    let mut reg = LobbyRegistry::new(memory());
    reg.register("L", lobby_region()).unwrap();

    let err = reg.set_spawn("L", Pose::at(50.0, 65.0, 5.0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(reg.get("L").unwrap().spawn.is_none());

    // The top edge of the last block still counts.
    reg.set_spawn("L", Pose::at(10.0, 71.0, 10.0)).unwrap();
    assert_eq!(reg.get("L").unwrap().spawn_location().pose.x, 10.0);
}

#[test]
fn test_marker_lookup() {
    let mut reg = LobbyRegistry::new(memory());
    reg.register("L", lobby_region()).unwrap();
    reg.register("M", Region::new("hub", (50, 64, 0), (59, 70, 9), 4))
        .unwrap();
    let join = BlockPos::new("hub", 3, 65, -1);
    let leave = BlockPos::new("hub", 4, 65, -1);
    reg.add_join_marker("M", join.clone()).unwrap();
    reg.add_leave_marker("M", leave.clone()).unwrap();

    assert_eq!(reg.lobby_for_join_marker(&join).unwrap().name, "M");
    assert_eq!(reg.lobby_for_leave_marker(&leave).unwrap().name, "M");
    assert!(reg.lobby_for_join_marker(&leave).is_none());
}

#[test]
fn test_persistence_failure_keeps_memory_change() {
    let store = memory();
    let mut reg = LobbyRegistry::new(store.clone());
    reg.register("L", lobby_region()).unwrap();

    store.set_fail_writes(true);
    let err = reg.set_countdown("L", 45).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert_eq!(reg.get("L").unwrap().countdown_secs(), 45);
    assert_eq!(store.stored_lobby("L").unwrap().countdown_secs(), 30);
}

#[test]
fn test_registry_reload_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store: Rc<dyn DefinitionStore> = Rc::new(JsonDirStore::new(dir.path()));
    {
        let mut reg = LobbyRegistry::new(store.clone());
        reg.register("L", lobby_region()).unwrap();
        reg.set_countdown("L", 12).unwrap();
        reg.add_eligible_arena("L", "A1").unwrap();
        reg.add_join_marker("L", BlockPos::new("hub", 1, 65, -1)).unwrap();
    }

    let reg = LobbyRegistry::load(store).unwrap();
    let lobby = reg.get("L").unwrap();
    assert_eq!(lobby.countdown_secs(), 12);
    assert_eq!(lobby.eligible(), vec!["A1"]);
    assert_eq!(lobby.join_markers.len(), 1);
}

// =========================================================================
// Arena allocator
// =========================================================================

#[test]
fn test_claim_is_exclusive_until_release() {
    let mut alloc = allocator_with(&["A1"]);
    assert!(alloc.claim("A1", "L"));
    assert!(!alloc.claim("A1", "M"));
    assert!(!alloc.claim("A1", "L"));
    assert_eq!(alloc.claimed_by("A1"), Some("L"));

    alloc.release("A1");
    assert_eq!(alloc.claimed_by("A1"), None);
    assert!(alloc.claim("A1", "M"));
}

#[test]
fn test_release_is_idempotent() {
    let mut alloc = allocator_with(&["A1"]);
    alloc.release("A1");
    alloc.release("A1");
    alloc.release("unknown");
    assert!(alloc.claim("A1", "L"));
}

#[test]
fn test_claim_unknown_arena_fails() {
    let mut alloc = allocator_with(&[]);
    assert!(!alloc.claim("ghost", "L"));
}

#[test]
fn test_list_available_filters_unknown_and_claimed() {
    let mut alloc = allocator_with(&["A1", "A2", "A3"]);
    alloc.claim("A2", "M");
    let available = alloc.list_available(&["A3", "A2", "ghost", "A1"]);
    assert_eq!(available, vec!["A3", "A1"]);
}

#[test]
fn test_add_spawn_unknown_arena() {
    let mut alloc = allocator_with(&[]);
    let err = alloc
        .add_spawn("ghost", SpawnGroup::Regular, Pose::at(0.0, 0.0, 0.0))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_spawn_for_groups_are_independent() {
    let mut alloc = allocator_with(&["A1"]);
    alloc
        .add_spawn("A1", SpawnGroup::Hidden, Pose::at(1.0, 61.0, 1.0))
        .unwrap();
    alloc
        .add_spawn("A1", SpawnGroup::Regular, Pose::at(2.0, 61.0, 2.0))
        .unwrap();
    alloc
        .add_spawn("A1", SpawnGroup::Regular, Pose::at(3.0, 61.0, 3.0))
        .unwrap();

    assert_eq!(alloc.spawn_for("A1", SpawnGroup::Hidden, 5).unwrap().pose.x, 1.0);
    assert_eq!(alloc.spawn_for("A1", SpawnGroup::Regular, 0).unwrap().pose.x, 2.0);
    assert_eq!(alloc.spawn_for("A1", SpawnGroup::Regular, 3).unwrap().pose.x, 3.0);
    assert!(alloc.spawn_for("ghost", SpawnGroup::Regular, 0).is_none());
}

#[test]
fn test_reregister_keeps_claim_and_spawns() {
    let mut alloc = allocator_with(&["A1"]);
    alloc
        .add_spawn("A1", SpawnGroup::Regular, Pose::at(2.0, 61.0, 2.0))
        .unwrap();
    alloc.claim("A1", "L");

    alloc.register("A1", arena_region(500)).unwrap();
    let arena = alloc.get("A1").unwrap();
    assert_eq!(arena.claimed_by(), Some("L"));
    assert_eq!(arena.regular_spawns.len(), 1);
    assert_eq!(arena.region.min().0, 500);
}

#[test]
fn test_arena_containing() {
    let alloc = allocator_with(&["A1", "A2"]);
    let pos = BlockPos::new("arenas", 110, 70, 5);
    assert_eq!(alloc.arena_containing(&pos).unwrap().name, "A2");
    assert!(alloc
        .arena_containing(&BlockPos::new("hub", 110, 70, 5))
        .is_none());
}

#[test]
fn test_arena_persistence_failure_keeps_record() {
    let store = memory();
    let mut alloc = ArenaAllocator::new(store.clone());
    store.set_fail_writes(true);
    let err = alloc.register("A1", arena_region(0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert!(alloc.contains("A1"));
    assert!(store.stored_arena("A1").is_none());
}

#[test]
fn test_reload_loses_claims() {
    let store = memory();
    let mut alloc = ArenaAllocator::new(store.clone());
    alloc.register("A1", arena_region(0)).unwrap();
    alloc.claim("A1", "L");

    let reloaded = ArenaAllocator::load(store).unwrap();
    assert!(!reloaded.get("A1").unwrap().is_claimed());
}
