//! The arena record and its transient claim.

use serde::{Deserialize, Serialize};
use shroud_model::{Location, Pose, Region};

/// Which spawn list a player draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnGroup {
    /// The single hidden-role player.
    Hidden,
    /// Everyone else.
    Regular,
}

/// A registered arena.
///
/// The region and both spawn lists are persisted. The claim is transient:
/// it is never written out and every arena loads unclaimed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub name: String,
    pub region: Region,
    #[serde(default)]
    pub hidden_spawns: Vec<Pose>,
    #[serde(default)]
    pub regular_spawns: Vec<Pose>,
    /// Lobby currently holding this arena. `Some` iff claimed.
    #[serde(skip)]
    pub(crate) claimed_by: Option<String>,
}

impl Arena {
    pub fn new(name: impl Into<String>, region: Region) -> Self {
        Self {
            name: name.into(),
            region,
            hidden_spawns: Vec::new(),
            regular_spawns: Vec::new(),
            claimed_by: None,
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed_by.is_some()
    }

    /// The lobby holding the claim, if any.
    pub fn claimed_by(&self) -> Option<&str> {
        self.claimed_by.as_deref()
    }

    pub fn spawns(&self, group: SpawnGroup) -> &[Pose] {
        match group {
            SpawnGroup::Hidden => &self.hidden_spawns,
            SpawnGroup::Regular => &self.regular_spawns,
        }
    }

    pub(crate) fn spawns_mut(&mut self, group: SpawnGroup) -> &mut Vec<Pose> {
        match group {
            SpawnGroup::Hidden => &mut self.hidden_spawns,
            SpawnGroup::Regular => &mut self.regular_spawns,
        }
    }

    /// The spawn at `index` in the group's list, wrapping around. An empty
    /// list falls back to the region's floor centre.
    pub fn spawn_for(&self, group: SpawnGroup, index: usize) -> Location {
        let list = self.spawns(group);
        let pose = if list.is_empty() {
            self.region.floor_center()
        } else {
            list[index % list.len()]
        };
        Location::new(self.region.world.clone(), pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> Arena {
        Arena::new("A1", Region::new("arenas", (100, 60, 100), (120, 80, 130), 8))
    }

    #[test]
    fn test_spawn_for_round_robin() {
        let mut a = arena();
        a.regular_spawns = vec![Pose::at(1.0, 60.0, 1.0), Pose::at(2.0, 60.0, 2.0)];
        assert_eq!(a.spawn_for(SpawnGroup::Regular, 0).pose.x, 1.0);
        assert_eq!(a.spawn_for(SpawnGroup::Regular, 1).pose.x, 2.0);
        assert_eq!(a.spawn_for(SpawnGroup::Regular, 2).pose.x, 1.0);
        assert_eq!(a.spawn_for(SpawnGroup::Regular, 7).pose.x, 2.0);
    }

    #[test]
    fn test_spawn_for_empty_list_uses_floor_center() {
        let a = arena();
        let loc = a.spawn_for(SpawnGroup::Hidden, 3);
        assert_eq!(loc.world, "arenas");
        assert_eq!(loc.pose, Pose::at(110.5, 60.0, 115.5));
    }

    #[test]
    fn test_claim_is_not_serialized() {
        let mut a = arena();
        a.claimed_by = Some("L".into());
        let json = serde_json::to_string(&a).unwrap();
        assert!(!json.contains("claimed"));
        let back: Arena = serde_json::from_str(&json).unwrap();
        assert!(!back.is_claimed());
    }
}
