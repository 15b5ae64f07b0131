//! Geometry types: block positions, poses, and axis-aligned regions.
//!
//! Coordinates follow the host game's convention: `y` is up, blocks are
//! addressed by integer coordinates, and a standing player's position is a
//! floating-point point with a facing (`yaw`, `pitch`).

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// BlockPos
// ---------------------------------------------------------------------------

/// An integer block coordinate inside a named world.
///
/// Used for join/leave markers (the sign a player clicks) and for "which
/// arena is this block in?" lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(world: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {}, {})", self.world, self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Pose / Location
// ---------------------------------------------------------------------------

/// A position plus facing, without a world.
///
/// Arena spawn lists and lobby spawn points store poses; the world comes
/// from the owning region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
}

impl Pose {
    /// A pose with the default facing (`yaw = 0`, `pitch = 0`).
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Returns the same position with the given facing.
    pub fn facing(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self
    }
}

/// A pose inside a specific world. This is what the host teleports to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub world: String,
    pub pose: Pose,
}

impl Location {
    pub fn new(world: impl Into<String>, pose: Pose) -> Self {
        Self {
            world: world.into(),
            pose,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({:.2}, {:.2}, {:.2})",
            self.world, self.pose.x, self.pose.y, self.pose.z
        )
    }
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// An axis-aligned box of blocks in a named world, plus a player capacity.
///
/// The two corners are stored exactly as registered and may be given in
/// any order; every query normalizes min/max per axis. Equal corners
/// describe a single-block region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub world: String,
    pub corner_a: (i32, i32, i32),
    pub corner_b: (i32, i32, i32),
    pub capacity: usize,
}

impl Region {
    pub fn new(
        world: impl Into<String>,
        corner_a: (i32, i32, i32),
        corner_b: (i32, i32, i32),
        capacity: usize,
    ) -> Self {
        Self {
            world: world.into(),
            corner_a,
            corner_b,
            capacity,
        }
    }

    /// The lowest corner on every axis.
    pub fn min(&self) -> (i32, i32, i32) {
        let (a, b) = (self.corner_a, self.corner_b);
        (a.0.min(b.0), a.1.min(b.1), a.2.min(b.2))
    }

    /// The highest corner on every axis.
    pub fn max(&self) -> (i32, i32, i32) {
        let (a, b) = (self.corner_a, self.corner_b);
        (a.0.max(b.0), a.1.max(b.1), a.2.max(b.2))
    }

    /// Returns `true` if the block lies inside the box (inclusive on all
    /// faces) and in the same world.
    pub fn contains_block(&self, pos: &BlockPos) -> bool {
        if pos.world != self.world {
            return false;
        }
        let (lo, hi) = (self.min(), self.max());
        (lo.0..=hi.0).contains(&pos.x)
            && (lo.1..=hi.1).contains(&pos.y)
            && (lo.2..=hi.2).contains(&pos.z)
    }

    /// Returns `true` if a free-standing point lies inside the box.
    ///
    /// A block at `max` spans up to `max + 1`, so the upper faces are
    /// extended by one to admit a player standing on the top edge.
    pub fn contains_point(&self, x: f64, y: f64, z: f64) -> bool {
        let (lo, hi) = (self.min(), self.max());
        let within = |v: f64, lo: i32, hi: i32| v >= f64::from(lo) && v <= f64::from(hi) + 1.0;
        within(x, lo.0, hi.0) && within(y, lo.1, hi.1) && within(z, lo.2, hi.2)
    }

    /// The centre of the box at floor height (lowest `y`), facing the
    /// default direction. Used when no explicit spawn pose is registered.
    pub fn floor_center(&self) -> Pose {
        let (a, b) = (self.corner_a, self.corner_b);
        let cx = f64::from(a.0 + b.0) / 2.0 + 0.5;
        let cz = f64::from(a.2 + b.2) / 2.0 + 0.5;
        Pose::at(cx, f64::from(self.min().1), cz)
    }

    /// [`floor_center`](Self::floor_center) as a full location.
    pub fn center_location(&self) -> Location {
        Location::new(self.world.clone(), self.floor_center())
    }
}
