//! Lane indexing
//!
//! The road is split into three 4 m bands measured from the centerline.
//! Band boundaries belong to the lane on their right (higher index), so
//! lane 0 is `[0, 4)`, lane 1 is `[4, 8)` and lane 2 is `[8, 12)`. Anything
//! else, including NaN, is off the drivable road.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lane width [m]
pub const LANE_WIDTH: f64 = 4.0;
/// Number of lanes on our side of the road
pub const NUM_LANES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Lane {
    Left,
    Middle,
    Right,
}

impl Lane {
    pub const ALL: [Lane; NUM_LANES] = [Lane::Left, Lane::Middle, Lane::Right];

    pub fn from_index(index: i64) -> Option<Lane> {
        match index {
            0 => Some(Lane::Left),
            1 => Some(Lane::Middle),
            2 => Some(Lane::Right),
            _ => None,
        }
    }

    /// Lane containing lateral offset `d`, `None` when off-road
    pub fn from_d(d: f64) -> Option<Lane> {
        // written so that NaN falls through to None
        if !(d >= 0.0 && d < LANE_WIDTH * NUM_LANES as f64) {
            return None;
        }
        Lane::from_index((d / LANE_WIDTH).floor() as i64)
    }

    pub fn index(self) -> usize {
        match self {
            Lane::Left => 0,
            Lane::Middle => 1,
            Lane::Right => 2,
        }
    }

    /// Lateral offset of the lane center [m]
    pub fn center_d(self) -> f64 {
        LANE_WIDTH * (self.index() as f64 + 0.5)
    }

    /// Lateral offset of the lane's left boundary [m]
    pub fn left_boundary_d(self) -> f64 {
        LANE_WIDTH * self.index() as f64
    }

    pub fn contains(self, d: f64) -> bool {
        Lane::from_d(d) == Some(self)
    }

    pub fn to_left(self) -> Option<Lane> {
        Lane::from_index(self.index() as i64 - 1)
    }

    pub fn to_right(self) -> Option<Lane> {
        Lane::from_index(self.index() as i64 + 1)
    }

    /// Adjacent lanes, left one first
    pub fn neighbors(self) -> impl Iterator<Item = Lane> {
        self.to_left().into_iter().chain(self.to_right())
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Total lane lookup: `0`, `1`, `2`, or `-1` for off-road offsets
pub fn lane_index(d: f64) -> i32 {
    Lane::from_d(d).map_or(-1, |lane| lane.index() as i32)
}
