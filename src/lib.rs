//! highway_planner - motion planning for an autonomous vehicle on a multi-lane highway
//!
//! Each planning cycle consumes the ego pose, the unconsumed tail of the
//! previous trajectory and a snapshot of the surrounding traffic, and emits
//! the next 50 trajectory points. Lane changes are chosen by scoring
//! spline trajectories towards anchor points in the adjacent lanes.

// Core modules
pub mod common;
pub mod utils;

// Algorithm modules
pub mod mapping;
pub mod path_planning;
pub mod mission_planning;

// Interfaces
pub mod io;
pub mod simulation;

// Re-export common types for convenience
pub use common::{FrenetPoint, Mph, Point2D, Pose2D, RoadFrame, TrackedVehicle};
pub use common::{RoboticsError, RoboticsResult};
pub use io::{PlannerConfig, Telemetry};
pub use mapping::{Lane, WaypointMap};
pub use mission_planning::{BehaviorController, BehaviorState, EgoPlanningState};
pub use path_planning::PlannedPath;
