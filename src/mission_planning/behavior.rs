//! Behavior state machine
//!
//! States and the transition table of the lane-level behavior planner.
//! `Start` behaves exactly like `KeepLane`. The prepare states are entered
//! and left within a single planning cycle; they exist so that a committed
//! lane change is visible as `KeepLane -> Prepare* -> LaneChange*` in logs.

use std::fmt;

use crate::common::{Mph, RoboticsError, RoboticsResult};
use crate::mapping::Lane;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BehaviorState {
    #[default]
    Start,
    KeepLane,
    PrepareLaneChangeLeft,
    PrepareLaneChangeRight,
    LaneChangeLeft,
    LaneChangeRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviorEvent {
    /// Stay in (or fall back to) the current lane
    KeepLane,
    /// A cheaper lane was found on the left
    PrepareLeft,
    /// A cheaper lane was found on the right
    PrepareRight,
    /// Start the prepared lane change
    Commit,
    /// Lane change still under way
    Continue,
    /// Ego has settled in the goal lane
    Complete,
}

impl BehaviorState {
    pub fn is_lane_change(self) -> bool {
        matches!(self, BehaviorState::LaneChangeLeft | BehaviorState::LaneChangeRight)
    }

    /// `Start` and `KeepLane` branch identically
    pub fn is_keeping_lane(self) -> bool {
        matches!(self, BehaviorState::Start | BehaviorState::KeepLane)
    }

    /// Apply `event`, or fail if the table has no such transition
    pub fn transition(self, event: BehaviorEvent) -> RoboticsResult<BehaviorState> {
        use BehaviorEvent as E;
        use BehaviorState as S;

        let next = match (self, event) {
            (S::Start | S::KeepLane, E::KeepLane) => S::KeepLane,
            (S::Start | S::KeepLane, E::PrepareLeft) => S::PrepareLaneChangeLeft,
            (S::Start | S::KeepLane, E::PrepareRight) => S::PrepareLaneChangeRight,
            (S::PrepareLaneChangeLeft, E::Commit) => S::LaneChangeLeft,
            (S::PrepareLaneChangeRight, E::Commit) => S::LaneChangeRight,
            (S::LaneChangeLeft | S::LaneChangeRight, E::Continue) => self,
            (S::LaneChangeLeft | S::LaneChangeRight, E::Complete) => S::KeepLane,
            _ => {
                return Err(RoboticsError::InvalidTransition(format!(
                    "no transition from {} on {:?}",
                    self, event
                )))
            }
        };
        Ok(next)
    }
}

impl fmt::Display for BehaviorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BehaviorState::Start => "START",
            BehaviorState::KeepLane => "KL",
            BehaviorState::PrepareLaneChangeLeft => "PLCL",
            BehaviorState::PrepareLaneChangeRight => "PLCR",
            BehaviorState::LaneChangeLeft => "LCL",
            BehaviorState::LaneChangeRight => "LCR",
        };
        write!(f, "{}", name)
    }
}

/// Planning state carried from one cycle to the next
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EgoPlanningState {
    pub behavior: BehaviorState,
    pub goal_lane: Lane,
    /// Longitudinal position at which the current lane change was committed [m]
    pub goal_s: f64,
    pub reference_speed: Mph,
}

impl Default for EgoPlanningState {
    fn default() -> Self {
        Self {
            behavior: BehaviorState::Start,
            goal_lane: Lane::Middle,
            goal_s: 0.0,
            reference_speed: Mph(2.0),
        }
    }
}
