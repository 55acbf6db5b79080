//! Reference speed regulation
//!
//! The reference speed moves by at most one fixed step per cycle, which keeps
//! acceleration and jerk bounded without integrating rates explicitly.

use log::debug;
use serde::Deserialize;

use crate::common::{Mph, TrackedVehicle};
use crate::mapping::Lane;
use crate::mission_planning::behavior::BehaviorState;
use crate::path_planning::Blocker;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpeedConfig {
    pub min_speed: Mph,
    pub max_speed: Mph,
    /// Change applied per cycle [mph]
    pub step: f64,
    /// A lead vehicle projected within this gap is too close [m]
    pub too_close_distance: f64,
    /// A lead vehicle currently within this gap may be hit by a lane change [m]
    pub bump_distance: f64,
    /// Adjacent-lane vehicles laterally within this of the ego are merging [m]
    pub neighbor_lateral: f64,
    pub neighbor_ahead: f64,
    pub neighbor_behind: f64,
    /// Projected gap to the lead vehicle that allows holding speed [m]
    pub hold_projected_gap: f64,
    /// Current gap to the lead vehicle that allows holding speed [m]
    pub hold_current_gap: f64,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            min_speed: Mph(2.0),
            max_speed: Mph(49.95),
            step: 0.25,
            too_close_distance: 40.0,
            bump_distance: 5.0,
            neighbor_lateral: 3.0,
            neighbor_ahead: 60.0,
            neighbor_behind: 10.0,
            hold_projected_gap: 30.0,
            hold_current_gap: 15.0,
        }
    }
}

/// Where the ego is now and where it will be at the end of the previous path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EgoPosition {
    pub s: f64,
    pub d: f64,
    /// `s` at the end of the unconsumed previous path
    pub planned_s: f64,
    /// Time until the end of the unconsumed previous path [s]
    pub planned_time: f64,
}

/// Closest same-lane vehicle ahead of the ego
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeadVehicle {
    pub id: i64,
    /// [m/s]
    pub speed: f64,
    pub s: f64,
    /// `s` when the ego reaches the end of its previous path
    pub projected_s: f64,
}

impl LeadVehicle {
    pub fn as_blocker(&self) -> Blocker {
        Blocker {
            speed: self.speed,
            s: self.s,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrafficAssessment {
    pub too_close_ahead: bool,
    /// A lead vehicle is so close that any maneuver risks contact
    pub maybe_bump: bool,
    pub lead: Option<LeadVehicle>,
    /// A vehicle in an adjacent lane is cutting in next to the ego
    pub lane_changing_neighbor: bool,
}

pub struct SpeedRegulator {
    config: SpeedConfig,
}

impl SpeedRegulator {
    pub fn new(config: SpeedConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(SpeedConfig::default())
    }

    pub fn config(&self) -> &SpeedConfig {
        &self.config
    }

    pub fn assess(
        &self,
        vehicles: &[TrackedVehicle],
        ego: &EgoPosition,
        lane: Lane,
        behavior: BehaviorState,
    ) -> TrafficAssessment {
        let cfg = &self.config;
        let mut assessment = TrafficAssessment::default();

        for vehicle in vehicles {
            if lane.contains(vehicle.d) && vehicle.s > ego.s {
                let projected_s = vehicle.projected_s(ego.planned_time);
                let gap = projected_s - ego.planned_s;
                if gap < cfg.too_close_distance {
                    assessment.too_close_ahead = true;
                    if vehicle.s - ego.s < cfg.bump_distance {
                        assessment.maybe_bump = true;
                    }
                    let closer = assessment
                        .lead
                        .map_or(true, |lead| gap < lead.projected_s - ego.planned_s);
                    if closer {
                        assessment.lead = Some(LeadVehicle {
                            id: vehicle.id,
                            speed: vehicle.speed(),
                            s: vehicle.s,
                            projected_s,
                        });
                    }
                }
            }

            if behavior.is_keeping_lane()
                && !lane.contains(vehicle.d)
                && (vehicle.d - ego.d).abs() < cfg.neighbor_lateral
            {
                let ahead = vehicle.s >= ego.s && vehicle.s - ego.s < cfg.neighbor_ahead;
                let behind = vehicle.s < ego.s && ego.s - vehicle.s < cfg.neighbor_behind;
                if ahead || behind {
                    debug!("vehicle {} is changing into our lane", vehicle.id);
                    assessment.lane_changing_neighbor = true;
                }
            }
        }

        assessment
    }

    /// Next reference speed, at most one step away from `current`
    pub fn regulate(
        &self,
        current: Mph,
        assessment: &TrafficAssessment,
        ego: &EgoPosition,
        lane: Lane,
        goal_lane: Lane,
    ) -> Mph {
        let cfg = &self.config;
        let next = if assessment.lane_changing_neighbor {
            current - cfg.step
        } else if assessment.too_close_ahead && goal_lane == lane {
            let comfortable = assessment.lead.map_or(false, |lead| {
                lead.projected_s - ego.planned_s >= cfg.hold_projected_gap
                    && lead.s - ego.s > cfg.hold_current_gap
            });
            if comfortable {
                current
            } else {
                current - cfg.step
            }
        } else if current < cfg.max_speed {
            current + cfg.step
        } else {
            current
        };
        next.clamp(cfg.min_speed, cfg.max_speed)
    }
}
