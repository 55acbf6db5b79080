//! Cost evaluation for candidate lane-change trajectories
//!
//! Terms are evaluated in priority order and the first hard violation ends
//! the evaluation:
//!
//! 1. collision with a vehicle in the target lane (the soft buffer term
//!    accumulated up to that point is kept)
//! 2. baffled: the target lane is no faster around the vehicle we are stuck behind
//! 3. road limit: the trajectory leaves the drivable lanes
//! 4. comfort and efficiency (speed, acceleration and jerk limits, mean speed)
//!
//! Terms after a hard violation are zero, not computed-and-ignored, so two
//! unsafe candidates are ranked only by the terms reached before they stopped.

use log::debug;
use serde::Deserialize;

use crate::common::{Mph, TrackedVehicle};
use crate::mapping::Lane;
use crate::path_planning::kinematics::KinematicProfile;
use crate::path_planning::trajectory::{Trajectory, SAMPLE_TIME};

/// Costs at or above this value contain a hard violation
pub const HARD_VIOLATION: f64 = 10.0;

/// Maps `[0, inf)` onto `[0, 1)`
pub fn logistic(x: f64) -> f64 {
    2.0 / (1.0 + (-x).exp()) - 1.0
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    pub collision_weight: f64,
    /// Ego ahead of a vehicle by less than this collides [m]
    pub lead_gap: f64,
    /// Ego behind a vehicle by less than this collides [m]
    pub trail_gap: f64,
    /// Minimum separation at the end of the trajectory [m]
    pub terminal_gap: f64,
    /// Ego has left its lane once within this distance of the lane boundary [m]
    pub boundary_tolerance: f64,
    /// Vehicles laterally closer than this contribute to the buffer term [m]
    pub buffer_lateral: f64,
    pub baffled_weight: f64,
    /// Window ahead of a target-lane vehicle in which the blocker counts as beside it [m]
    pub baffled_ahead_window: f64,
    /// Window behind a target-lane vehicle in which the blocker counts as beside it [m]
    pub baffled_behind_window: f64,
    /// Target-lane traffic must be this much faster than the blocker
    pub baffled_speed_ratio: f64,
    pub road_limit_weight: f64,
    pub speed_limit: Mph,
    pub speed_limit_weight: f64,
    /// [m/s^2]
    pub accel_limit: f64,
    pub accel_limit_weight: f64,
    /// [m/s^3]
    pub jerk_limit: f64,
    pub jerk_limit_weight: f64,
    pub cruise_speed: Mph,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            collision_weight: 10.0,
            lead_gap: 10.0,
            trail_gap: 20.0,
            terminal_gap: 15.0,
            boundary_tolerance: 0.5,
            buffer_lateral: 6.0,
            baffled_weight: 10.0,
            baffled_ahead_window: 20.0,
            baffled_behind_window: 10.0,
            baffled_speed_ratio: 1.15,
            road_limit_weight: 10.0,
            speed_limit: Mph(49.5),
            speed_limit_weight: 10.0,
            accel_limit: 10.0,
            accel_limit_weight: 1.0,
            jerk_limit: 50.0,
            jerk_limit_weight: 1.0,
            cruise_speed: Mph(49.5),
        }
    }
}

/// The vehicle the ego is currently stuck behind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blocker {
    /// [m/s]
    pub speed: f64,
    /// Current longitudinal position [m]
    pub s: f64,
}

/// Result of a cost evaluation, tagged by the term that ended it
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CostOutcome {
    Collision {
        collision: f64,
        buffer: f64,
    },
    Baffled {
        baffled: f64,
        buffer: f64,
    },
    RoadLimit {
        road_limit: f64,
        buffer: f64,
    },
    Scored {
        buffer: f64,
        speed_limit: f64,
        accel_limit: f64,
        jerk_limit: f64,
        efficiency: f64,
    },
}

impl CostOutcome {
    pub fn total(&self) -> f64 {
        match *self {
            CostOutcome::Collision { collision, buffer } => collision + buffer,
            CostOutcome::Baffled { baffled, buffer } => baffled + buffer,
            CostOutcome::RoadLimit { road_limit, buffer } => road_limit + buffer,
            CostOutcome::Scored {
                buffer,
                speed_limit,
                accel_limit,
                jerk_limit,
                efficiency,
            } => buffer + speed_limit + accel_limit + jerk_limit + efficiency,
        }
    }

    pub fn is_hard_violation(&self) -> bool {
        self.total() >= HARD_VIOLATION
    }
}

pub struct CostEvaluator {
    config: CostConfig,
}

impl CostEvaluator {
    pub fn new(config: CostConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(CostConfig::default())
    }

    /// Score a candidate trajectory towards `target_lane`.
    ///
    /// An empty `profile` (too few samples to differentiate) skips every
    /// per-sample check and contributes nothing to the comfort terms.
    pub fn evaluate(
        &self,
        trajectory: &Trajectory,
        profile: &KinematicProfile,
        vehicles: &[TrackedVehicle],
        current_lane: Lane,
        target_lane: Lane,
        blocker: Blocker,
    ) -> CostOutcome {
        let outcome = self.evaluate_terms(trajectory, profile, vehicles, current_lane, target_lane, blocker);
        debug!("lane {} cost {:.4}: {:?}", target_lane, outcome.total(), outcome);
        outcome
    }

    fn evaluate_terms(
        &self,
        trajectory: &Trajectory,
        profile: &KinematicProfile,
        vehicles: &[TrackedVehicle],
        current_lane: Lane,
        target_lane: Lane,
        blocker: Blocker,
    ) -> CostOutcome {
        let cfg = &self.config;
        let s = &profile.s;
        let d = &profile.d;

        // lateral line separating the current and target lanes
        let boundary = if target_lane < current_lane {
            current_lane.left_boundary_d()
        } else {
            target_lane.left_boundary_d()
        };
        let timesteps = d
            .iter()
            .position(|&di| (di - boundary).abs() < cfg.boundary_tolerance)
            .unwrap_or(trajectory.len())
            .min(s.len());

        let horizon_time = trajectory.len() as f64 * SAMPLE_TIME;
        let mut buffer = 0.0;
        let mut closest_ahead = f64::INFINITY;
        let mut ahead: Vec<(f64, f64)> = Vec::new();

        for vehicle in vehicles.iter().filter(|v| target_lane.contains(v.d)) {
            let speed = vehicle.speed();

            let collides = (0..timesteps).any(|i| {
                let vehicle_s = vehicle.projected_s(i as f64 * SAMPLE_TIME);
                (s[i] > vehicle_s && s[i] - vehicle_s < cfg.lead_gap)
                    || (s[i] < vehicle_s && vehicle_s - s[i] < cfg.trail_gap)
            });
            if collides {
                return CostOutcome::Collision {
                    collision: cfg.collision_weight,
                    buffer,
                };
            }

            if let (Some(&end_s), Some(&start_d)) = (s.last(), d.first()) {
                let vehicle_end_s = vehicle.projected_s(horizon_time);
                if (end_s - vehicle_end_s).abs() < cfg.terminal_gap {
                    return CostOutcome::Collision {
                        collision: cfg.collision_weight,
                        buffer,
                    };
                }
                if (vehicle.d - start_d).abs() < cfg.buffer_lateral {
                    buffer += 1.0 - logistic((vehicle_end_s - end_s).abs());
                }
            }

            // successively closer vehicles ahead of the ego
            if let Some(&start_s) = s.first() {
                if vehicle.s > start_s && vehicle.s - start_s < closest_ahead {
                    closest_ahead = vehicle.s - start_s;
                    ahead.push((vehicle.s, speed));
                }
            }
        }

        let baffled = ahead.iter().any(|&(ahead_s, ahead_speed)| {
            let beside = (blocker.s > ahead_s && blocker.s - ahead_s < cfg.baffled_ahead_window)
                || (blocker.s < ahead_s && ahead_s - blocker.s < cfg.baffled_behind_window);
            beside && ahead_speed < cfg.baffled_speed_ratio * blocker.speed
        });
        if baffled {
            return CostOutcome::Baffled {
                baffled: cfg.baffled_weight,
                buffer,
            };
        }

        if d.iter().any(|&di| Lane::from_d(di).is_none()) {
            return CostOutcome::RoadLimit {
                road_limit: cfg.road_limit_weight,
                buffer,
            };
        }

        let penalty = |value: Option<f64>, limit: f64, weight: f64| match value {
            Some(v) if v > limit => weight,
            _ => 0.0,
        };
        let speed_limit = penalty(
            profile.max_speed().map(|v| Mph::from_mps(v).value()),
            cfg.speed_limit.value(),
            cfg.speed_limit_weight,
        );
        let accel_limit = penalty(profile.max_accel(), cfg.accel_limit, cfg.accel_limit_weight);
        let jerk_limit = penalty(profile.max_jerk(), cfg.jerk_limit, cfg.jerk_limit_weight);
        let efficiency = profile.mean_speed().map_or(0.0, |mean| {
            logistic((cfg.cruise_speed.value() - Mph::from_mps(mean).value()).abs() / 50.0)
        });

        CostOutcome::Scored {
            buffer,
            speed_limit,
            accel_limit,
            jerk_limit,
            efficiency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Point2D;
    use crate::mapping::WaypointMap;

    fn road() -> WaypointMap {
        WaypointMap::straight(2000.0, 30.0).unwrap()
    }

    /// Straight trajectory at lateral offset `d`, 0.4 m per sample (20 m/s)
    fn straight_at(d: f64) -> Trajectory {
        let points = (0..75).map(|i| Point2D::new(100.0 + 0.4 * i as f64, -d)).collect();
        Trajectory::from_points(points).unwrap()
    }

    fn vehicle(id: i64, s: f64, d: f64, speed: f64) -> TrackedVehicle {
        TrackedVehicle::new(id, s, -d, speed, 0.0, s, d)
    }

    fn blocker() -> Blocker {
        Blocker { speed: 10.0, s: 130.0 }
    }

    #[test]
    fn test_logistic() {
        assert_eq!(logistic(0.0), 0.0);
        assert!(logistic(1.0) > 0.46 && logistic(1.0) < 0.47);
        assert!((logistic(100.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_collision_short_circuits_road_limit() {
        let road = road();
        let evaluator = CostEvaluator::with_defaults();
        // off-road on the left, and a vehicle right ahead in the target lane
        let traj = straight_at(-1.0);
        let profile = KinematicProfile::from_trajectory(&traj, &road);
        let vehicles = vec![vehicle(1, 400.0, 2.0, 20.0), vehicle(2, 105.0, 2.0, 20.0)];

        let outcome = evaluator.evaluate(&traj, &profile, &vehicles, Lane::Middle, Lane::Left, blocker());

        match outcome {
            CostOutcome::Collision { collision, buffer } => {
                assert_eq!(collision, 10.0);
                let expected = 1.0 - logistic((400.0 + 1.5 * 20.0 - profile.end_s().unwrap()).abs());
                assert!((buffer - expected).abs() < 1e-12);
                assert_eq!(outcome.total(), collision + buffer);
            }
            other => panic!("expected collision, got {:?}", other),
        }
        assert!(outcome.total() < 10.0 + 1e-6);
    }

    #[test]
    fn test_road_limit_without_traffic() {
        let road = road();
        let evaluator = CostEvaluator::with_defaults();
        let traj = straight_at(-1.0);
        let profile = KinematicProfile::from_trajectory(&traj, &road);

        let outcome = evaluator.evaluate(&traj, &profile, &[], Lane::Middle, Lane::Left, blocker());
        assert_eq!(
            outcome,
            CostOutcome::RoadLimit {
                road_limit: 10.0,
                buffer: 0.0
            }
        );
        assert!(outcome.is_hard_violation());
    }

    #[test]
    fn test_terminal_collision() {
        let road = road();
        let evaluator = CostEvaluator::with_defaults();
        let traj = straight_at(2.0);
        let profile = KinematicProfile::from_trajectory(&traj, &road);
        // at least 10 m behind at every sample, 11.6 m behind at the horizon
        let vehicles = vec![vehicle(1, 40.0, 2.0, 52.0)];

        let outcome = evaluator.evaluate(&traj, &profile, &vehicles, Lane::Middle, Lane::Left, blocker());
        assert!(matches!(outcome, CostOutcome::Collision { .. }));
    }

    #[test]
    fn test_collision_only_checked_until_lane_boundary() {
        let road = road();
        let evaluator = CostEvaluator::with_defaults();
        // sits on the boundary from the first sample, so no per-sample checks run
        let traj = straight_at(4.2);
        let profile = KinematicProfile::from_trajectory(&traj, &road);
        // the ego leads by only 5.4 m at the first sample
        let vehicles = vec![vehicle(1, 95.0, 2.0, 10.0)];

        let outcome = evaluator.evaluate(&traj, &profile, &vehicles, Lane::Middle, Lane::Left, blocker());
        assert!(!matches!(outcome, CostOutcome::Collision { .. }), "{:?}", outcome);
    }

    #[test]
    fn test_baffled_when_target_lane_is_no_faster() {
        let road = road();
        let evaluator = CostEvaluator::with_defaults();
        let traj = straight_at(6.0);
        let profile = KinematicProfile::from_trajectory(&traj, &road);
        let blocker = Blocker { speed: 10.0, s: 200.0 };

        let slow = vec![vehicle(1, 195.0, 2.0, 10.5)];
        let outcome = evaluator.evaluate(&traj, &profile, &slow, Lane::Middle, Lane::Left, blocker);
        assert!(matches!(outcome, CostOutcome::Baffled { baffled, .. } if baffled == 10.0));

        let fast = vec![vehicle(1, 195.0, 2.0, 12.0)];
        let outcome = evaluator.evaluate(&traj, &profile, &fast, Lane::Middle, Lane::Left, blocker);
        assert!(matches!(outcome, CostOutcome::Scored { .. }));
    }

    #[test]
    fn test_clean_trajectory_is_cheap() {
        let road = road();
        let evaluator = CostEvaluator::with_defaults();
        let traj = straight_at(6.0);
        let profile = KinematicProfile::from_trajectory(&traj, &road);

        let outcome = evaluator.evaluate(&traj, &profile, &[], Lane::Middle, Lane::Left, blocker());
        match outcome {
            CostOutcome::Scored {
                speed_limit,
                accel_limit,
                jerk_limit,
                efficiency,
                ..
            } => {
                assert_eq!(speed_limit, 0.0);
                assert_eq!(accel_limit, 0.0);
                assert_eq!(jerk_limit, 0.0);
                // 20 m/s is 44.8 mph
                let expected = logistic((49.5 - 44.8_f64).abs() / 50.0);
                assert!((efficiency - expected).abs() < 1e-6);
            }
            other => panic!("expected a scored outcome, got {:?}", other),
        }
        assert!(outcome.total() < 1.0);
    }

    #[test]
    fn test_speeding_is_penalised() {
        let road = road();
        let evaluator = CostEvaluator::with_defaults();
        // 0.5 m per sample is 25 m/s, 56 mph
        let points = (0..75).map(|i| Point2D::new(100.0 + 0.5 * i as f64, -6.0)).collect();
        let traj = Trajectory::from_points(points).unwrap();
        let profile = KinematicProfile::from_trajectory(&traj, &road);

        let outcome = evaluator.evaluate(&traj, &profile, &[], Lane::Middle, Lane::Left, blocker());
        assert!(matches!(outcome, CostOutcome::Scored { speed_limit, .. } if speed_limit == 10.0));
        assert!(outcome.is_hard_violation());
    }

    #[test]
    fn test_empty_profile_contributes_nothing() {
        let evaluator = CostEvaluator::with_defaults();
        let traj = straight_at(6.0);
        let vehicles = vec![vehicle(1, 110.0, 2.0, 20.0)];

        let outcome = evaluator.evaluate(
            &traj,
            &KinematicProfile::empty(),
            &vehicles,
            Lane::Middle,
            Lane::Left,
            blocker(),
        );
        assert_eq!(outcome.total(), 0.0);
    }
}
