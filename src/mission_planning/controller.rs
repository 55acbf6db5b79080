//! Per-cycle behavior controller
//!
//! `plan` is the whole planner as seen from the transport: it takes the
//! state left by the previous cycle and a telemetry snapshot, and returns the
//! next 50 path points together with the state for the next cycle.

use log::{debug, info, warn};
use serde::Deserialize;

use crate::common::{FrenetPoint, Mph, Point2D, Pose2D, RoadFrame, RoboticsResult};
use crate::io::{PlannerConfig, Telemetry};
use crate::mapping::Lane;
use crate::mission_planning::behavior::{BehaviorEvent, EgoPlanningState};
use crate::mission_planning::speed_regulator::{EgoPosition, LeadVehicle, SpeedRegulator, TrafficAssessment};
use crate::path_planning::{
    Anchor, AnchorSelector, CostEvaluator, CostOutcome, KinematicProfile, PlannedPath, Trajectory,
    TrajectorySynthesizer, SAMPLE_TIME,
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Lane changes are only considered below this ego speed
    pub lane_change_speed: Mph,
    /// ... and when the lead vehicle is slower than this
    pub slow_lead_speed: Mph,
    /// A lane change is complete within this distance of the goal lane center [m]
    pub completion_lateral: f64,
    /// ... and after this much progress past the committed position [m]
    pub completion_progress: f64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            lane_change_speed: Mph(45.0),
            slow_lead_speed: Mph(45.0),
            completion_lateral: 1.0,
            completion_progress: 30.0,
        }
    }
}

/// Winning lane-change candidate of a cycle
#[derive(Debug, Clone)]
struct Candidate {
    anchor: Anchor,
    trajectory: Trajectory,
    outcome: CostOutcome,
}

pub struct BehaviorController {
    config: BehaviorConfig,
    synthesizer: TrajectorySynthesizer,
    selector: AnchorSelector,
    evaluator: CostEvaluator,
    regulator: SpeedRegulator,
}

impl BehaviorController {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config: config.behavior,
            synthesizer: TrajectorySynthesizer::new(config.synthesis),
            selector: AnchorSelector::new(config.anchors),
            evaluator: CostEvaluator::new(config.cost),
            regulator: SpeedRegulator::new(config.speed),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(PlannerConfig::default())
    }

    /// Run one planning cycle.
    ///
    /// The returned path always has 50 points. Errors are limited to state
    /// transitions the behavior table does not allow, which only happens when
    /// `state` was not produced by a previous call.
    pub fn plan<R: RoadFrame + ?Sized>(
        &self,
        state: &EgoPlanningState,
        telemetry: &Telemetry,
        road: &R,
    ) -> RoboticsResult<(PlannedPath, EgoPlanningState)> {
        let previous = telemetry.previous_path();
        let pose = telemetry.pose();
        let vehicles = &telemetry.sensor_fusion;

        let planned = if previous.is_empty() {
            FrenetPoint::new(telemetry.s, telemetry.d)
        } else {
            FrenetPoint::new(telemetry.end_path_s, telemetry.end_path_d)
        };
        let lane = Lane::from_d(telemetry.d).unwrap_or(state.goal_lane);
        let ego = EgoPosition {
            s: telemetry.s,
            d: telemetry.d,
            planned_s: planned.s,
            planned_time: previous.len() as f64 * SAMPLE_TIME,
        };

        let assessment = self.regulator.assess(vehicles, &ego, lane, state.behavior);
        let reference_speed =
            self.regulator
                .regulate(state.reference_speed, &assessment, &ego, lane, state.goal_lane);

        let mut next = EgoPlanningState {
            reference_speed,
            ..*state
        };

        let trajectory = if state.behavior.is_lane_change() {
            let settled = (state.goal_lane.center_d() - planned.d).abs() < self.config.completion_lateral
                && telemetry.s - state.goal_s > self.config.completion_progress;
            if settled {
                next.behavior = state.behavior.transition(BehaviorEvent::Complete)?;
                info!("{} completed in lane {}", state.behavior, state.goal_lane);
            } else {
                next.behavior = state.behavior.transition(BehaviorEvent::Continue)?;
            }
            self.synthesize_or_hold(planned, &previous, &pose, reference_speed, state.goal_lane, road)?
        } else {
            let chosen = self.slow_lead(telemetry, &assessment).and_then(|lead| {
                self.best_lane_change(planned.s, telemetry, &previous, &pose, reference_speed, lane, &lead, road)
            });

            match chosen {
                Some(candidate) if !candidate.outcome.is_hard_violation() => {
                    let target = candidate.anchor.lane;
                    let event = if target < lane {
                        BehaviorEvent::PrepareLeft
                    } else {
                        BehaviorEvent::PrepareRight
                    };
                    let prepared = state.behavior.transition(event)?;
                    debug!("{} towards lane {}", prepared, target);
                    next.behavior = prepared.transition(BehaviorEvent::Commit)?;
                    next.goal_lane = target;
                    next.goal_s = candidate.anchor.s;
                    info!(
                        "{} started from lane {} to lane {} at s = {:.1} (cost {:.3})",
                        next.behavior,
                        lane,
                        target,
                        candidate.anchor.s,
                        candidate.outcome.total()
                    );
                    candidate.trajectory
                }
                other => {
                    if let Some(candidate) = other {
                        debug!(
                            "no safe lane change, best was lane {} at {:.3}",
                            candidate.anchor.lane,
                            candidate.outcome.total()
                        );
                    }
                    next.behavior = state.behavior.transition(BehaviorEvent::KeepLane)?;
                    self.synthesize_or_hold(planned, &previous, &pose, reference_speed, state.goal_lane, road)?
                }
            }
        };

        if next.behavior != state.behavior {
            info!("{} -> {} (lane {} to {})", state.behavior, next.behavior, lane, next.goal_lane);
        }

        Ok((trajectory.to_planned_path(), next))
    }

    /// The lead vehicle, if it is slow enough to be worth passing
    fn slow_lead(&self, telemetry: &Telemetry, assessment: &TrafficAssessment) -> Option<LeadVehicle> {
        if telemetry.speed >= self.config.lane_change_speed
            || !assessment.too_close_ahead
            || assessment.maybe_bump
        {
            return None;
        }
        assessment
            .lead
            .filter(|lead| lead.speed < self.config.slow_lead_speed.to_mps())
    }

    /// Cheapest candidate over every anchor in the adjacent lanes
    #[allow(clippy::too_many_arguments)]
    fn best_lane_change<R: RoadFrame + ?Sized>(
        &self,
        start_s: f64,
        telemetry: &Telemetry,
        previous: &[Point2D],
        pose: &Pose2D,
        reference_speed: Mph,
        lane: Lane,
        lead: &LeadVehicle,
        road: &R,
    ) -> Option<Candidate> {
        let vehicles = &telemetry.sensor_fusion;
        let anchors = self
            .selector
            .select(start_s, telemetry.s, telemetry.speed.to_mps(), lane, vehicles);
        debug!("evaluating {} anchors behind vehicle {}", anchors.len(), lead.id);

        let mut best: Option<Candidate> = None;
        for anchor in anchors {
            let trajectory = match self.synthesizer.synthesize(
                anchor.frenet(),
                previous,
                pose,
                reference_speed,
                anchor.lane,
                road,
            ) {
                Ok(trajectory) => trajectory,
                Err(e) => {
                    debug!("skipping anchor at s = {:.1} in lane {}: {}", anchor.s, anchor.lane, e);
                    continue;
                }
            };
            let profile = KinematicProfile::from_trajectory(&trajectory, road);
            let outcome = self
                .evaluator
                .evaluate(&trajectory, &profile, vehicles, lane, anchor.lane, lead.as_blocker());

            let cheaper = best
                .as_ref()
                .map_or(true, |b| outcome.total() < b.outcome.total());
            if cheaper {
                best = Some(Candidate {
                    anchor,
                    trajectory,
                    outcome,
                });
            }
        }
        best
    }

    /// Keep-lane style synthesis that never fails to produce a trajectory
    fn synthesize_or_hold<R: RoadFrame + ?Sized>(
        &self,
        target: FrenetPoint,
        previous: &[Point2D],
        pose: &Pose2D,
        reference_speed: Mph,
        lane: Lane,
        road: &R,
    ) -> RoboticsResult<Trajectory> {
        match self
            .synthesizer
            .synthesize(target, previous, pose, reference_speed, lane, road)
        {
            Ok(trajectory) => Ok(trajectory),
            Err(e) => {
                warn!("trajectory synthesis failed, holding previous path: {}", e);
                let held = if previous.is_empty() {
                    vec![pose.position()]
                } else {
                    previous.to_vec()
                };
                Trajectory::from_points(held)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TrackedVehicle;
    use crate::mapping::WaypointMap;
    use crate::mission_planning::BehaviorState;
    use crate::path_planning::OUTPUT_LENGTH;

    fn road() -> WaypointMap {
        WaypointMap::straight(3000.0, 30.0).unwrap()
    }

    fn telemetry(s: f64, d: f64, speed: f64, vehicles: Vec<TrackedVehicle>) -> Telemetry {
        Telemetry {
            x: s,
            y: -d,
            s,
            d,
            yaw: 0.0,
            speed: Mph(speed),
            previous_path_x: Vec::new(),
            previous_path_y: Vec::new(),
            end_path_s: 0.0,
            end_path_d: 0.0,
            sensor_fusion: vehicles,
        }
    }

    fn vehicle(id: i64, s: f64, d: f64, speed: f64) -> TrackedVehicle {
        TrackedVehicle::new(id, s, -d, speed, 0.0, s, d)
    }

    #[test]
    fn test_first_cycle_keeps_lane() {
        let controller = BehaviorController::with_defaults();
        let state = EgoPlanningState::default();
        let (path, next) = controller
            .plan(&state, &telemetry(100.0, 6.0, 0.0, Vec::new()), &road())
            .unwrap();

        assert_eq!(path.len(), OUTPUT_LENGTH);
        assert_eq!(next.behavior, BehaviorState::KeepLane);
        assert_eq!(next.goal_lane, Lane::Middle);
        assert_eq!(next.reference_speed, Mph(2.25));
        assert!(path.next_y.iter().all(|y| (y + 6.0).abs() < 1e-6));
        assert!(path.next_x.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_fast_lead_does_not_trigger_lane_change() {
        let controller = BehaviorController::with_defaults();
        let state = EgoPlanningState {
            behavior: BehaviorState::KeepLane,
            reference_speed: Mph(40.0),
            ..EgoPlanningState::default()
        };
        let vehicles = vec![vehicle(1, 130.0, 6.0, 21.0)];
        let (_, next) = controller
            .plan(&state, &telemetry(100.0, 6.0, 40.0, vehicles), &road())
            .unwrap();
        assert_eq!(next.behavior, BehaviorState::KeepLane);
    }

    #[test]
    fn test_blocked_neighbors_keep_lane() {
        let controller = BehaviorController::with_defaults();
        let state = EgoPlanningState {
            behavior: BehaviorState::KeepLane,
            reference_speed: Mph(40.0),
            ..EgoPlanningState::default()
        };
        let vehicles = vec![
            vehicle(1, 130.0, 6.0, 30.0 / 2.24),
            vehicle(2, 115.0, 2.0, 30.0 / 2.24),
            vehicle(3, 115.0, 10.0, 30.0 / 2.24),
        ];
        let (path, next) = controller
            .plan(&state, &telemetry(100.0, 6.0, 40.0, vehicles), &road())
            .unwrap();
        assert_eq!(next.behavior, BehaviorState::KeepLane);
        assert_eq!(next.goal_lane, Lane::Middle);
        assert_eq!(path.len(), OUTPUT_LENGTH);
    }

    #[test]
    fn test_unsafe_candidates_keep_lane() {
        let controller = BehaviorController::with_defaults();
        let state = EgoPlanningState {
            behavior: BehaviorState::KeepLane,
            goal_lane: Lane::Middle,
            goal_s: 42.0,
            reference_speed: Mph(40.0),
        };
        // neighbors are clear enough to anchor in, but no faster than the lead
        let vehicles = vec![
            vehicle(1, 130.0, 6.0, 30.0 / 2.24),
            vehicle(2, 135.0, 2.0, 30.0 / 2.24),
            vehicle(3, 135.0, 10.0, 30.0 / 2.24),
        ];
        let telemetry = telemetry(100.0, 6.0, 40.0, vehicles);

        let anchors = AnchorSelector::with_defaults().select(
            100.0,
            100.0,
            Mph(40.0).to_mps(),
            Lane::Middle,
            &telemetry.sensor_fusion,
        );
        assert!(anchors.iter().any(|a| a.lane == Lane::Left));
        assert!(anchors.iter().any(|a| a.lane == Lane::Right));

        let (path, next) = controller.plan(&state, &telemetry, &road()).unwrap();
        assert_eq!(next.behavior, BehaviorState::KeepLane);
        assert_eq!(next.goal_lane, Lane::Middle);
        assert_eq!(next.goal_s, 42.0);
        assert_eq!(path.len(), OUTPUT_LENGTH);
        assert!(path.next_y.iter().all(|y| (y + 6.0).abs() < 1e-6));
    }

    #[test]
    fn test_lane_change_in_progress_continues() {
        let controller = BehaviorController::with_defaults();
        let state = EgoPlanningState {
            behavior: BehaviorState::LaneChangeLeft,
            goal_lane: Lane::Left,
            goal_s: 100.0,
            reference_speed: Mph(40.0),
        };
        // still between lanes
        let (_, next) = controller
            .plan(&state, &telemetry(110.0, 4.5, 40.0, Vec::new()), &road())
            .unwrap();
        assert_eq!(next.behavior, BehaviorState::LaneChangeLeft);
        assert_eq!(next.goal_lane, Lane::Left);
        assert_eq!(next.goal_s, 100.0);
    }

    #[test]
    fn test_lane_change_completes() {
        let controller = BehaviorController::with_defaults();
        let state = EgoPlanningState {
            behavior: BehaviorState::LaneChangeRight,
            goal_lane: Lane::Right,
            goal_s: 100.0,
            reference_speed: Mph(40.0),
        };
        let (_, next) = controller
            .plan(&state, &telemetry(140.0, 9.8, 40.0, Vec::new()), &road())
            .unwrap();
        assert_eq!(next.behavior, BehaviorState::KeepLane);
        assert_eq!(next.goal_lane, Lane::Right);
    }

    #[test]
    fn test_transient_state_is_rejected() {
        let controller = BehaviorController::with_defaults();
        let state = EgoPlanningState {
            behavior: BehaviorState::PrepareLaneChangeLeft,
            ..EgoPlanningState::default()
        };
        assert!(controller
            .plan(&state, &telemetry(100.0, 6.0, 10.0, Vec::new()), &road())
            .is_err());
    }
}
