//! Closed-loop highway simulation
//!
//! A straight three-lane road with constant-speed traffic. Each cycle the
//! ego consumes a few points of the last path it was sent, which is how the
//! real simulator behaves between telemetry messages, and the rest is handed
//! back to the planner as the previous path.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::Deserialize;

use crate::common::{Mph, Point2D, RoboticsError, RoboticsResult, TrackedVehicle};
use crate::io::Telemetry;
use crate::mapping::{Lane, WaypointMap};
use crate::mission_planning::{BehaviorController, BehaviorState, EgoPlanningState};
use crate::path_planning::{PlannedPath, SAMPLE_TIME};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// [m]
    pub road_length: f64,
    pub waypoint_spacing: f64,
    pub traffic_count: usize,
    /// Mean traffic speed [m/s]
    pub traffic_speed_mean: f64,
    pub traffic_speed_std: f64,
    /// Traffic is spread over this distance ahead of the ego [m]
    pub traffic_spread: f64,
    pub ego_start_s: f64,
    pub ego_start_lane: Lane,
    /// Path points driven between two planning cycles
    pub points_per_cycle: usize,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            road_length: 6000.0,
            waypoint_spacing: 30.0,
            traffic_count: 9,
            traffic_speed_mean: 18.0,
            traffic_speed_std: 2.0,
            traffic_spread: 400.0,
            ego_start_s: 100.0,
            ego_start_lane: Lane::Middle,
            points_per_cycle: 5,
            seed: 7,
        }
    }
}

/// Traffic vehicle driving at constant speed in its lane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimVehicle {
    pub id: i64,
    pub s: f64,
    pub d: f64,
    /// [m/s]
    pub speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SimEgo {
    position: Point2D,
    yaw: f64,
    speed: Mph,
    s: f64,
    d: f64,
}

/// Snapshot of one simulated cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimRecord {
    pub time: f64,
    pub position: Point2D,
    pub s: f64,
    pub d: f64,
    pub speed: Mph,
    pub reference_speed: Mph,
    pub behavior: BehaviorState,
    /// Distance to the closest traffic vehicle in the ego lane [m]
    pub closest_in_lane: Option<f64>,
}

pub struct HighwaySim {
    config: SimConfig,
    map: WaypointMap,
    traffic: Vec<SimVehicle>,
    ego: SimEgo,
    remaining: Vec<Point2D>,
    time: f64,
}

impl HighwaySim {
    pub fn new(config: SimConfig) -> RoboticsResult<Self> {
        let map = WaypointMap::straight(config.road_length, config.waypoint_spacing)?;
        let normal = Normal::new(config.traffic_speed_mean, config.traffic_speed_std)
            .map_err(|e| RoboticsError::InvalidParameter(format!("traffic speed distribution: {}", e)))?;
        let mut rng = StdRng::seed_from_u64(config.seed);

        let traffic = (0..config.traffic_count)
            .map(|i| {
                let lane = Lane::ALL[i % Lane::ALL.len()];
                let s = config.ego_start_s + 30.0 + rng.gen_range(0.0..config.traffic_spread.max(1.0));
                SimVehicle {
                    id: i as i64,
                    s,
                    d: lane.center_d(),
                    speed: normal.sample(&mut rng).max(0.0),
                }
            })
            .collect();

        let d = config.ego_start_lane.center_d();
        let position = map.to_global_frame(config.ego_start_s, d);
        let ego = SimEgo {
            position,
            yaw: 0.0,
            speed: Mph(0.0),
            s: config.ego_start_s,
            d,
        };

        Ok(Self {
            config,
            map,
            traffic,
            ego,
            remaining: Vec::new(),
            time: 0.0,
        })
    }

    pub fn with_defaults() -> RoboticsResult<Self> {
        Self::new(SimConfig::default())
    }

    /// Replace the random traffic
    pub fn with_traffic(mut self, traffic: Vec<SimVehicle>) -> Self {
        self.traffic = traffic;
        self
    }

    pub fn map(&self) -> &WaypointMap {
        &self.map
    }

    pub fn traffic(&self) -> &[SimVehicle] {
        &self.traffic
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn telemetry(&self) -> Telemetry {
        let (end_path_s, end_path_d) = match self.remaining.len() {
            0 => (0.0, 0.0),
            1 => {
                let p = self.remaining[0];
                let frenet = self.map.to_road_frame(p.x, p.y, self.ego.yaw);
                (frenet.s, frenet.d)
            }
            n => {
                let (p, q) = (self.remaining[n - 2], self.remaining[n - 1]);
                let frenet = self.map.to_road_frame(q.x, q.y, p.bearing_to(&q));
                (frenet.s, frenet.d)
            }
        };

        Telemetry {
            x: self.ego.position.x,
            y: self.ego.position.y,
            s: self.ego.s,
            d: self.ego.d,
            yaw: self.ego.yaw.to_degrees(),
            speed: self.ego.speed,
            previous_path_x: self.remaining.iter().map(|p| p.x).collect(),
            previous_path_y: self.remaining.iter().map(|p| p.y).collect(),
            end_path_s,
            end_path_d,
            sensor_fusion: self.traffic.iter().map(|v| self.tracked(v)).collect(),
        }
    }

    fn tracked(&self, vehicle: &SimVehicle) -> TrackedVehicle {
        let p = self.map.to_global_frame(vehicle.s, vehicle.d);
        let ahead = self.map.to_global_frame(vehicle.s + 1.0, vehicle.d);
        let heading = p.bearing_to(&ahead);
        TrackedVehicle::new(
            vehicle.id,
            p.x,
            p.y,
            vehicle.speed * heading.cos(),
            vehicle.speed * heading.sin(),
            vehicle.s,
            vehicle.d,
        )
    }

    /// Drive along `path` for one cycle and advance the traffic
    pub fn step(&mut self, path: &PlannedPath) {
        let points = path.points();
        let consumed = self.config.points_per_cycle.min(points.len());

        if consumed > 0 {
            let last = points[consumed - 1];
            let before = if consumed >= 2 {
                points[consumed - 2]
            } else {
                self.ego.position
            };
            let step = before.distance(&last);
            if step > f64::EPSILON {
                self.ego.yaw = before.bearing_to(&last);
            }
            self.ego.speed = Mph::from_mps(step / SAMPLE_TIME);
            self.ego.position = last;
            let frenet = self.map.to_road_frame(last.x, last.y, self.ego.yaw);
            self.ego.s = frenet.s;
            self.ego.d = frenet.d;
        }
        self.remaining = points[consumed..].to_vec();

        let dt = consumed.max(1) as f64 * SAMPLE_TIME;
        for vehicle in &mut self.traffic {
            vehicle.s += vehicle.speed * dt;
        }
        self.time += dt;
    }

    /// Distance from the ego to the nearest traffic vehicle in its lane
    pub fn closest_in_lane(&self) -> Option<f64> {
        let lane = Lane::from_d(self.ego.d)?;
        self.traffic
            .iter()
            .filter(|v| lane.contains(v.d))
            .map(|v| (v.s - self.ego.s).abs())
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Run `cycles` planning cycles starting from `state`
    pub fn run(
        &mut self,
        controller: &BehaviorController,
        mut state: EgoPlanningState,
        cycles: usize,
    ) -> RoboticsResult<(Vec<SimRecord>, EgoPlanningState)> {
        let mut records = Vec::with_capacity(cycles);
        for _ in 0..cycles {
            let telemetry = self.telemetry();
            let (path, next) = controller.plan(&state, &telemetry, &self.map)?;
            state = next;
            self.step(&path);

            let record = SimRecord {
                time: self.time,
                position: self.ego.position,
                s: self.ego.s,
                d: self.ego.d,
                speed: self.ego.speed,
                reference_speed: state.reference_speed,
                behavior: state.behavior,
                closest_in_lane: self.closest_in_lane(),
            };
            debug!("t = {:.2}: {:?}", record.time, record);
            records.push(record);
        }
        Ok((records, state))
    }
}
