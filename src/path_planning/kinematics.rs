//! Kinematic profile of a candidate trajectory
//!
//! Road-frame position, speed, acceleration and jerk are recovered from the
//! raw `(x, y)` samples by finite differences at the fixed sample interval.
//! Each differencing stage consumes one sample: `n` points give `n - 1`
//! positions and speeds, `n - 2` accelerations and `n - 3` jerks.

use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::common::{Point2D, RoadFrame};
use crate::path_planning::trajectory::{Trajectory, SAMPLE_TIME};

/// Below this many points no dynamics are measured
pub const MIN_PROFILE_POINTS: usize = 6;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KinematicProfile {
    /// Longitudinal position of points `1..n` [m]
    pub s: Vec<f64>,
    /// Lateral position of points `1..n` [m]
    pub d: Vec<f64>,
    /// Speed magnitude [m/s]
    pub speed: Vec<f64>,
    /// Acceleration magnitude [m/s^2]
    pub accel: Vec<f64>,
    /// Jerk magnitude [m/s^3]
    pub jerk: Vec<f64>,
}

impl KinematicProfile {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_trajectory<R: RoadFrame + ?Sized>(trajectory: &Trajectory, road: &R) -> Self {
        Self::from_points(trajectory.points(), SAMPLE_TIME, road)
    }

    /// Profile of `points` sampled every `dt` seconds.
    ///
    /// Returns an empty profile for fewer than [`MIN_PROFILE_POINTS`] points;
    /// callers treat that as "no measurable dynamics", not as zero.
    pub fn from_points<R: RoadFrame + ?Sized>(points: &[Point2D], dt: f64, road: &R) -> Self {
        if points.len() < MIN_PROFILE_POINTS {
            return Self::empty();
        }

        let mut s = Vec::with_capacity(points.len() - 1);
        let mut d = Vec::with_capacity(points.len() - 1);
        let mut velocity = Vec::with_capacity(points.len() - 1);
        for (p0, p1) in points.iter().tuple_windows() {
            let heading = p0.bearing_to(p1);
            let frenet = road.to_road_frame(p1.x, p1.y, heading);
            s.push(frenet.s);
            d.push(frenet.d);
            velocity.push(((p1.x - p0.x) / dt, (p1.y - p0.y) / dt));
        }

        let accel_xy = differentiate(&velocity, dt);
        let jerk_xy = differentiate(&accel_xy, dt);

        Self {
            s,
            d,
            speed: magnitudes(&velocity),
            accel: magnitudes(&accel_xy),
            jerk: magnitudes(&jerk_xy),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.s.is_empty()
    }

    pub fn start_s(&self) -> Option<f64> {
        self.s.first().copied()
    }

    pub fn start_d(&self) -> Option<f64> {
        self.d.first().copied()
    }

    pub fn end_s(&self) -> Option<f64> {
        self.s.last().copied()
    }

    pub fn max_speed(&self) -> Option<f64> {
        max_of(&self.speed)
    }

    pub fn mean_speed(&self) -> Option<f64> {
        if self.speed.is_empty() {
            None
        } else {
            Some(self.speed.iter().sum::<f64>() / self.speed.len() as f64)
        }
    }

    pub fn max_accel(&self) -> Option<f64> {
        max_of(&self.accel)
    }

    pub fn max_jerk(&self) -> Option<f64> {
        max_of(&self.jerk)
    }
}

fn differentiate(series: &[(f64, f64)], dt: f64) -> Vec<(f64, f64)> {
    series
        .iter()
        .tuple_windows()
        .map(|(a, b)| ((b.0 - a.0) / dt, (b.1 - a.1) / dt))
        .collect()
}

fn magnitudes(series: &[(f64, f64)]) -> Vec<f64> {
    series.iter().map(|(x, y)| x.hypot(*y)).collect()
}

fn max_of(values: &[f64]) -> Option<f64> {
    values.iter().copied().map(OrderedFloat).max().map(|v| v.0)
}
