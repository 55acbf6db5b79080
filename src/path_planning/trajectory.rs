//! Fixed-horizon trajectory container
//!
//! A [`Trajectory`] always holds exactly [`HORIZON`] global-frame points,
//! one every [`SAMPLE_TIME`] seconds. Only the first [`OUTPUT_LENGTH`] are
//! sent to the vehicle; the rest give the cost evaluator a longer look ahead.

use serde::{Deserialize, Serialize};

use crate::common::{Point2D, RoboticsError, RoboticsResult};

/// Time between consecutive trajectory points [s]
pub const SAMPLE_TIME: f64 = 0.02;
/// Number of points in a planned trajectory
pub const HORIZON: usize = 75;
/// Number of points handed to the vehicle each cycle
pub const OUTPUT_LENGTH: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    points: Vec<Point2D>,
}

impl Trajectory {
    /// Build a trajectory from `points`.
    ///
    /// Longer inputs are truncated to the horizon. Shorter inputs are padded by
    /// repeating the last point, which commands a stop; the synthesizer never
    /// relies on this, it only keeps degraded fallbacks well-formed.
    pub fn from_points(mut points: Vec<Point2D>) -> RoboticsResult<Self> {
        let last = *points.last().ok_or_else(|| {
            RoboticsError::PlanningError("cannot build a trajectory from no points".to_string())
        })?;
        points.truncate(HORIZON);
        points.resize(HORIZON, last);
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Point2D {
        self.points[self.points.len() - 1]
    }

    pub fn x_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn y_coords(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    /// The part of the trajectory sent to the vehicle
    pub fn to_planned_path(&self) -> PlannedPath {
        let head = &self.points[..OUTPUT_LENGTH.min(self.points.len())];
        PlannedPath {
            next_x: head.iter().map(|p| p.x).collect(),
            next_y: head.iter().map(|p| p.y).collect(),
        }
    }
}

/// Outbound path: global-frame points 20 ms apart
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlannedPath {
    pub next_x: Vec<f64>,
    pub next_y: Vec<f64>,
}

impl PlannedPath {
    pub fn len(&self) -> usize {
        self.next_x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.next_x.is_empty()
    }

    pub fn points(&self) -> Vec<Point2D> {
        self.next_x
            .iter()
            .zip(self.next_y.iter())
            .map(|(&x, &y)| Point2D::new(x, y))
            .collect()
    }
}
