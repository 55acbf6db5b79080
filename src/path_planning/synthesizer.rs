//! Trajectory synthesis
//!
//! Builds the next trajectory as a spline through five anchor points: two
//! continuity points taken from the end of the previous trajectory (or built
//! around its single leftover point, or the pose, using the pose heading) and
//! three points ahead in the target lane. The spline is fitted in a local frame at the last continuity point so
//! that it is single-valued in x, then sampled so that consecutive points are
//! `reference_speed * SAMPLE_TIME` apart along the curve.
//!
//! The unconsumed previous trajectory is copied verbatim to the front of the
//! output. Replanning only ever appends, which keeps acceleration and jerk
//! continuous across cycles.

use serde::Deserialize;

use crate::common::{FrenetPoint, Mph, Point2D, Pose2D, RoadFrame, RoboticsError, RoboticsResult};
use crate::mapping::Lane;
use crate::path_planning::spline::Spline;
use crate::path_planning::trajectory::{Trajectory, HORIZON, SAMPLE_TIME};

/// Configuration for the trajectory synthesizer
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Longitudinal spacing of the anchor points ahead of the target [m]
    pub anchor_spacing: f64,
    /// Number of anchor points placed in the target lane
    pub anchor_count: usize,
    /// Local x distance over which arc length is linearised [m]
    pub target_x: f64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            anchor_spacing: 30.0,
            anchor_count: 3,
            target_x: 30.0,
        }
    }
}

pub struct TrajectorySynthesizer {
    config: SynthesisConfig,
}

impl TrajectorySynthesizer {
    pub fn new(config: SynthesisConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(SynthesisConfig::default())
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Synthesize a trajectory towards `lane`, seeded at `target.s`.
    ///
    /// # Arguments
    /// * `target` - road-frame anchor; only `s` is used, the lateral goal is the lane center
    /// * `previous` - unconsumed points of the last trajectory
    /// * `pose` - current ego pose; its heading is used when `previous` has fewer than two points
    /// * `reference_speed` - speed to hold along the new part of the trajectory
    /// * `lane` - target lane
    /// * `road` - frame converter
    pub fn synthesize<R: RoadFrame + ?Sized>(
        &self,
        target: FrenetPoint,
        previous: &[Point2D],
        pose: &Pose2D,
        reference_speed: Mph,
        lane: Lane,
        road: &R,
    ) -> RoboticsResult<Trajectory> {
        if !(reference_speed.value() > 0.0) {
            return Err(RoboticsError::InvalidParameter(format!(
                "reference speed must be positive, got {}",
                reference_speed
            )));
        }

        let (ref_prev, ref_point) = continuity_points(previous, pose);
        let ref_yaw = if ref_prev.distance(&ref_point) > f64::EPSILON {
            ref_prev.bearing_to(&ref_point)
        } else {
            pose.yaw
        };
        let frame = Pose2D::new(ref_point.x, ref_point.y, ref_yaw);

        let mut anchors = vec![ref_prev, ref_point];
        for k in 1..=self.config.anchor_count {
            let s = target.s + self.config.anchor_spacing * k as f64;
            anchors.push(road.to_global_frame(s, lane.center_d()));
        }

        // keep the knots strictly increasing in local x
        let mut xs: Vec<f64> = Vec::with_capacity(anchors.len());
        let mut ys: Vec<f64> = Vec::with_capacity(anchors.len());
        for p in anchors.iter().map(|&p| frame.to_local(p)) {
            if xs.last().map_or(true, |&last| p.x > last) {
                xs.push(p.x);
                ys.push(p.y);
            }
        }
        let spline = Spline::new(&xs, &ys)?;

        let mut points: Vec<Point2D> = previous.to_vec();

        let target_x = self.config.target_x;
        let target_y = spline.calc(target_x);
        let target_distance = target_x.hypot(target_y);
        let step_distance = reference_speed.to_mps() * SAMPLE_TIME;
        let n = target_distance / step_distance;
        let x_step = target_x / n;

        let remaining = HORIZON.saturating_sub(previous.len());
        for i in 1..=remaining {
            let x = x_step * i as f64;
            let local = Point2D::new(x, spline.calc(x));
            points.push(frame.to_global(local));
        }

        Trajectory::from_points(points)
    }
}

/// Last two points of the previous trajectory. With fewer than two, the last
/// known position (single leftover point, else the pose) and a unit step
/// behind it along the pose heading.
fn continuity_points(previous: &[Point2D], pose: &Pose2D) -> (Point2D, Point2D) {
    match previous {
        [.., prev, last] => (*prev, *last),
        _ => {
            let current = previous.first().copied().unwrap_or_else(|| pose.position());
            let behind = Point2D::new(current.x - pose.yaw.cos(), current.y - pose.yaw.sin());
            (behind, current)
        }
    }
}
