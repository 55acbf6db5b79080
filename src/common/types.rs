//! Common types used throughout highway_planner

use nalgebra::{Isometry2, Point2, Vector2};

/// 2D point in the global (map) frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Bearing from `self` towards `other` [rad]
    pub fn bearing_to(&self, other: &Point2D) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

impl From<Point2<f64>> for Point2D {
    fn from(p: Point2<f64>) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// Road-relative coordinates: `s` along the centerline, `d` lateral offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrenetPoint {
    pub s: f64,
    pub d: f64,
}

impl FrenetPoint {
    pub fn new(s: f64, d: f64) -> Self {
        Self { s, d }
    }
}

/// 2D pose (position + orientation)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    fn isometry(&self) -> Isometry2<f64> {
        Isometry2::new(Vector2::new(self.x, self.y), self.yaw)
    }

    /// Express a global point in this pose's frame (x axis along `yaw`)
    pub fn to_local(&self, p: Point2D) -> Point2D {
        self.isometry().inverse_transform_point(&Point2::new(p.x, p.y)).into()
    }

    /// Inverse of [`Pose2D::to_local`]
    pub fn to_global(&self, p: Point2D) -> Point2D {
        self.isometry().transform_point(&Point2::new(p.x, p.y)).into()
    }
}

/// Another vehicle as reported by sensor fusion for the current cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedVehicle {
    pub id: i64,
    pub x: f64,
    pub y: f64,
    /// Velocity in the global frame [m/s]
    pub vx: f64,
    pub vy: f64,
    pub s: f64,
    pub d: f64,
}

impl TrackedVehicle {
    pub fn new(id: i64, x: f64, y: f64, vx: f64, vy: f64, s: f64, d: f64) -> Self {
        Self { id, x, y, vx, vy, s, d }
    }

    /// Speed magnitude [m/s]
    pub fn speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }

    /// Longitudinal position after `t` seconds at constant speed
    pub fn projected_s(&self, t: f64) -> f64 {
        self.s + t * self.speed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_point2d_distance() {
        let p1 = Point2D::new(0.0, 0.0);
        let p2 = Point2D::new(3.0, 4.0);
        assert!((p1.distance(&p2) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_tracked_vehicle_projection() {
        let v = TrackedVehicle::new(3, 0.0, 0.0, 3.0, 4.0, 100.0, 6.0);
        assert!((v.speed() - 5.0).abs() < 1e-10);
        assert!((v.projected_s(2.0) - 110.0).abs() < 1e-10);
    }

    #[test]
    fn test_pose_local_frame() {
        let pose = Pose2D::new(10.0, 5.0, FRAC_PI_2);
        // One meter "north" of the pose is one meter ahead in its frame
        let local = pose.to_local(Point2D::new(10.0, 6.0));
        assert!((local.x - 1.0).abs() < 1e-10);
        assert!(local.y.abs() < 1e-10);

        let back = pose.to_global(local);
        assert!((back.x - 10.0).abs() < 1e-10);
        assert!((back.y - 6.0).abs() < 1e-10);
    }
}
