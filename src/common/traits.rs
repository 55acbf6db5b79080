//! Common traits defining interfaces between the planner components

use crate::common::types::*;

/// Conversion between the global Cartesian frame and road-relative
/// (Frenet-style) coordinates.
///
/// Implemented by [`crate::mapping::WaypointMap`]; the profiler, synthesizer
/// and controller only depend on this trait.
pub trait RoadFrame {
    /// Global `(x, y)` with travel heading `heading` [rad] to `(s, d)`
    fn to_road_frame(&self, x: f64, y: f64, heading: f64) -> FrenetPoint;

    /// Road-relative `(s, d)` to global `(x, y)`
    fn to_global_frame(&self, s: f64, d: f64) -> Point2D;
}

#[cfg(test)]
mod tests {
    use super::*;

    // A road running along the x axis with `d` growing towards -y
    struct StraightRoad;

    impl RoadFrame for StraightRoad {
        fn to_road_frame(&self, x: f64, y: f64, _heading: f64) -> FrenetPoint {
            FrenetPoint::new(x, -y)
        }

        fn to_global_frame(&self, s: f64, d: f64) -> Point2D {
            Point2D::new(s, -d)
        }
    }

    #[test]
    fn test_road_frame_trait() {
        let road: &dyn RoadFrame = &StraightRoad;
        let p = road.to_global_frame(10.0, 6.0);
        let f = road.to_road_frame(p.x, p.y, 0.0);
        assert_eq!(f, FrenetPoint::new(10.0, 6.0));
    }
}
