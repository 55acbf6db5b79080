//! Waypoint map and Frenet frame conversion
//!
//! The road is described by a sparse, ordered list of centerline waypoints.
//! Conversions treat the map as a polyline: `to_road_frame` projects onto the
//! segment ending at the next waypoint ahead of the vehicle, `to_global_frame`
//! walks the segment containing the query `s`.
//!
//! Both conversions are a linear scan over the waypoints. The map is small
//! (a few hundred points) and immutable, so no spatial index is kept.

use serde::Deserialize;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::common::{FrenetPoint, Point2D, RoadFrame, RoboticsError, RoboticsResult};

/// Default point used to decide the sign of `d`
const DEFAULT_REFERENCE: (f64, f64) = (1000.0, 2000.0);

/// One centerline sample of the waypoint map
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    pub s: f64,
    /// Unit normal pointing towards increasing `d`
    pub dx: f64,
    pub dy: f64,
}

impl Waypoint {
    pub fn new(x: f64, y: f64, s: f64, dx: f64, dy: f64) -> Self {
        Self { x, y, s, dx, dy }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// Immutable road map shared by every planning cycle
#[derive(Debug, Clone)]
pub struct WaypointMap {
    waypoints: Vec<Waypoint>,
    /// Arc length of the polyline up to each waypoint
    cumulative: Vec<f64>,
    reference: Point2D,
    track_length: Option<f64>,
}

impl WaypointMap {
    pub fn new(waypoints: Vec<Waypoint>) -> RoboticsResult<Self> {
        if waypoints.len() < 2 {
            return Err(RoboticsError::MapError(format!(
                "need at least 2 waypoints, got {}",
                waypoints.len()
            )));
        }
        if let Some(i) = waypoints.windows(2).position(|w| !(w[1].s >= w[0].s)) {
            return Err(RoboticsError::MapError(format!(
                "waypoint s must be non-decreasing (index {})",
                i + 1
            )));
        }

        let mut cumulative = Vec::with_capacity(waypoints.len());
        cumulative.push(0.0);
        for w in waypoints.windows(2) {
            let last = cumulative[cumulative.len() - 1];
            cumulative.push(last + w[0].position().distance(&w[1].position()));
        }

        Ok(Self {
            waypoints,
            cumulative,
            reference: Point2D::from(DEFAULT_REFERENCE),
            track_length: None,
        })
    }

    /// Synthetic straight road starting at the origin and running along +x.
    /// `d` grows towards -y.
    pub fn straight(length: f64, spacing: f64) -> RoboticsResult<Self> {
        if !(spacing > 0.0) || !(length >= spacing) {
            return Err(RoboticsError::InvalidParameter(format!(
                "straight road needs length >= spacing > 0 (length {}, spacing {})",
                length, spacing
            )));
        }
        let n = (length / spacing).floor() as usize + 1;
        let waypoints = (0..n)
            .map(|i| {
                let s = i as f64 * spacing;
                Waypoint::new(s, 0.0, s, 0.0, -1.0)
            })
            .collect();
        Self::new(waypoints)
    }

    /// Point whose distance decides the sign of `d`. It must lie on the
    /// negative-`d` side of the whole road.
    pub fn with_reference_point(mut self, reference: Point2D) -> Self {
        self.reference = reference;
        self
    }

    /// Wrap `s` into `[0, track_length)` before converting to global
    pub fn with_track_length(mut self, track_length: f64) -> Self {
        self.track_length = Some(track_length);
        self
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Index of the waypoint nearest to `(x, y)`
    pub fn closest_waypoint(&self, x: f64, y: f64) -> usize {
        let query = Point2D::new(x, y);
        let mut closest_len = f64::INFINITY;
        let mut closest = 0;
        for (i, w) in self.waypoints.iter().enumerate() {
            let dist = query.distance(&w.position());
            if dist < closest_len {
                closest_len = dist;
                closest = i;
            }
        }
        closest
    }

    /// Index of the first waypoint ahead of a vehicle at `(x, y)` heading `heading`
    pub fn next_waypoint(&self, x: f64, y: f64, heading: f64) -> usize {
        let closest = self.closest_waypoint(x, y);
        let bearing = Point2D::new(x, y).bearing_to(&self.waypoints[closest].position());

        let mut angle = (heading - bearing).abs() % (2.0 * PI);
        if angle > PI {
            angle = 2.0 * PI - angle;
        }

        // not within the vehicle's line of sight: it is behind us
        if angle > FRAC_PI_4 {
            (closest + 1) % self.waypoints.len()
        } else {
            closest
        }
    }

    pub fn to_road_frame(&self, x: f64, y: f64, heading: f64) -> FrenetPoint {
        let next = self.next_waypoint(x, y, heading);
        let prev = if next == 0 { self.waypoints.len() - 1 } else { next - 1 };

        let origin = self.waypoints[prev].position().to_vector();
        let n = self.waypoints[next].position().to_vector() - origin;
        let v = Point2D::new(x, y).to_vector() - origin;

        let n_sq = n.norm_squared();
        let proj_norm = if n_sq > 0.0 { v.dot(&n) / n_sq } else { 0.0 };
        let proj = n * proj_norm;

        let mut d = (v - proj).norm();

        let center = self.reference.to_vector() - origin;
        if (center - v).norm() <= (center - proj).norm() {
            d = -d;
        }

        let s = self.cumulative[prev] + proj_norm * n_sq.sqrt();
        FrenetPoint::new(s, d)
    }

    pub fn to_global_frame(&self, s: f64, d: f64) -> Point2D {
        let s = match self.track_length {
            Some(length) if length > 0.0 => s.rem_euclid(length),
            _ => s,
        };

        let last = self.waypoints.len() - 1;
        let prev = self.waypoints.iter().rposition(|w| s > w.s).unwrap_or(0);
        let p = &self.waypoints[prev];
        // an open road is extended along its last segment instead of closing back to the start
        let heading = if prev == last && self.track_length.is_none() {
            self.waypoints[last - 1].position().bearing_to(&p.position())
        } else {
            let q = &self.waypoints[(prev + 1) % self.waypoints.len()];
            p.position().bearing_to(&q.position())
        };
        let seg_s = s - p.s;
        let seg_x = p.x + seg_s * heading.cos();
        let seg_y = p.y + seg_s * heading.sin();

        let perp_heading = heading - FRAC_PI_2;
        Point2D::new(seg_x + d * perp_heading.cos(), seg_y + d * perp_heading.sin())
    }
}

impl RoadFrame for WaypointMap {
    fn to_road_frame(&self, x: f64, y: f64, heading: f64) -> FrenetPoint {
        WaypointMap::to_road_frame(self, x, y, heading)
    }

    fn to_global_frame(&self, s: f64, d: f64) -> Point2D {
        WaypointMap::to_global_frame(self, s, d)
    }
}
