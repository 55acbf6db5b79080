//! Lane-change anchor selection
//!
//! For each lane next to the ego lane, propose road-frame points where a
//! lane-change trajectory could be seeded, or none if the lane is unusable.
//!
//! A lane with nothing close ahead and nobody about to overtake is always
//! explorable and gets evenly spaced anchors. When vehicles behind are about
//! to pass the ego, each one leaves an overtake *mark* (its position at
//! overtake time plus a margin) and candidate offsets are kept only where they
//! stay clear of the overtaker and the gap behind it is not crowded.

use log::debug;
use serde::Deserialize;

use crate::common::{FrenetPoint, TrackedVehicle};
use crate::mapping::Lane;

/// Configuration for anchor selection
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// A vehicle this close ahead of the ego blocks the lane [m]
    pub blocked_ahead_distance: f64,
    /// How far behind the ego to look for overtaking vehicles [m]
    pub overtake_lookbehind: f64,
    /// Vehicles closing the gap within this time are overtakers [s]
    pub overtake_time: f64,
    /// Margin added behind an overtaker's projected position [m]
    pub mark_margin: f64,
    /// Length of the anchor search window ahead of the ego [m]
    pub span: f64,
    /// Offset step used when overtakers are present [m]
    pub merge_step: f64,
    /// Offset step used in a free lane [m]
    pub free_step: f64,
    /// Minimum distance between an anchor and its overtaker [m]
    pub overtaker_clearance: f64,
    /// Minimum gap from a mark back to another vehicle behind it [m]
    pub mark_gap_behind: f64,
    /// Minimum gap from a mark forward to another vehicle ahead of it [m]
    pub mark_gap_ahead: f64,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            blocked_ahead_distance: 30.0,
            overtake_lookbehind: 60.0,
            overtake_time: 1.5,
            mark_margin: 5.0,
            span: 30.0,
            merge_step: 1.0,
            free_step: 4.0,
            overtaker_clearance: 10.0,
            mark_gap_behind: 30.0,
            mark_gap_ahead: 15.0,
        }
    }
}

/// Candidate lane-change target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub s: f64,
    pub d: f64,
    pub lane: Lane,
}

impl Anchor {
    pub fn new(s: f64, lane: Lane) -> Self {
        Self { s, d: lane.center_d(), lane }
    }

    pub fn frenet(&self) -> FrenetPoint {
        FrenetPoint::new(self.s, self.d)
    }
}

/// Where and when a vehicle from behind will have passed the ego
#[derive(Debug, Clone, Copy, PartialEq)]
struct OvertakeMark {
    vehicle_id: i64,
    s: f64,
    time: f64,
}

pub struct AnchorSelector {
    config: AnchorConfig,
}

impl AnchorSelector {
    pub fn new(config: AnchorConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(AnchorConfig::default())
    }

    /// Anchors for both lanes adjacent to `current_lane`, left lane first.
    ///
    /// # Arguments
    /// * `start_s` - ego `s` at the end of the previous trajectory; anchors start here
    /// * `ego_s` - ego `s` now
    /// * `ego_speed` - ego speed [m/s]
    pub fn select(
        &self,
        start_s: f64,
        ego_s: f64,
        ego_speed: f64,
        current_lane: Lane,
        vehicles: &[TrackedVehicle],
    ) -> Vec<Anchor> {
        current_lane
            .neighbors()
            .flat_map(|lane| self.anchors_for_lane(lane, start_s, ego_s, ego_speed, vehicles))
            .collect()
    }

    pub fn anchors_for_lane(
        &self,
        lane: Lane,
        start_s: f64,
        ego_s: f64,
        ego_speed: f64,
        vehicles: &[TrackedVehicle],
    ) -> Vec<Anchor> {
        let in_lane: Vec<&TrackedVehicle> = vehicles.iter().filter(|v| lane.contains(v.d)).collect();

        let blocked_ahead = in_lane
            .iter()
            .any(|v| v.s > ego_s && v.s - ego_s < self.config.blocked_ahead_distance);

        let marks = self.overtake_marks(&in_lane, start_s, ego_speed);
        debug!("lane {}: {} vehicles about to overtake", lane, marks.len());

        let anchors: Vec<Anchor> = if !marks.is_empty() {
            self.offsets(start_s, self.config.merge_step)
                .filter(|&s| self.offset_is_safe(s, &marks, &in_lane))
                .map(|s| Anchor::new(s, lane))
                .collect()
        } else if !blocked_ahead {
            self.offsets(start_s, self.config.free_step)
                .map(|s| Anchor::new(s, lane))
                .collect()
        } else {
            Vec::new()
        };

        debug!("lane {}: {} anchors (blocked ahead: {})", lane, anchors.len(), blocked_ahead);
        anchors
    }

    fn overtake_marks(&self, in_lane: &[&TrackedVehicle], start_s: f64, ego_speed: f64) -> Vec<OvertakeMark> {
        in_lane
            .iter()
            .filter(|v| v.s < start_s && start_s - v.s < self.config.overtake_lookbehind)
            .filter_map(|v| {
                let time = (start_s - v.s) / ego_speed;
                if time > 0.0 && time <= self.config.overtake_time {
                    Some(OvertakeMark {
                        vehicle_id: v.id,
                        s: v.projected_s(time) + self.config.mark_margin,
                        time,
                    })
                } else {
                    None
                }
            })
            .collect()
    }

    fn offset_is_safe(&self, s: f64, marks: &[OvertakeMark], in_lane: &[&TrackedVehicle]) -> bool {
        marks.iter().all(|mark| {
            in_lane.iter().all(|v| {
                let projected = v.projected_s(mark.time);
                if v.id == mark.vehicle_id {
                    (s - projected).abs() >= self.config.overtaker_clearance
                } else if mark.s > projected {
                    mark.s - projected >= self.config.mark_gap_behind
                } else {
                    projected - mark.s >= self.config.mark_gap_ahead
                }
            })
        })
    }

    /// `start_s, start_s + step, ...` strictly below `start_s + span`
    fn offsets(&self, start_s: f64, step: f64) -> impl Iterator<Item = f64> {
        let span = self.config.span;
        let count = if step > 0.0 { (span / step).ceil() as usize } else { 0 };
        (0..count)
            .map(move |k| k as f64 * step)
            .take_while(move |&offset| offset < span)
            .map(move |offset| start_s + offset)
    }
}
