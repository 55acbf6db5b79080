//! Telemetry and control messages
//!
//! The simulator speaks Socket.IO over a websocket. Event frames start with
//! `42` followed by a JSON array `[event, data]`; a `null` payload means the
//! simulator is in manual mode and expects a `manual` reply.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::common::{Mph, Point2D, Pose2D, RoboticsError, RoboticsResult, TrackedVehicle};
use crate::path_planning::PlannedPath;

/// Reply sent when a frame carries no telemetry
pub const MANUAL_MESSAGE: &str = "42[\"manual\",{}]";

const EVENT_PREFIX: &str = "42";

/// Per-cycle input to the planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub x: f64,
    pub y: f64,
    pub s: f64,
    pub d: f64,
    /// Heading [deg]
    pub yaw: f64,
    pub speed: Mph,
    #[serde(default)]
    pub previous_path_x: Vec<f64>,
    #[serde(default)]
    pub previous_path_y: Vec<f64>,
    #[serde(default)]
    pub end_path_s: f64,
    #[serde(default)]
    pub end_path_d: f64,
    #[serde(default, with = "sensor_fusion_rows")]
    pub sensor_fusion: Vec<TrackedVehicle>,
}

impl Telemetry {
    /// Ego pose with heading in radians
    pub fn pose(&self) -> Pose2D {
        Pose2D::new(self.x, self.y, self.yaw.to_radians())
    }

    pub fn previous_path(&self) -> Vec<Point2D> {
        self.previous_path_x
            .iter()
            .zip(self.previous_path_y.iter())
            .map(|(&x, &y)| Point2D::new(x, y))
            .collect()
    }

    pub fn previous_len(&self) -> usize {
        self.previous_path_x.len().min(self.previous_path_y.len())
    }
}

/// `sensor_fusion` rows are `[id, x, y, vx, vy, s, d]`
mod sensor_fusion_rows {
    use super::*;

    pub fn serialize<S: Serializer>(vehicles: &[TrackedVehicle], serializer: S) -> Result<S::Ok, S::Error> {
        let rows: Vec<[f64; 7]> = vehicles
            .iter()
            .map(|v| [v.id as f64, v.x, v.y, v.vx, v.vy, v.s, v.d])
            .collect();
        rows.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<TrackedVehicle>, D::Error> {
        let rows: Vec<[f64; 7]> = Vec::deserialize(deserializer)?;
        Ok(rows
            .into_iter()
            .map(|r| TrackedVehicle::new(r[0] as i64, r[1], r[2], r[3], r[4], r[5], r[6]))
            .collect())
    }
}

/// What an inbound frame asks of the planner
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Telemetry(Box<Telemetry>),
    /// No data: the simulator is driven manually
    Manual,
    /// Some other event, ignored
    Other(String),
    /// Not an event frame (handshake, ping, ...)
    Ignored,
}

/// JSON array carried by an event frame, or `None` for a `null` payload
pub fn extract_payload(frame: &str) -> Option<&str> {
    if frame.contains("null") {
        return None;
    }
    let start = frame.find('[')?;
    let end = frame.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&frame[start..=end])
}

pub fn parse_frame(frame: &str) -> RoboticsResult<InboundMessage> {
    if frame.len() <= EVENT_PREFIX.len() || !frame.starts_with(EVENT_PREFIX) {
        return Ok(InboundMessage::Ignored);
    }

    let payload = match extract_payload(frame) {
        Some(payload) => payload,
        None => return Ok(InboundMessage::Manual),
    };

    let mut items: Vec<serde_json::Value> = serde_json::from_str(payload)?;
    if items.is_empty() {
        return Err(RoboticsError::ParseError("empty event array".to_string()));
    }
    let data = if items.len() > 1 { items.swap_remove(1) } else { serde_json::Value::Null };
    let event = match items.first().and_then(|e| e.as_str()) {
        Some(event) => event.to_string(),
        None => return Err(RoboticsError::ParseError("event name is not a string".to_string())),
    };

    if event == "telemetry" {
        let telemetry: Telemetry = serde_json::from_value(data)?;
        Ok(InboundMessage::Telemetry(Box::new(telemetry)))
    } else {
        Ok(InboundMessage::Other(event))
    }
}

/// Frame carrying the next path to the simulator
pub fn encode_control(path: &PlannedPath) -> RoboticsResult<String> {
    Ok(format!("42[\"control\",{}]", serde_json::to_string(path)?))
}

/// Frame carrying telemetry, as the simulator would send it
pub fn encode_telemetry(telemetry: &Telemetry) -> RoboticsResult<String> {
    Ok(format!("42[\"telemetry\",{}]", serde_json::to_string(telemetry)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: &str = r#"42["telemetry",{"x":909.48,"y":1128.67,"yaw":0,"speed":0,"s":124.834,"d":6.16483,"previous_path_x":[],"previous_path_y":[],"end_path_s":0,"end_path_d":0,"sensor_fusion":[[0,1020.03,1147.98,12.5,0.1,235.0,5.9],[1,775.8,1421.6,0,0,6719.2,-280.1]]}]"#;

    #[test]
    fn test_parse_telemetry_frame() {
        let message = parse_frame(FRAME).unwrap();
        let telemetry = match message {
            InboundMessage::Telemetry(t) => t,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(telemetry.x, 909.48);
        assert_eq!(telemetry.speed, Mph(0.0));
        assert_eq!(telemetry.previous_len(), 0);
        assert_eq!(telemetry.sensor_fusion.len(), 2);
        let v = telemetry.sensor_fusion[0];
        assert_eq!(v.id, 0);
        assert_eq!(v.vx, 12.5);
        assert_eq!(v.d, 5.9);
        assert_eq!(telemetry.sensor_fusion[1].id, 1);
    }

    #[test]
    fn test_null_payload_is_manual() {
        assert_eq!(extract_payload("42[\"telemetry\",null]"), None);
        assert_eq!(parse_frame("42[\"telemetry\",null]").unwrap(), InboundMessage::Manual);
    }

    #[test]
    fn test_non_event_frames_are_ignored() {
        assert_eq!(parse_frame("2").unwrap(), InboundMessage::Ignored);
        assert_eq!(parse_frame("0{\"sid\":\"abc\"}").unwrap(), InboundMessage::Ignored);
    }

    #[test]
    fn test_other_events() {
        assert_eq!(
            parse_frame("42[\"reset\",{}]").unwrap(),
            InboundMessage::Other("reset".to_string())
        );
    }

    #[test]
    fn test_malformed_telemetry() {
        let result = parse_frame("42[\"telemetry\",{\"x\":1.0}]");
        assert!(matches!(result, Err(RoboticsError::ParseError(_))));
    }

    #[test]
    fn test_encode_control() {
        let path = PlannedPath {
            next_x: vec![1.0, 2.0],
            next_y: vec![3.0, 4.5],
        };
        let frame = encode_control(&path).unwrap();
        assert_eq!(frame, r#"42["control",{"next_x":[1.0,2.0],"next_y":[3.0,4.5]}]"#);
    }

    #[test]
    fn test_telemetry_frame_round_trip() {
        let message = parse_frame(FRAME).unwrap();
        if let InboundMessage::Telemetry(telemetry) = message {
            let frame = encode_telemetry(&telemetry).unwrap();
            assert_eq!(parse_frame(&frame).unwrap(), InboundMessage::Telemetry(telemetry));
        } else {
            panic!("expected telemetry");
        }
    }

    #[test]
    fn test_pose_heading_in_radians() {
        let mut telemetry = match parse_frame(FRAME).unwrap() {
            InboundMessage::Telemetry(t) => *t,
            _ => unreachable!(),
        };
        telemetry.yaw = 90.0;
        assert!((telemetry.pose().yaw - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }
}
