// Highway planner driver.
//
// Reads simulator frames from stdin, one per line, and writes the reply
// frame for each to stdout.
//
// usage: highway_planner <highway_map.csv> [planner.yaml]

use std::io::{self, BufRead, Write};

use log::{error, info};

use highway_planner::io::{encode_control, load_map, parse_frame, InboundMessage, MANUAL_MESSAGE};
use highway_planner::{BehaviorController, EgoPlanningState, PlannerConfig, RoboticsError, RoboticsResult};

fn main() -> RoboticsResult<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let map_path = args.get(1).ok_or_else(|| {
        RoboticsError::InvalidParameter("usage: highway_planner <highway_map.csv> [planner.yaml]".to_string())
    })?;
    let map = load_map(map_path)?;

    let config = match args.get(2) {
        Some(path) => {
            info!("loading planner configuration from {}", path);
            PlannerConfig::from_yaml_file(path)?
        }
        None => PlannerConfig::default(),
    };
    let controller = BehaviorController::new(config);
    let mut state = EgoPlanningState::default();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line?;
        let frame = line.trim();
        if frame.is_empty() {
            continue;
        }

        let reply = match parse_frame(frame) {
            Ok(InboundMessage::Telemetry(telemetry)) => {
                let (path, next) = controller.plan(&state, &telemetry, &map)?;
                state = next;
                Some(encode_control(&path)?)
            }
            Ok(InboundMessage::Manual) => Some(MANUAL_MESSAGE.to_string()),
            Ok(InboundMessage::Other(event)) => {
                info!("ignoring event {}", event);
                None
            }
            Ok(InboundMessage::Ignored) => None,
            Err(e) => {
                error!("malformed frame: {}", e);
                return Err(e);
            }
        };

        if let Some(reply) = reply {
            writeln!(out, "{}", reply)?;
            out.flush()?;
        }
    }

    Ok(())
}
