use highway_planner::io::{encode_control, parse_frame, InboundMessage};
use highway_planner::simulation::{HighwaySim, SimConfig};
use highway_planner::{
    BehaviorController, BehaviorState, EgoPlanningState, Lane, Mph, Telemetry, TrackedVehicle,
    WaypointMap,
};

fn straight_road() -> WaypointMap {
    WaypointMap::straight(3000.0, 30.0).unwrap()
}

fn telemetry_at(road: &WaypointMap, s: f64, d: f64, speed: Mph, traffic: Vec<TrackedVehicle>) -> Telemetry {
    let p = road.to_global_frame(s, d);
    Telemetry {
        x: p.x,
        y: p.y,
        s,
        d,
        yaw: 0.0,
        speed,
        previous_path_x: vec![],
        previous_path_y: vec![],
        end_path_s: 0.0,
        end_path_d: 0.0,
        sensor_fusion: traffic,
    }
}

fn vehicle_at(road: &WaypointMap, id: i64, s: f64, d: f64, speed: f64) -> TrackedVehicle {
    let p = road.to_global_frame(s, d);
    TrackedVehicle::new(id, p.x, p.y, speed, 0.0, s, d)
}

#[test]
fn test_slow_lead_triggers_lane_change() {
    let road = straight_road();
    let controller = BehaviorController::with_defaults();
    let lead = vehicle_at(&road, 1, 130.0, 6.0, 30.0 / 2.24);
    let telemetry = telemetry_at(&road, 100.0, 6.0, Mph(40.0), vec![lead]);
    let state = EgoPlanningState {
        behavior: BehaviorState::KeepLane,
        goal_lane: Lane::Middle,
        goal_s: 0.0,
        reference_speed: Mph(40.0),
    };

    let (path, next) = controller.plan(&state, &telemetry, &road).unwrap();

    assert_eq!(path.len(), 50);
    assert!(next.reference_speed <= Mph(40.0));
    let last = path.points()[path.len() - 1];
    let end_d = road.to_road_frame(last.x, last.y, 0.0).d;
    match next.behavior {
        BehaviorState::LaneChangeLeft => {
            assert_eq!(next.goal_lane, Lane::Left);
            assert!(end_d < 6.0);
        }
        BehaviorState::LaneChangeRight => {
            assert_eq!(next.goal_lane, Lane::Right);
            assert!(end_d > 6.0);
        }
        other => panic!("expected a lane change, got {}", other),
    }
}

#[test]
fn test_reference_speed_stays_clamped() {
    let road = straight_road();
    let controller = BehaviorController::with_defaults();
    let mut state = EgoPlanningState {
        reference_speed: Mph(49.9),
        ..EgoPlanningState::default()
    };
    let telemetry = telemetry_at(&road, 100.0, 6.0, Mph(49.0), vec![]);

    for _ in 0..20 {
        let (_, next) = controller.plan(&state, &telemetry, &road).unwrap();
        assert!(next.reference_speed <= Mph(49.95));
        state = next;
    }
    assert_eq!(state.reference_speed, Mph(49.95));

    // a stopped vehicle right ahead drives the reference down to the floor;
    // the ego is too fast to consider passing it
    let blocker = vehicle_at(&road, 3, 110.0, 6.0, 0.0);
    let blocked = telemetry_at(&road, 100.0, 6.0, Mph(46.0), vec![blocker]);
    state.reference_speed = Mph(2.1);
    for _ in 0..5 {
        let (_, next) = controller.plan(&state, &blocked, &road).unwrap();
        assert!(next.reference_speed >= Mph(2.0));
        state = next;
    }
    assert_eq!(state.reference_speed, Mph(2.0));
}

#[test]
fn test_closed_loop_without_traffic() {
    let mut sim = HighwaySim::new(SimConfig {
        traffic_count: 0,
        ..SimConfig::default()
    })
    .unwrap();
    let controller = BehaviorController::with_defaults();
    let mut state = EgoPlanningState::default();
    let start_s = sim.telemetry().s;

    for _ in 0..300 {
        let telemetry = sim.telemetry();
        let (path, next) = controller.plan(&state, &telemetry, sim.map()).unwrap();
        assert_eq!(path.len(), 50);
        assert!(next.reference_speed >= Mph(2.0) && next.reference_speed <= Mph(49.95));
        assert!(next.behavior.is_keeping_lane());
        state = next;
        sim.step(&path);
        assert_eq!(Lane::from_d(sim.telemetry().d), Some(Lane::Middle));
    }

    assert!(sim.telemetry().s > start_s + 100.0);
    assert_eq!(state.reference_speed, Mph(49.95));
}

#[test]
fn test_run_with_traffic_never_leaves_the_road() {
    let mut sim = HighwaySim::with_defaults().unwrap();
    let controller = BehaviorController::with_defaults();

    let (records, state) = sim
        .run(&controller, EgoPlanningState::default(), 400)
        .unwrap();

    assert_eq!(records.len(), 400);
    for r in &records {
        assert!(Lane::from_d(r.d).is_some(), "left the road at t = {:.2}: d = {}", r.time, r.d);
        assert!(r.reference_speed >= Mph(2.0) && r.reference_speed <= Mph(49.95));
    }
    assert!(records.windows(2).all(|w| w[1].s >= w[0].s));
    assert!(!matches!(
        state.behavior,
        BehaviorState::PrepareLaneChangeLeft | BehaviorState::PrepareLaneChangeRight
    ));
}

#[test]
fn test_frame_round_trip_through_planner() {
    let road = straight_road();
    let controller = BehaviorController::with_defaults();
    let frame = r#"42["telemetry",{"x":100.0,"y":-6.0,"s":100.0,"d":6.0,"yaw":0.0,"speed":0.0,"previous_path_x":[],"previous_path_y":[],"end_path_s":0.0,"end_path_d":0.0,"sensor_fusion":[[0,200.0,-2.0,15.0,0.0,200.0,2.0]]}]"#;

    let telemetry = match parse_frame(frame).unwrap() {
        InboundMessage::Telemetry(t) => t,
        other => panic!("unexpected message {:?}", other),
    };
    assert_eq!(telemetry.sensor_fusion.len(), 1);

    let (path, state) = controller
        .plan(&EgoPlanningState::default(), &telemetry, &road)
        .unwrap();
    assert_eq!(state.behavior, BehaviorState::KeepLane);

    let reply = encode_control(&path).unwrap();
    assert!(reply.starts_with("42[\"control\","));
    assert!(reply.contains("next_x"));
    assert!(reply.contains("next_y"));
}
