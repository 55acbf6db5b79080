// Closed-loop highway simulation with plotting.
//
// usage: highway_sim [cycles] [seed]

use log::info;

use highway_planner::simulation::{HighwaySim, SimConfig};
use highway_planner::utils::{colors, plot_cycle, PathStyle, Visualizer};
use highway_planner::{BehaviorController, EgoPlanningState, Point2D, RoboticsResult};

fn main() -> RoboticsResult<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let cycles = args.get(1).and_then(|a| a.parse().ok()).unwrap_or(600);
    let seed = args.get(2).and_then(|a| a.parse().ok()).unwrap_or(7);

    let mut sim = HighwaySim::new(SimConfig {
        seed,
        ..SimConfig::default()
    })?;
    let controller = BehaviorController::with_defaults();

    let (records, state) = sim.run(&controller, EgoPlanningState::default(), cycles)?;

    let lane_changes = records
        .windows(2)
        .filter(|w| !w[0].behavior.is_lane_change() && w[1].behavior.is_lane_change())
        .count();
    let closest = records
        .iter()
        .filter_map(|r| r.closest_in_lane)
        .fold(f64::INFINITY, f64::min);
    info!(
        "{} cycles, {:.1} s simulated, {} lane changes, final reference speed {}, closest in-lane gap {:.1} m",
        records.len(),
        sim.time(),
        lane_changes,
        state.reference_speed,
        closest
    );

    let Some(last) = records.last() else {
        return Ok(());
    };
    let ego_path: Vec<Point2D> = records.iter().map(|r| r.position).collect();
    let first_s = records.first().map_or(0.0, |r| r.s);

    std::fs::create_dir_all("img/highway")?;

    let mut vis = Visualizer::new();
    vis.set_title("Highway run")
        .set_y_range(-14.0, 2.0)
        .plot_road(sim.map(), first_s, last.s)
        .plot_lane_centers(sim.map(), first_s, last.s)
        .plot_path(&ego_path, &PathStyle::new(colors::EGO, "Ego"))
        .plot_traffic(&sim.telemetry().sensor_fusion);
    vis.save_png("img/highway/run.png", 1600, 400)?;

    let times: Vec<f64> = records.iter().map(|r| r.time).collect();
    let speeds: Vec<f64> = records.iter().map(|r| r.speed.value()).collect();
    let references: Vec<f64> = records.iter().map(|r| r.reference_speed.value()).collect();
    let mut speed_plot = Visualizer::new();
    speed_plot
        .set_title("Ego speed")
        .set_x_label("t [s]")
        .set_y_label("speed [mph]");
    speed_plot
        .plot_path(&to_points(&times, &speeds), &PathStyle::new(colors::EGO, "Measured"))
        .plot_path(&to_points(&times, &references), &PathStyle::new(colors::RED, "Reference"));
    speed_plot.save_png("img/highway/speed.png", 800, 400)?;

    let telemetry = sim.telemetry();
    let (path, _) = controller.plan(&state, &telemetry, sim.map())?;
    let title = format!("t = {:.1} s, {}", sim.time(), state.behavior);
    plot_cycle(sim.map(), telemetry.pose().position(), &telemetry.sensor_fusion, &path, &title)
        .save_png("img/highway/final_cycle.png", 1200, 400)?;

    println!("Highway simulation complete! Plots saved to img/highway/");
    Ok(())
}

fn to_points(x: &[f64], y: &[f64]) -> Vec<Point2D> {
    x.iter().zip(y.iter()).map(|(&x, &y)| Point2D::new(x, y)).collect()
}
