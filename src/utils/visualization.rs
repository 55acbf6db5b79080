//! Visualization utilities for highway_planner
//!
//! Plots the road, traffic and ego trajectory using gnuplot.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{Point2D, RoboticsError, RoboticsResult, TrackedVehicle};
use crate::mapping::{Lane, WaypointMap, LANE_WIDTH, NUM_LANES};
use crate::path_planning::PlannedPath;

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const BLUE: &str = "#0000FF";
    pub const ORANGE: &str = "#FFA500";
    pub const GRAY: &str = "#808080";

    // Semantic colors
    pub const ROAD_EDGE: &str = BLACK;
    pub const LANE_MARKING: &str = GRAY;
    pub const TRAFFIC: &str = ORANGE;
    pub const TRAJECTORY: &str = RED;
    pub const EGO: &str = BLUE;
}

/// Style for path rendering
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            color: colors::TRAJECTORY.to_string(),
            line_width: 2.0,
            caption: "Trajectory".to_string(),
        }
    }
}

/// Style for point rendering
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            size: 1.0,
            symbol: 'O',
            caption: caption.to_string(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_symbol(mut self, symbol: char) -> Self {
        self.symbol = symbol;
        self
    }
}

/// Main visualizer struct
pub struct Visualizer {
    figure: Figure,
    title: String,
    x_label: String,
    y_label: String,
    y_range: Option<(f64, f64)>,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            figure: Figure::new(),
            title: String::new(),
            x_label: "X [m]".to_string(),
            y_label: "Y [m]".to_string(),
            y_range: None,
        }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    pub fn set_x_label(&mut self, label: &str) -> &mut Self {
        self.x_label = label.to_string();
        self
    }

    pub fn set_y_label(&mut self, label: &str) -> &mut Self {
        self.y_label = label.to_string();
        self
    }

    pub fn set_y_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.y_range = Some((min, max));
        self
    }

    /// Road edges and lane markings between `s_start` and `s_end`
    pub fn plot_road(&mut self, map: &WaypointMap, s_start: f64, s_end: f64) -> &mut Self {
        let samples = lane_line_samples(s_start, s_end);

        for i in 0..=NUM_LANES {
            let d = i as f64 * LANE_WIDTH;
            let line: Vec<Point2D> = samples.iter().map(|&s| map.to_global_frame(s, d)).collect();
            let x: Vec<f64> = line.iter().map(|p| p.x).collect();
            let y: Vec<f64> = line.iter().map(|p| p.y).collect();

            let (color, width) = if i == 0 || i == NUM_LANES {
                (colors::ROAD_EDGE, 2.0)
            } else {
                (colors::LANE_MARKING, 1.0)
            };
            self.figure.axes2d().lines(&x, &y, &[Color(color), LineWidth(width)]);
        }
        self
    }

    /// Lane centers as thin lines, useful when checking lateral tracking
    pub fn plot_lane_centers(&mut self, map: &WaypointMap, s_start: f64, s_end: f64) -> &mut Self {
        let samples = lane_line_samples(s_start, s_end);
        for lane in Lane::ALL {
            let line: Vec<Point2D> = samples
                .iter()
                .map(|&s| map.to_global_frame(s, lane.center_d()))
                .collect();
            self.plot_path(&line, &PathStyle::new(colors::LANE_MARKING, "").with_line_width(0.5));
        }
        self
    }

    pub fn plot_traffic(&mut self, vehicles: &[TrackedVehicle]) -> &mut Self {
        let points: Vec<Point2D> = vehicles.iter().map(|v| Point2D::new(v.x, v.y)).collect();
        self.plot_points(&points, &PointStyle::new(colors::TRAFFIC, "Traffic").with_symbol('S').with_size(1.5))
    }

    pub fn plot_planned_path(&mut self, path: &PlannedPath) -> &mut Self {
        self.plot_path(&path.points(), &PathStyle::default())
    }

    pub fn plot_path(&mut self, points: &[Point2D], style: &PathStyle) -> &mut Self {
        let x: Vec<f64> = points.iter().map(|p| p.x).collect();
        let y: Vec<f64> = points.iter().map(|p| p.y).collect();

        self.figure.axes2d().lines(
            &x,
            &y,
            &[Caption(&style.caption), Color(&style.color), LineWidth(style.line_width)],
        );
        self
    }

    pub fn plot_points(&mut self, points: &[Point2D], style: &PointStyle) -> &mut Self {
        let x: Vec<f64> = points.iter().map(|p| p.x).collect();
        let y: Vec<f64> = points.iter().map(|p| p.y).collect();

        self.figure.axes2d().points(
            &x,
            &y,
            &[
                Caption(&style.caption),
                Color(&style.color),
                PointSymbol(style.symbol),
                PointSize(style.size),
            ],
        );
        self
    }

    /// Ego position
    pub fn plot_ego(&mut self, position: Point2D) -> &mut Self {
        self.plot_points(&[position], &PointStyle::new(colors::EGO, "Ego").with_size(2.0))
    }

    pub fn save_png(&mut self, path: &str, width: u32, height: u32) -> RoboticsResult<()> {
        self.apply_settings();
        self.figure
            .save_to_png(path, width, height)
            .map_err(|e| RoboticsError::VisualizationError(e.to_string()))
    }

    fn apply_settings(&mut self) {
        let axes = self.figure.axes2d();

        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label(&self.x_label, &[]);
        axes.set_y_label(&self.y_label, &[]);

        if let Some((min, max)) = self.y_range {
            axes.set_y_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

/// One sample per meter, both ends included
fn lane_line_samples(s_start: f64, s_end: f64) -> Vec<f64> {
    if !(s_end > s_start) {
        return vec![s_start];
    }
    let n = (s_end - s_start).ceil() as usize;
    (0..=n).map(|i| (s_start + i as f64).min(s_end)).collect()
}

/// Road, traffic and the path just sent to the ego
pub fn plot_cycle(
    map: &WaypointMap,
    ego: Point2D,
    vehicles: &[TrackedVehicle],
    path: &PlannedPath,
    title: &str,
) -> Visualizer {
    let ego_s = map.to_road_frame(ego.x, ego.y, 0.0).s;
    let mut vis = Visualizer::new();
    vis.set_title(title);
    vis.plot_road(map, ego_s - 30.0, ego_s + 90.0)
        .plot_traffic(vehicles)
        .plot_planned_path(path)
        .plot_ego(ego);
    vis
}
