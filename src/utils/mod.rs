//! Utility modules for highway_planner

pub mod visualization;

pub use visualization::{colors, plot_cycle, PathStyle, PointStyle, Visualizer};
