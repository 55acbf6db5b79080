//! Error types for highway_planner

use std::fmt;

/// Main error type for the highway planner
#[derive(Debug)]
pub enum RoboticsError {
    /// Trajectory planning failed
    PlanningError(String),
    /// Invalid parameter
    InvalidParameter(String),
    /// Waypoint map missing or malformed
    MapError(String),
    /// Behavior state machine was asked for a transition it does not have
    InvalidTransition(String),
    /// Numerical computation failed (spline fit, matrix inversion, etc.)
    NumericalError(String),
    /// Wire message or configuration could not be parsed
    ParseError(String),
    /// I/O error
    IoError(std::io::Error),
    /// Visualization error
    VisualizationError(String),
}

impl fmt::Display for RoboticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoboticsError::PlanningError(msg) => write!(f, "Planning error: {}", msg),
            RoboticsError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            RoboticsError::MapError(msg) => write!(f, "Map error: {}", msg),
            RoboticsError::InvalidTransition(msg) => write!(f, "Invalid transition: {}", msg),
            RoboticsError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
            RoboticsError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            RoboticsError::IoError(e) => write!(f, "I/O error: {}", e),
            RoboticsError::VisualizationError(msg) => write!(f, "Visualization error: {}", msg),
        }
    }
}

impl std::error::Error for RoboticsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RoboticsError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RoboticsError {
    fn from(e: std::io::Error) -> Self {
        RoboticsError::IoError(e)
    }
}

impl From<serde_json::Error> for RoboticsError {
    fn from(e: serde_json::Error) -> Self {
        RoboticsError::ParseError(e.to_string())
    }
}

impl From<serde_yaml::Error> for RoboticsError {
    fn from(e: serde_yaml::Error) -> Self {
        RoboticsError::ParseError(e.to_string())
    }
}

impl From<csv::Error> for RoboticsError {
    fn from(e: csv::Error) -> Self {
        RoboticsError::MapError(e.to_string())
    }
}

/// Result type alias for planner operations
pub type RoboticsResult<T> = Result<T, RoboticsError>;
