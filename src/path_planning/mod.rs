// Path Planning module: trajectory synthesis, profiling and scoring

pub mod spline;
pub mod trajectory;
pub mod kinematics;
pub mod synthesizer;
pub mod anchors;
pub mod cost;

pub use spline::*;
pub use trajectory::*;
pub use kinematics::*;
pub use synthesizer::*;
pub use anchors::*;
pub use cost::*;
