// Mission Planning module: lane-level behavior and speed control

pub mod behavior;
pub mod speed_regulator;
pub mod controller;

pub use behavior::*;
pub use speed_regulator::*;
pub use controller::*;
