// I/O module: map files, wire messages and configuration

pub mod config;
pub mod map_loader;
pub mod telemetry;

pub use config::*;
pub use map_loader::*;
pub use telemetry::*;
