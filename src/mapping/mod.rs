// Road map module: waypoint map, Frenet conversion and lane indexing

pub mod lane;
pub mod waypoint_map;

pub use lane::*;
pub use waypoint_map::*;
