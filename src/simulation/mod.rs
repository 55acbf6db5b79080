// Simulation module: closed-loop highway traffic for demos and tests

pub mod highway;

pub use highway::*;
