//! Common types, traits, and error definitions for highway_planner
//!
//! This module provides the foundational building blocks used across
//! all planner components in this crate.

pub mod types;
pub mod traits;
pub mod units;
pub mod error;

pub use types::*;
pub use traits::*;
pub use units::*;
pub use error::*;
