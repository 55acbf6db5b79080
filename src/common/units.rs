//! Speed units
//!
//! Telemetry reports ego speed and the planner regulates its reference speed
//! in the simulator's display unit (miles per hour). Everything derived from
//! positions (tracked vehicles, kinematic profiles) is in meters per second.
//! `Mph` marks the former so the two never mix silently.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Conversion factor used by the simulator between mph and m/s
pub const MPH_PER_MPS: f64 = 2.24;

/// Speed in the simulator's display unit
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mph(pub f64);

impl Mph {
    pub fn from_mps(mps: f64) -> Self {
        Mph(mps * MPH_PER_MPS)
    }

    pub fn to_mps(self) -> f64 {
        self.0 / MPH_PER_MPS
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Clamp into `[min, max]`
    pub fn clamp(self, min: Mph, max: Mph) -> Mph {
        Mph(self.0.max(min.0).min(max.0))
    }
}

impl std::ops::Add<f64> for Mph {
    type Output = Mph;

    fn add(self, rhs: f64) -> Mph {
        Mph(self.0 + rhs)
    }
}

impl std::ops::Sub<f64> for Mph {
    type Output = Mph;

    fn sub(self, rhs: f64) -> Mph {
        Mph(self.0 - rhs)
    }
}

impl fmt::Display for Mph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} mph", self.0)
    }
}
