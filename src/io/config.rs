//! Planner configuration
//!
//! Every section is optional in the YAML file; missing fields keep their
//! defaults.
//!
//! ```yaml
//! speed:
//!   max_speed: 45.0
//! cost:
//!   trail_gap: 25.0
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::common::RoboticsResult;
use crate::mission_planning::{BehaviorConfig, SpeedConfig};
use crate::path_planning::{AnchorConfig, CostConfig, SynthesisConfig};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub synthesis: SynthesisConfig,
    pub anchors: AnchorConfig,
    pub cost: CostConfig,
    pub speed: SpeedConfig,
    pub behavior: BehaviorConfig,
}

impl PlannerConfig {
    pub fn from_yaml_str(text: &str) -> RoboticsResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> RoboticsResult<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_yaml::from_reader(file)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Mph, RoboticsError};

    #[test]
    fn test_partial_override() {
        let config = PlannerConfig::from_yaml_str(
            "speed:\n  max_speed: 45.0\n  step: 0.5\ncost:\n  trail_gap: 25.0\n",
        )
        .unwrap();
        assert_eq!(config.speed.max_speed, Mph(45.0));
        assert_eq!(config.speed.step, 0.5);
        assert_eq!(config.speed.min_speed, Mph(2.0));
        assert_eq!(config.cost.trail_gap, 25.0);
        assert_eq!(config.cost.lead_gap, 10.0);
        assert_eq!(config.anchors, AnchorConfig::default());
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(PlannerConfig::from_yaml_str("{}").unwrap(), PlannerConfig::default());
    }

    #[test]
    fn test_malformed_config() {
        let result = PlannerConfig::from_yaml_str("speed: [1, 2");
        assert!(matches!(result, Err(RoboticsError::ParseError(_))));
    }
}
