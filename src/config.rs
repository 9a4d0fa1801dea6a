//! Engine tuning, loadable from JSON.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "tolerance": { "max_distance_squared_sum": 0.02 }, "viables": { "max_hops": 2 } }
//! ```

use crate::reorientation::ReorientTolerance;
use crate::spring::RelaxParams;
use crate::viables::ViableParams;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tolerance: ReorientTolerance,
    pub viables: ViableParams,
    pub relax: RelaxParams,
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: EngineConfig = serde_json::from_str(json)?;
        log::info!(
            "Loaded engine config: tolerance {}, {} hops",
            config.tolerance.max_distance_squared_sum,
            config.viables.max_hops
        );
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "viables": { "max_hops": 5 } }"#).unwrap();
        assert_eq!(config.viables.max_hops, 5);
        assert_eq!(config.viables.min_total_screen_length, 0.3);
        assert_eq!(config.tolerance, ReorientTolerance::default());
        assert_eq!(config.relax.passes_after_drag, 6);
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_round_trip() {
        let mut config = EngineConfig::default();
        config.relax.passes_after_insert = 12;
        config.tolerance = ReorientTolerance::from_budget(0.01);
        let json = config.to_json_string().unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_wrong_types() {
        assert!(EngineConfig::from_json(r#"{ "viables": { "max_hops": "many" } }"#).is_err());
    }
}
