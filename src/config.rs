use serde::{Deserialize, Serialize};

use crate::challenge::EndCondition;
use crate::error::ConfigurationError;

/// World configuration, as described in `spec.md` §4.4. Validated once
/// by [`crate::backend::Backend::initialize`]; never partially applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub floor_count: usize,
    pub elevator_count: usize,
    pub elevator_capacities: Vec<usize>,
    pub spawn_rate: f64,
    pub speed_floors_per_sec: f64,
    pub end_condition: EndCondition,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.floor_count < 2 {
            return Err(ConfigurationError::TooFewFloors(self.floor_count));
        }
        if self.elevator_count < 1 {
            return Err(ConfigurationError::TooFewElevators(self.elevator_count));
        }
        if self.elevator_capacities.is_empty() || self.elevator_capacities.iter().any(|&c| c == 0)
        {
            return Err(ConfigurationError::ZeroCapacity);
        }
        if !matches!(self.end_condition, EndCondition::Demo) && self.spawn_rate <= 0.0 {
            return Err(ConfigurationError::NonPositiveSpawnRate);
        }
        Ok(())
    }

    /// The capacity elevator `i` uses: `elevator_capacities[i % len]`.
    pub fn capacity_for(&self, elevator_index: usize) -> usize {
        self.elevator_capacities[elevator_index % self.elevator_capacities.len()]
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            floor_count: 5,
            elevator_count: 2,
            elevator_capacities: vec![4],
            spawn_rate: 0.5,
            speed_floors_per_sec: 2.6,
            end_condition: EndCondition::Demo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_too_few_floors() {
        let mut cfg = Config::default();
        cfg.floor_count = 1;
        assert_eq!(cfg.validate(), Err(ConfigurationError::TooFewFloors(1)));
    }

    #[test]
    fn capacities_wrap_by_modulo() {
        let mut cfg = Config::default();
        cfg.elevator_capacities = vec![4, 8];
        cfg.elevator_count = 3;
        assert_eq!(cfg.capacity_for(0), 4);
        assert_eq!(cfg.capacity_for(1), 8);
        assert_eq!(cfg.capacity_for(2), 4);
    }
}
