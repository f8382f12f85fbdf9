//! Engine configuration: queue limits and affinity bonuses.
//!
//! The defaults mirror the live game. A config can be loaded from JSON
//! (missing fields fall back to defaults) and checked with
//! [`validate_config`] before it is handed to the engine.

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_QUEUE_DEPTH, MAX_TIME, START_XP};
use crate::error::EngineError;

/// Tunable engine parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of entries a queue may hold after a merge.
    pub max_queue_depth: usize,
    /// Maximum total remaining time (seconds) across a merged queue.
    pub max_queue_time: u32,
    /// Bonus when the avatar has exactly one start skill and trains it.
    pub single_start_skill_bonus_percent: u32,
    /// Bonus when the avatar has two start skills and trains either.
    pub dual_start_skill_bonus_percent: u32,
    /// XP granted on creation, split across start skills.
    pub start_xp: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_queue_depth: MAX_QUEUE_DEPTH,
            max_queue_time: MAX_TIME,
            single_start_skill_bonus_percent: 10,
            dual_start_skill_bonus_percent: 5,
            start_xp: START_XP,
        }
    }
}

impl EngineConfig {
    /// Parse a config from JSON, filling unspecified fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Queues could never hold an entry.
    ZeroQueueDepth,
    /// Queues could never hold any time.
    ZeroQueueTime,
    /// A bonus above 100% would more than double XP.
    BonusTooLarge(u32),
}

/// Validate a config, returning all errors found.
pub fn validate_config(config: &EngineConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if config.max_queue_depth == 0 {
        errors.push(ConfigError::ZeroQueueDepth);
    }
    if config.max_queue_time == 0 {
        errors.push(ConfigError::ZeroQueueTime);
    }
    for bonus in [
        config.single_start_skill_bonus_percent,
        config.dual_start_skill_bonus_percent,
    ] {
        if bonus > 100 {
            errors.push(ConfigError::BonusTooLarge(bonus));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&EngineConfig::default()).is_empty());
    }

    #[test]
    fn reports_every_problem() {
        let config = EngineConfig {
            max_queue_depth: 0,
            max_queue_time: 0,
            single_start_skill_bonus_percent: 150,
            dual_start_skill_bonus_percent: 5,
            start_xp: 0,
        };
        let errors = validate_config(&config);
        assert_eq!(
            errors,
            vec![
                ConfigError::ZeroQueueDepth,
                ConfigError::ZeroQueueTime,
                ConfigError::BonusTooLarge(150),
            ]
        );
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{ "max_queue_depth": 5 }"#).unwrap();
        assert_eq!(config.max_queue_depth, 5);
        assert_eq!(config.max_queue_time, MAX_TIME);
        assert_eq!(config.single_start_skill_bonus_percent, 10);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(EngineConfig::from_json("{ not json").is_err());
    }
}
