// Engine configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::project::ProjectError;

/// Tunables of the engine. Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub default_bpm: f64,
    /// Sample rate of offline renders and exports
    pub offline_sample_rate: u32,
    /// Silence appended after the last bar so releases can ring out
    pub render_tail_seconds: f64,
    pub offline_master_gain: f32,
    pub live_master_gain: f32,
    pub command_queue_capacity: usize,
    pub notification_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_bpm: 128.0,
            offline_sample_rate: 44100,
            render_tail_seconds: 2.0,
            offline_master_gain: 0.7,
            live_master_gain: 0.8,
            command_queue_capacity: 512,
            notification_capacity: 64,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ProjectError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.default_bpm, 128.0);
        assert_eq!(config.offline_sample_rate, 44100);
        assert_eq!(config.render_tail_seconds, 2.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"defaultBpm": 90, "liveMasterGain": 0.5}"#)
            .unwrap();
        assert_eq!(config.default_bpm, 90.0);
        assert_eq!(config.live_master_gain, 0.5);
        assert_eq!(config.offline_master_gain, 0.7);
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(EngineConfig::from_json("{\"defaultBpm\": \"fast\"}").is_err());
    }
}
