//! Simulator configuration.
//!
//! Every field has a default matching the stock arm (two 2-unit segments on
//! a 1-unit base). A JSON file only needs the fields it wants to override:
//!
//! ```json
//! { "num_segments": 3, "segment_length": 1.5, "recording_interval_ms": 100 }
//! ```

use std::time::Duration;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Segments created by `initialize`.
    pub num_segments: usize,
    /// Upper bound for `add_segment`.
    pub max_segments: usize,
    /// Base height; the first segment sits on top of the base.
    pub base_height: f64,
    /// Length of every arm segment.
    pub segment_length: f64,
    /// Segment width (rendering only).
    pub segment_width: f64,
    /// Offset added to the tip when the target is snapped back onto the arm.
    pub target_offset: [f64; 3],
    /// Whether drag updates run the IK solver.
    pub ik_enabled: bool,
    /// Recorder sampling period.
    pub recording_interval_ms: u64,
    /// Floor applied to every recorded frame duration.
    pub min_frame_duration_ms: u32,
    /// Delay after the last playback step before IK is restored.
    pub playback_grace_ms: u64,
    /// Delay before a simulated robot command reports completion.
    pub command_delay_ms: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            num_segments: 2,
            max_segments: 5,
            base_height: 1.0,
            segment_length: 2.0,
            segment_width: 0.5,
            target_offset: [0.0, 0.6, 0.0],
            ik_enabled: true,
            recording_interval_ms: 50,
            min_frame_duration_ms: 1000,
            playback_grace_ms: 500,
            command_delay_ms: 1000,
        }
    }
}

impl SimulatorConfig {
    /// Load a config from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| SimError::ConfigIo {
            path: path.to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Parse a config from a JSON string.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: SimulatorConfig = serde_json::from_str(content)?;
        if config.num_segments == 0 {
            return Err(SimError::InvalidSegmentCount(0));
        }
        Ok(config)
    }

    pub fn target_offset(&self) -> DVec3 {
        DVec3::from_array(self.target_offset)
    }

    pub fn recording_interval(&self) -> Duration {
        Duration::from_millis(self.recording_interval_ms)
    }

    pub fn playback_grace(&self) -> Duration {
        Duration::from_millis(self.playback_grace_ms)
    }

    pub fn command_delay(&self) -> Duration {
        Duration::from_millis(self.command_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulatorConfig::default();
        assert_eq!(config.num_segments, 2);
        assert_eq!(config.segment_length, 2.0);
        assert_eq!(config.recording_interval(), Duration::from_millis(50));
        assert_eq!(config.playback_grace(), Duration::from_millis(500));
        assert_eq!(config.target_offset(), DVec3::new(0.0, 0.6, 0.0));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            SimulatorConfig::from_json_str(r#"{"num_segments": 3, "segment_length": 1.5}"#)
                .unwrap();
        assert_eq!(config.num_segments, 3);
        assert_eq!(config.segment_length, 1.5);
        assert_eq!(config.base_height, 1.0);
        assert!(config.ik_enabled);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let config =
            SimulatorConfig::from_json_str(r#"{"base_radius": 0.75, "max_segments": 4}"#).unwrap();
        assert_eq!(config.max_segments, 4);
        assert_eq!(
            config,
            SimulatorConfig {
                max_segments: 4,
                ..SimulatorConfig::default()
            }
        );
    }

    #[test]
    fn test_zero_segments_rejected() {
        let err = SimulatorConfig::from_json_str(r#"{"num_segments": 0}"#).unwrap_err();
        assert!(matches!(err, SimError::InvalidSegmentCount(0)));
    }

    #[test]
    fn test_bad_json_rejected() {
        let err = SimulatorConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, SimError::ConfigJson(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = SimulatorConfig::from_json_file("/nonexistent/tobor.json").unwrap_err();
        assert!(matches!(err, SimError::ConfigIo { .. }));
    }
}
