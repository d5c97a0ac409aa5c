//! Detector configuration
//!
//! Recognized options and their defaults. Partial configuration objects
//! deserialize with per-field defaults; deeper merging of config layers is
//! the embedder's concern.

use serde::{Deserialize, Serialize};

/// Default minimum interaction count before any score is produced
pub const DEFAULT_MIN_SAMPLE_SIZE: u64 = 20;

/// Default typing-speed suspicion threshold in words per minute.
///
/// Used to normalize how far above 100 wpm the observed speed sits.
pub const DEFAULT_TYPING_SPEED_THRESHOLD: f64 = 200.0;

/// Default fast-click suspicion threshold in milliseconds
pub const DEFAULT_CLICK_SPEED_THRESHOLD: f64 = 500.0;

/// Default movement-straightness suspicion threshold
pub const DEFAULT_STRAIGHTNESS_THRESHOLD: f64 = 0.9;

/// Default sensitivity multiplier applied to the final score
pub const DEFAULT_SENSITIVITY: f64 = 1.0;

/// Detector configuration.
///
/// All fields are optional on the wire; missing fields take the documented
/// defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Minimum total interaction count before scoring engages
    pub min_sample_size: u64,
    /// Typing-speed suspicion threshold (wpm)
    pub typing_speed_threshold: f64,
    /// Fast-click suspicion threshold (ms between clicks)
    pub click_speed_threshold: f64,
    /// Movement-straightness suspicion threshold (0-1)
    pub straightness_threshold: f64,
    /// Sensitivity multiplier (0-1) applied to the final score
    pub sensitivity: f64,
    /// Channel enable flags
    pub track_typing: bool,
    pub track_clicks: bool,
    pub track_movement: bool,
    pub track_focus: bool,
    pub track_clipboard: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_sample_size: DEFAULT_MIN_SAMPLE_SIZE,
            typing_speed_threshold: DEFAULT_TYPING_SPEED_THRESHOLD,
            click_speed_threshold: DEFAULT_CLICK_SPEED_THRESHOLD,
            straightness_threshold: DEFAULT_STRAIGHTNESS_THRESHOLD,
            sensitivity: DEFAULT_SENSITIVITY,
            track_typing: true,
            track_clicks: true,
            track_movement: true,
            track_focus: true,
            track_clipboard: true,
        }
    }
}

impl DetectorConfig {
    /// Return the configuration with `sensitivity` and `straightness_threshold`
    /// clamped into their valid [0, 1] ranges.
    pub fn normalized(mut self) -> Self {
        self.sensitivity = self.sensitivity.clamp(0.0, 1.0);
        self.straightness_threshold = self.straightness_threshold.clamp(0.0, 1.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = DetectorConfig::default();
        assert_eq!(config.min_sample_size, 20);
        assert_eq!(config.typing_speed_threshold, 200.0);
        assert_eq!(config.click_speed_threshold, 500.0);
        assert_eq!(config.straightness_threshold, 0.9);
        assert_eq!(config.sensitivity, 1.0);
        assert!(config.track_typing);
        assert!(config.track_clipboard);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: DetectorConfig =
            serde_json::from_str(r#"{ "sensitivity": 0.5, "track_focus": false }"#).unwrap();
        assert_eq!(config.sensitivity, 0.5);
        assert!(!config.track_focus);
        assert_eq!(config.min_sample_size, DEFAULT_MIN_SAMPLE_SIZE);
        assert_eq!(config.click_speed_threshold, DEFAULT_CLICK_SPEED_THRESHOLD);
    }

    #[test]
    fn test_normalized_clamps_sensitivity() {
        let config = DetectorConfig {
            sensitivity: 1.5,
            straightness_threshold: -0.2,
            ..Default::default()
        }
        .normalized();

        assert_eq!(config.sensitivity, 1.0);
        assert_eq!(config.straightness_threshold, 0.0);
    }
}
