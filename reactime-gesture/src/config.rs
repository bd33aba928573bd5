use reactime_core::GestureMode;
use serde::{Deserialize, Serialize};

/// Length of the resting-baseline sampling window.
pub const CALIBRATION_WINDOW_MS: u64 = 1200;
/// Baseline assumed when the window produced no samples.
pub const DEFAULT_BASELINE: f32 = 0.1;

const MIN_FPS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub mode: GestureMode,
    /// Score threshold used until the mode has been calibrated.
    pub threshold: f32,
    pub consecutive_frames: u32,
    pub dead_time_ms: u64,
    /// Classify every Nth available frame.
    pub sample_every_n: u32,
    pub max_fps: u32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            mode: GestureMode::Mouth,
            threshold: 0.5,
            consecutive_frames: 2,
            dead_time_ms: 300,
            sample_every_n: 2,
            max_fps: 24,
        }
    }
}

impl GestureConfig {
    /// Clamps the throttles and counters into their usable ranges.
    pub fn normalized(mut self) -> Self {
        self.threshold = self.threshold.clamp(0.0, 1.0);
        self.consecutive_frames = self.consecutive_frames.max(1);
        self.sample_every_n = self.sample_every_n.max(1);
        self.max_fps = self.max_fps.max(MIN_FPS);
        self
    }

    /// Minimum spacing between two inferences.
    pub fn frame_budget_ns(&self) -> u64 {
        1_000_000_000 / u64::from(self.max_fps.max(MIN_FPS))
    }
}

/// Tuning constants turning a resting baseline into a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConstants {
    pub floor: f32,
    pub offset: f32,
}

impl CalibrationConstants {
    pub fn for_mode(mode: GestureMode) -> Self {
        match mode {
            GestureMode::Mouth => Self {
                floor: 0.4,
                offset: 0.2,
            },
            GestureMode::Blink => Self {
                floor: 0.3,
                offset: 0.3,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_enforces_lower_bounds() {
        let config = GestureConfig {
            consecutive_frames: 0,
            sample_every_n: 0,
            max_fps: 1,
            threshold: 1.5,
            ..Default::default()
        }
        .normalized();
        assert_eq!(config.consecutive_frames, 1);
        assert_eq!(config.sample_every_n, 1);
        assert_eq!(config.max_fps, 5);
        assert_eq!(config.threshold, 1.0);
        assert_eq!(config.frame_budget_ns(), 200_000_000);
    }

    #[test]
    fn mode_deserializes_lowercase() {
        let config: GestureConfig = serde_json::from_str(r#"{ "mode": "blink" }"#).unwrap();
        assert_eq!(config.mode, GestureMode::Blink);
        assert_eq!(config.max_fps, 24);
    }
}
