use reactime_core::GestureMode;
use std::collections::HashMap;
use tracing::debug;

/// Calibrated thresholds for one camera session, keyed by gesture mode.
#[derive(Debug, Clone, Default)]
pub struct ThresholdStore {
    thresholds: HashMap<GestureMode, f32>,
}

impl ThresholdStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, mode: GestureMode) -> Option<f32> {
        self.thresholds.get(&mode).copied()
    }

    pub fn get_or(&self, mode: GestureMode, fallback: f32) -> f32 {
        self.get(mode).unwrap_or(fallback)
    }

    pub fn set(&mut self, mode: GestureMode, threshold: f32) {
        debug!("Threshold for {} set to {:.2}", mode, threshold);
        self.thresholds.insert(mode, threshold.clamp(0.0, 1.0));
    }
}
