use crate::config::{CALIBRATION_WINDOW_MS, CalibrationConstants, DEFAULT_BASELINE};
use reactime_core::GestureMode;
use reactime_timing::TimerSlot;
use std::time::Duration;
use tracing::{debug, info};

/// `max(floor, mean(samples) + offset)`, rounded to two decimals. An empty
/// window falls back to `DEFAULT_BASELINE`.
pub fn compute_threshold(samples: &[f32], constants: CalibrationConstants) -> f32 {
    let baseline = if samples.is_empty() {
        DEFAULT_BASELINE
    } else {
        samples.iter().sum::<f32>() / samples.len() as f32
    };
    let threshold = constants.floor.max(baseline + constants.offset);
    (threshold * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WindowEnd;

/// Single-flight baseline sampler for one gesture mode at a time.
#[derive(Debug, Default)]
pub struct Calibrator {
    mode: Option<GestureMode>,
    samples: Vec<f32>,
    window: TimerSlot<WindowEnd>,
    last_token: Option<u64>,
}

impl Calibrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a request carrying `token` would be ignored as a duplicate.
    pub fn is_duplicate(&self, token: u64) -> bool {
        self.is_active() || self.last_token == Some(token)
    }

    /// Opens a fresh sampling window. Returns false for duplicates.
    pub fn begin(&mut self, token: u64, mode: GestureMode, now: u64) -> bool {
        if self.is_duplicate(token) {
            debug!("Calibration request {} ignored", token);
            return false;
        }
        self.last_token = Some(token);
        self.mode = Some(mode);
        self.samples.clear();
        self.window
            .arm(WindowEnd, now, Duration::from_millis(CALIBRATION_WINDOW_MS));
        info!("Calibrating {} for {} ms", mode, CALIBRATION_WINDOW_MS);
        true
    }

    pub fn record(&mut self, score: f32) {
        if self.is_active() {
            self.samples.push(score);
        }
    }

    /// Completes the window once it has elapsed, returning the mode and its
    /// new threshold. The sample buffer is discarded either way.
    pub fn poll(&mut self, now: u64) -> Option<(GestureMode, f32)> {
        self.window.poll(now)?;
        let mode = self.mode.take()?;
        let samples = std::mem::take(&mut self.samples);
        let threshold = compute_threshold(&samples, CalibrationConstants::for_mode(mode));
        info!(
            "Calibrated {} from {} samples: threshold {:.2}",
            mode,
            samples.len(),
            threshold
        );
        Some((mode, threshold))
    }

    /// Abandons an open window without committing anything.
    pub fn cancel(&mut self) -> Option<GestureMode> {
        self.window.cancel()?;
        self.samples.clear();
        let mode = self.mode.take();
        debug!("Calibration of {:?} cancelled", mode);
        mode
    }

    pub fn is_active(&self) -> bool {
        self.window.is_armed()
    }

    pub fn mode(&self) -> Option<GestureMode> {
        self.mode
    }
}
