//! Per-camera orchestration: runs the detector only while it is needed,
//! owns calibration and the threshold store, and gates confirmations on the
//! armed flag supplied by the trial session.

use crate::calibration::Calibrator;
use crate::classifier::{Classifier, FrameSource, ModelSource};
use crate::config::GestureConfig;
use crate::detector::GestureDetector;
use crate::error::InitError;
use crate::threshold::ThresholdStore;
use reactime_core::GestureMode;
use reactime_timing::{Timer, ms_to_ns};
use tracing::{debug, warn};

/// Minimum spacing between updates of the displayed score.
const DISPLAY_REFRESH_MS: u64 = 150;

#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    /// Reduced score of a classified frame, for live display.
    Scores { mode: GestureMode, score: f32, at: u64 },
    /// A confirmed gesture while armed. Feed this to the trial session.
    Gesture { mode: GestureMode, at: u64 },
    CalibrationStarted { mode: GestureMode },
    Calibrated { mode: GestureMode, threshold: f32 },
    CalibrationCancelled { mode: GestureMode },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStatus {
    pub ready: bool,
    pub running: bool,
    pub calibrating: bool,
}

pub struct CameraSession<C, F, T>
where
    C: Classifier,
    F: FrameSource<Frame = C::Frame>,
    T: Timer<Timestamp = u64>,
{
    pub source: F,
    pub timer: T,
    detector: GestureDetector<C>,
    calibrator: Calibrator,
    thresholds: ThresholdStore,
    default_threshold: f32,
    armed: bool,
    events: Vec<GestureEvent>,
    latest_score: Option<f32>,
    display_score: Option<f32>,
    display_at: Option<u64>,
}

impl<C, F, T> CameraSession<C, F, T>
where
    C: Classifier,
    F: FrameSource<Frame = C::Frame>,
    T: Timer<Timestamp = u64>,
{
    pub fn new(config: GestureConfig, source: F, timer: T) -> Self {
        let detector = GestureDetector::new(config);
        Self {
            source,
            timer,
            default_threshold: detector.threshold(),
            detector,
            calibrator: Calibrator::new(),
            thresholds: ThresholdStore::new(),
            armed: false,
            events: Vec::new(),
            latest_score: None,
            display_score: None,
            display_at: None,
        }
    }

    pub async fn initialize(
        &mut self,
        sources: &[Box<dyn ModelSource<C>>],
    ) -> Result<String, InitError> {
        self.calibrator.cancel();
        self.detector.initialize(sources).await
    }

    pub fn attach_classifier(&mut self, classifier: C) {
        self.detector.attach(classifier);
    }

    /// Replaces the detector tuning. Throttle and debounce state start
    /// over. A mode that was already calibrated keeps its stored threshold.
    pub fn configure(&mut self, config: GestureConfig) {
        if config.mode != self.detector.mode() {
            self.cancel_calibration();
            self.latest_score = None;
            self.display_score = None;
        }
        self.detector.configure(config);
        self.default_threshold = self.detector.threshold();
        if let Some(threshold) = self.thresholds.get(self.detector.mode()) {
            self.detector.set_threshold(threshold);
        }
    }

    /// Armed exactly while the trial session expects a gesture response.
    pub fn set_armed(&mut self, armed: bool) {
        if armed != self.armed {
            debug!("Gesture pipeline {}", if armed { "armed" } else { "disarmed" });
        }
        self.armed = armed;
    }

    /// Switches gesture kind. Any open calibration is abandoned and the
    /// threshold comes from the store, or the configured default.
    pub fn set_mode(&mut self, mode: GestureMode) {
        if mode == self.detector.mode() {
            return;
        }
        self.cancel_calibration();
        self.detector.set_mode(mode);
        let threshold = self.thresholds.get_or(mode, self.default_threshold);
        self.detector.set_threshold(threshold);
        self.latest_score = None;
        self.display_score = None;
    }

    /// Starts a calibration window for the current mode. Requests repeating
    /// the last accepted token, or arriving while one is open, are ignored.
    /// A request made before the camera plays or the classifier is ready is
    /// dropped without consuming its token.
    pub fn request_calibration(&mut self, token: u64) -> bool {
        if self.calibrator.is_duplicate(token) {
            debug!("Calibration request {} is a duplicate", token);
            return false;
        }
        if !self.source.playing() || !self.detector.is_ready() {
            debug!("Calibration request {} before camera is ready", token);
            return false;
        }
        let mode = self.detector.mode();
        let now = self.timer.now();
        if !self.calibrator.begin(token, mode, now) {
            return false;
        }
        self.events.push(GestureEvent::CalibrationStarted { mode });
        true
    }

    /// One pass of the frame loop. Call from the host's render callback.
    pub fn tick(&mut self) -> Vec<GestureEvent> {
        let now = self.timer.now();
        let playing = self.source.playing();

        if !playing {
            self.cancel_calibration();
        }
        if let Some((mode, threshold)) = self.calibrator.poll(now) {
            self.thresholds.set(mode, threshold);
            if mode == self.detector.mode() {
                self.detector.set_threshold(threshold);
            }
            self.events.push(GestureEvent::Calibrated { mode, threshold });
        }

        self.sync_running(playing);

        if self.detector.is_running() {
            if let Some(frame) = self.source.frame() {
                self.handle_frame(&frame, now);
            }
        }
        if playing {
            self.refresh_display(now);
        }
        std::mem::take(&mut self.events)
    }

    /// Stops the loop and drops any open calibration.
    pub fn teardown(&mut self) {
        self.cancel_calibration();
        self.armed = false;
        self.detector.stop();
    }

    fn sync_running(&mut self, playing: bool) {
        let should_run =
            playing && self.detector.is_ready() && (self.calibrator.is_active() || self.armed);
        if should_run && !self.detector.is_running() {
            self.detector.start();
        } else if !should_run && self.detector.is_running() {
            self.detector.stop();
        }
    }

    fn handle_frame(&mut self, frame: &C::Frame, now: u64) {
        let Some(sample) = self.detector.process(frame, now) else {
            return;
        };
        let mode = self.detector.mode();
        self.latest_score = Some(sample.score);
        self.calibrator.record(sample.score);
        self.events.push(GestureEvent::Scores {
            mode,
            score: sample.score,
            at: sample.at,
        });

        if !sample.confirmed {
            return;
        }
        if self.armed && !self.calibrator.is_active() {
            self.events.push(GestureEvent::Gesture {
                mode,
                at: sample.at,
            });
        } else {
            debug!("Confirmation while disarmed dropped");
        }
    }

    fn refresh_display(&mut self, now: u64) {
        let Some(latest) = self.latest_score else {
            return;
        };
        let due = self
            .display_at
            .is_none_or(|last| now.saturating_sub(last) >= ms_to_ns(DISPLAY_REFRESH_MS));
        if due {
            self.display_score = Some(latest);
            self.display_at = Some(now);
        }
    }

    fn cancel_calibration(&mut self) {
        if let Some(mode) = self.calibrator.cancel() {
            warn!("Calibration of {} interrupted, nothing committed", mode);
            self.events.push(GestureEvent::CalibrationCancelled { mode });
        }
    }

    pub fn status(&self) -> PipelineStatus {
        PipelineStatus {
            ready: self.detector.is_ready(),
            running: self.detector.is_running(),
            calibrating: self.calibrator.is_active(),
        }
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibrator.is_active()
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn mode(&self) -> GestureMode {
        self.detector.mode()
    }

    /// Threshold currently applied to the live signal.
    pub fn threshold(&self) -> f32 {
        self.detector.threshold()
    }

    pub fn thresholds(&self) -> &ThresholdStore {
        &self.thresholds
    }

    /// Latest score, refreshed at most every 150 ms.
    pub fn display_score(&self) -> Option<f32> {
        self.display_score
    }

    pub fn init_error(&self) -> Option<&InitError> {
        self.detector.init_error()
    }
}
