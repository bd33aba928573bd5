use crate::classifier::{Classifier, ModelSource, load_first};
use crate::config::GestureConfig;
use crate::debounce::{Debouncer, Throttle};
use crate::error::InitError;
use crate::reduce::reduce_scores;
use reactime_core::{GestureMode, Scores};
use tracing::{debug, info, warn};

enum DetectorState<C> {
    Initializing,
    Ready(C),
    /// Every model source failed. Terminal until re-initialized.
    Failed(InitError),
}

/// Result of classifying one admitted frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub score: f32,
    pub scores: Scores,
    pub confirmed: bool,
    pub at: u64,
}

pub struct GestureDetector<C: Classifier> {
    state: DetectorState<C>,
    config: GestureConfig,
    threshold: f32,
    running: bool,
    throttle: Throttle,
    debouncer: Debouncer,
}

impl<C: Classifier> GestureDetector<C> {
    pub fn new(config: GestureConfig) -> Self {
        let config = config.normalized();
        Self {
            state: DetectorState::Initializing,
            threshold: config.threshold,
            running: false,
            throttle: Throttle::new(config.frame_budget_ns(), config.sample_every_n),
            debouncer: Debouncer::new(config.consecutive_frames, config.dead_time_ms),
            config,
        }
    }

    /// Replaces the tuning. Debounce and throttle state start over.
    pub fn configure(&mut self, config: GestureConfig) {
        let config = config.normalized();
        self.threshold = config.threshold;
        self.throttle = Throttle::new(config.frame_budget_ns(), config.sample_every_n);
        self.debouncer = Debouncer::new(config.consecutive_frames, config.dead_time_ms);
        self.config = config;
    }

    pub async fn initialize(
        &mut self,
        sources: &[Box<dyn ModelSource<C>>],
    ) -> Result<String, InitError> {
        self.stop();
        self.state = DetectorState::Initializing;
        match load_first(sources).await {
            Ok((classifier, name)) => {
                self.state = DetectorState::Ready(classifier);
                Ok(name)
            }
            Err(err) => {
                warn!("Gesture detector unavailable: {}", err);
                self.state = DetectorState::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// Installs an already constructed classifier.
    pub fn attach(&mut self, classifier: C) {
        self.state = DetectorState::Ready(classifier);
    }

    pub fn start(&mut self) -> bool {
        if !self.is_ready() || self.running {
            return false;
        }
        self.running = true;
        debug!("Gesture detector running ({})", self.config.mode);
        true
    }

    pub fn stop(&mut self) {
        if self.running {
            debug!("Gesture detector stopped");
        }
        self.running = false;
        self.debouncer.reset();
        self.throttle.reset();
    }

    /// Runs one frame through throttle, classifier, reduction and debounce.
    /// `None` when the detector is idle, the frame was throttled, or the
    /// classifier failed on it.
    pub fn process(&mut self, frame: &C::Frame, now: u64) -> Option<Sample> {
        if !self.running {
            return None;
        }
        let DetectorState::Ready(classifier) = &mut self.state else {
            return None;
        };
        if !self.throttle.admit(now) {
            return None;
        }
        let scores = match classifier.classify(frame, now) {
            Ok(scores) => scores,
            Err(err) => {
                debug!("Frame dropped: {}", err);
                return None;
            }
        };
        let score = reduce_scores(self.config.mode, &scores);
        let confirmed = self.debouncer.observe(score, self.threshold, now);
        if confirmed {
            info!(
                "Gesture {} confirmed at {} ns (score {:.2} >= {:.2})",
                self.config.mode, now, score, self.threshold
            );
        }
        Some(Sample {
            score,
            scores,
            confirmed,
            at: now,
        })
    }

    pub fn set_mode(&mut self, mode: GestureMode) {
        self.config.mode = mode;
        self.debouncer.reset();
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold.clamp(0.0, 1.0);
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn mode(&self) -> GestureMode {
        self.config.mode
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, DetectorState::Ready(_))
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn init_error(&self) -> Option<&InitError> {
        match &self.state {
            DetectorState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::testing::{EchoClassifier, FakeFrame, FixedSource};

    const MS: u64 = 1_000_000;

    fn every_frame() -> GestureConfig {
        GestureConfig {
            mode: GestureMode::Mouth,
            threshold: 0.5,
            consecutive_frames: 2,
            dead_time_ms: 300,
            sample_every_n: 1,
            max_fps: 60,
        }
    }

    fn frame(score: f32) -> FakeFrame {
        Some([("jawOpen".to_string(), score)].into_iter().collect())
    }

    fn ready() -> GestureDetector<EchoClassifier> {
        let mut d = GestureDetector::new(every_frame());
        d.attach(EchoClassifier::default());
        assert!(d.start());
        d
    }

    #[test]
    fn idle_detector_never_classifies() {
        let mut d = GestureDetector::<EchoClassifier>::new(every_frame());
        assert!(!d.start());
        assert_eq!(d.process(&frame(0.9), 0), None);

        d.attach(EchoClassifier::default());
        assert_eq!(d.process(&frame(0.9), 0), None);
        assert!(!d.is_running());
    }

    #[test]
    fn confirms_and_locks_out() {
        let mut d = ready();
        let confirmed: Vec<u64> = (0..12)
            .map(|i| i * 34 * MS)
            .filter(|&t| d.process(&frame(0.8), t).is_some_and(|s| s.confirmed))
            .collect();
        // 34 ms confirms, locked until 334; counting restarts at 340.
        assert_eq!(confirmed, vec![34 * MS, 374 * MS]);
    }

    #[test]
    fn classifier_errors_are_swallowed() {
        let mut d = ready();
        assert!(d.process(&frame(0.8), 0).is_some());
        assert_eq!(d.process(&None, 20 * MS), None);
        let sample = d.process(&frame(0.8), 40 * MS).unwrap();
        assert!(sample.confirmed);
    }

    #[test]
    fn stop_resets_counter() {
        let mut d = ready();
        d.process(&frame(0.8), 0);
        d.stop();
        d.start();
        let sample = d.process(&frame(0.8), 20 * MS).unwrap();
        assert!(!sample.confirmed);
    }

    #[test]
    fn failed_initialization_is_terminal() {
        let sources: Vec<Box<dyn ModelSource<EchoClassifier>>> =
            vec![Box::new(FixedSource { name: "bad", ok: false })];
        let mut d = GestureDetector::new(every_frame());
        assert!(pollster::block_on(d.initialize(&sources)).is_err());
        assert!(d.init_error().is_some());
        assert!(!d.start());
        assert!(!d.is_running());

        let sources: Vec<Box<dyn ModelSource<EchoClassifier>>> =
            vec![Box::new(FixedSource { name: "good", ok: true })];
        assert_eq!(pollster::block_on(d.initialize(&sources)), Ok("good".to_string()));
        assert!(d.start());
    }
}
