//! Binds the trial session to the gesture pipeline: the session's `Go`
//! stage arms the camera, and each confirmed gesture becomes one response.

use rand::Rng;
use reactime_core::Stage;
use reactime_gesture::{CameraSession, Classifier, FrameSource, GestureEvent};
use reactime_session::{ReactionSession, ResponseOutcome, SessionEvent};
use reactime_timing::Timer;
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct Tick {
    pub session: Vec<SessionEvent>,
    pub gesture: Vec<GestureEvent>,
}

pub struct Driver<C, F, T, R>
where
    C: Classifier,
    F: FrameSource<Frame = C::Frame>,
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    pub session: ReactionSession<T, R>,
    pub camera: Option<CameraSession<C, F, T>>,
    calibration_token: u64,
    start_after_calibration: bool,
    source_playing: bool,
}

impl<C, F, T, R> Driver<C, F, T, R>
where
    C: Classifier,
    F: FrameSource<Frame = C::Frame>,
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    pub fn new(session: ReactionSession<T, R>, camera: Option<CameraSession<C, F, T>>) -> Self {
        let source_playing = camera.as_ref().is_some_and(|c| c.source.playing());
        Self {
            session,
            camera,
            calibration_token: 0,
            start_after_calibration: false,
            source_playing,
        }
    }

    /// Starts the session. With a camera attached the first cue waits for
    /// a calibration pass, unless calibration cannot run right now.
    pub fn begin(&mut self) {
        if self.camera.is_some() {
            if self.recalibrate() {
                self.start_after_calibration = true;
                return;
            }
            warn!("Calibration unavailable, starting with the default threshold");
        }
        self.session.start();
    }

    /// Issues a fresh calibration request. Only honoured between sessions,
    /// since confirmations are withheld while calibrating.
    pub fn recalibrate(&mut self) -> bool {
        if !matches!(self.session.stage(), Stage::Idle | Stage::Done) {
            return false;
        }
        let Some(camera) = &mut self.camera else {
            return false;
        };
        self.calibration_token += 1;
        camera.request_calibration(self.calibration_token)
    }

    pub fn tap(&mut self) -> ResponseOutcome {
        self.session.react()
    }

    pub fn tick(&mut self) -> Tick {
        let mut tick = Tick {
            session: self.session.update(),
            gesture: Vec::new(),
        };
        let Some(camera) = &mut self.camera else {
            return tick;
        };

        let playing = camera.source.playing();
        let resumed = playing && !self.source_playing;
        self.source_playing = playing;

        camera.set_armed(self.session.is_armed());
        tick.gesture = camera.tick();
        for event in &tick.gesture {
            match event {
                GestureEvent::Gesture { at, .. } => {
                    let outcome = self.session.react_at(*at);
                    info!("Gesture response: {:?}", outcome);
                }
                GestureEvent::Calibrated { .. } if self.start_after_calibration => {
                    self.start_after_calibration = false;
                    self.session.start();
                }
                GestureEvent::CalibrationCancelled { .. } if self.start_after_calibration => {
                    warn!("Calibration interrupted, retrying once the camera plays");
                }
                _ => {}
            }
        }
        camera.set_armed(self.session.is_armed());
        if resumed && self.start_after_calibration && self.recalibrate() {
            info!("Camera resumed, calibration restarted");
        }
        tick.session.extend(self.session.update());
        tick
    }

    pub fn teardown(&mut self) {
        self.session.abort();
        if let Some(camera) = &mut self.camera {
            camera.teardown();
        }
    }

    pub fn is_waiting_for_calibration(&self) -> bool {
        self.start_after_calibration
    }
}
