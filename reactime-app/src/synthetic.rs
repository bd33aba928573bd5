//! Keyboard-driven stand-in for a camera and face classifier. Holding a key
//! plays the role of the face making the gesture.

use reactime_core::Scores;
use reactime_gesture::{Classifier, ClassifierError, FrameSource, LoadFuture, ModelSource};
use std::cell::Cell;
use std::rc::Rc;

const RESTING: f32 = 0.06;
const ACTIVE: f32 = 0.85;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaceFrame {
    pub mouth_open: bool,
    pub eyes_closed: bool,
}

/// Shared face state. The window writes key state, the pipeline reads frames.
#[derive(Debug, Clone)]
pub struct KeyboardFace {
    face: Rc<Cell<FaceFrame>>,
    playing: Rc<Cell<bool>>,
}

impl KeyboardFace {
    pub fn new() -> Self {
        Self {
            face: Rc::new(Cell::new(FaceFrame::default())),
            playing: Rc::new(Cell::new(true)),
        }
    }

    pub fn set_mouth_open(&self, open: bool) {
        let mut face = self.face.get();
        face.mouth_open = open;
        self.face.set(face);
    }

    pub fn set_eyes_closed(&self, closed: bool) {
        let mut face = self.face.get();
        face.eyes_closed = closed;
        self.face.set(face);
    }

    /// Simulates starting or stopping the camera.
    pub fn toggle_playing(&self) -> bool {
        let playing = !self.playing.get();
        self.playing.set(playing);
        playing
    }
}

impl FrameSource for KeyboardFace {
    type Frame = FaceFrame;

    fn playing(&self) -> bool {
        self.playing.get()
    }

    fn frame(&mut self) -> Option<FaceFrame> {
        self.playing.get().then(|| self.face.get())
    }
}

#[derive(Debug, Default)]
pub struct SyntheticClassifier;

impl Classifier for SyntheticClassifier {
    type Frame = FaceFrame;

    fn classify(&mut self, frame: &FaceFrame, _at: u64) -> Result<Scores, ClassifierError> {
        let level = |on: bool| if on { ACTIVE } else { RESTING };
        Ok([
            ("jawOpen".to_string(), level(frame.mouth_open)),
            ("eyeBlinkLeft".to_string(), level(frame.eyes_closed)),
            ("eyeBlinkRight".to_string(), level(frame.eyes_closed)),
        ]
        .into_iter()
        .collect())
    }
}

pub struct SyntheticModel;

impl ModelSource<SyntheticClassifier> for SyntheticModel {
    fn describe(&self) -> String {
        "synthetic keyboard face".to_string()
    }

    fn load(&self) -> LoadFuture<'_, SyntheticClassifier> {
        Box::pin(async { Ok(SyntheticClassifier) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reactime_core::GestureMode;
    use reactime_gesture::reduce_scores;

    #[test]
    fn held_keys_raise_scores() {
        let mut face = KeyboardFace::new();
        let mut classifier = SyntheticClassifier;

        let frame = face.frame().unwrap();
        let scores = classifier.classify(&frame, 0).unwrap();
        assert_eq!(reduce_scores(GestureMode::Mouth, &scores), RESTING);

        face.set_mouth_open(true);
        let scores = classifier.classify(&face.frame().unwrap(), 0).unwrap();
        assert_eq!(reduce_scores(GestureMode::Mouth, &scores), ACTIVE);
        assert_eq!(reduce_scores(GestureMode::Blink, &scores), RESTING);
    }

    #[test]
    fn stopped_camera_yields_no_frames() {
        let mut face = KeyboardFace::new();
        assert!(!face.toggle_playing());
        assert!(!face.playing());
        assert_eq!(face.frame(), None);
    }
}
