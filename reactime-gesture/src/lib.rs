//! Gesture signal pipeline: turns per-frame classifier scores into single
//! debounced "gesture confirmed" events and calibrates the detection
//! threshold to the current user.

pub mod calibration;
pub mod camera;
pub mod classifier;
pub mod config;
pub mod debounce;
pub mod detector;
pub mod error;
pub mod reduce;
pub mod threshold;

pub use calibration::{Calibrator, compute_threshold};
pub use camera::{CameraSession, GestureEvent, PipelineStatus};
pub use classifier::{Classifier, FrameSource, LoadFuture, ModelSource, load_first};
pub use config::{CALIBRATION_WINDOW_MS, CalibrationConstants, DEFAULT_BASELINE, GestureConfig};
pub use debounce::{Debouncer, Throttle};
pub use detector::{GestureDetector, Sample};
pub use error::{ClassifierError, InitError};
pub use reduce::reduce_scores;
pub use threshold::ThresholdStore;
