// Motion Classifier
// Streaming step counter and activity classifier for tri-axial accelerometer data

pub mod activity;
pub mod classifier;
pub mod config;
pub mod emitter;
pub mod error;
pub mod replay;
pub mod sample;
pub mod sensors;
pub mod step_detector;
pub mod window;

pub use activity::{ActivityBands, ActivityHysteresis, ActivityType};
pub use classifier::{
    ClassifierSnapshot, ClassifierStats, ControlCommand, ControlState, MotionClassifier,
};
pub use config::ClassifierConfig;
pub use emitter::{ChannelSink, ClassificationEvent, EmissionThrottle, EventSink, NullSink};
pub use error::{ClassifierError, Result};
pub use sample::Sample;
pub use step_detector::StepDetector;
pub use window::MagnitudeWindow;
