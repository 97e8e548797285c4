use crate::activity::{ActivityBands, ActivityHysteresis, ActivityType};
use crate::config::ClassifierConfig;
use crate::emitter::{ClassificationEvent, EmissionThrottle, EventSink, NullSink};
use crate::error::{ClassifierError, Result};
use crate::sample::Sample;
use crate::step_detector::StepDetector;
use crate::window::MagnitudeWindow;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Control state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlState {
    /// Before the first start, or after stop. Samples are ignored.
    Idle,
    /// Consuming samples
    Running,
}

/// Commands accepted on the control channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Start,
    Stop,
    Reset,
}

impl FromStr for ControlCommand {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(ControlCommand::Start),
            "stop" => Ok(ControlCommand::Stop),
            "reset" => Ok(ControlCommand::Reset),
            other => Err(ClassifierError::UnknownCommand(other.to_string())),
        }
    }
}

/// Counters since the last start
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierStats {
    pub samples_consumed: u64,
    pub events_emitted: u64,
    pub events_dropped: u64,
}

/// Point-in-time view of the classifier, available in any control state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierSnapshot {
    pub state: ControlState,
    pub started_at: Option<String>,
    pub step_count: u64,
    pub activity: ActivityType,
    pub candidate: ActivityType,
    pub confidence: u32,
    pub window_len: usize,
    pub smoothed_average: f64,
    pub last_magnitude: f64,
    pub stats: ClassifierStats,
}

/// Streaming step counter and activity classifier.
///
/// Each pushed sample runs to completion: window update, step-edge
/// detection on the raw magnitude, classification of the smoothed average,
/// then the throttled emission. All mutation goes through `&mut self`, so
/// one instance is one stream.
pub struct MotionClassifier<S: EventSink = NullSink> {
    config: ClassifierConfig,
    state: ControlState,
    window: MagnitudeWindow,
    steps: StepDetector,
    bands: ActivityBands,
    hysteresis: ActivityHysteresis,
    throttle: EmissionThrottle,
    smoothed_average: f64,
    started_at: Option<String>,
    stats: ClassifierStats,
    sink: S,
}

impl MotionClassifier<NullSink> {
    /// Classifier with default tuning and no event listener
    pub fn new() -> Self {
        Self::build(ClassifierConfig::default(), NullSink)
    }
}

impl Default for MotionClassifier<NullSink> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSink> MotionClassifier<S> {
    /// Create an idle classifier delivering events to `sink`.
    pub fn with_config(config: ClassifierConfig, sink: S) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, sink))
    }

    fn build(config: ClassifierConfig, sink: S) -> Self {
        MotionClassifier {
            window: MagnitudeWindow::new(config.window_capacity),
            steps: StepDetector::new(config.step_threshold),
            bands: ActivityBands {
                walking_threshold: config.walking_threshold,
                running_threshold: config.running_threshold,
            },
            hysteresis: ActivityHysteresis::new(config.required_confidence),
            throttle: EmissionThrottle::new(config.emit_interval),
            state: ControlState::Idle,
            smoothed_average: 0.0,
            started_at: None,
            stats: ClassifierStats::default(),
            config,
            sink,
        }
    }

    /// Idle|Running → Running, with all stream state zeroed
    pub fn start(&mut self) {
        self.window.clear();
        self.steps.reset();
        self.hysteresis.reset();
        self.throttle.reset();
        self.smoothed_average = 0.0;
        self.stats = ClassifierStats::default();
        self.started_at = Some(Utc::now().to_rfc3339());
        self.state = ControlState::Running;
        log::info!("motion classifier started");
    }

    /// Running → Idle. State stays frozen and inspectable.
    pub fn stop(&mut self) {
        if self.state == ControlState::Running {
            log::info!(
                "motion classifier stopped: {} steps, {} samples, {} events",
                self.steps.step_count(),
                self.stats.samples_consumed,
                self.stats.events_emitted
            );
        }
        self.state = ControlState::Idle;
    }

    /// Zero the step count. Window and activity state are untouched.
    pub fn reset(&mut self) {
        self.steps.reset_count();
        log::info!("step count reset");
    }

    pub fn handle_command(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::Start => self.start(),
            ControlCommand::Stop => self.stop(),
            ControlCommand::Reset => self.reset(),
        }
    }

    /// Consume one sample. Returns the event when this sample completed an
    /// emission batch; the same event has already been offered to the sink.
    pub fn push_sample(&mut self, sample: &Sample) -> Option<ClassificationEvent> {
        if self.state != ControlState::Running {
            log::trace!("ignoring sample at {} while idle", sample.timestamp);
            return None;
        }

        let magnitude = sample.magnitude();
        let avg = self.window.push(magnitude);
        self.smoothed_average = avg;

        self.steps.observe(magnitude);

        let candidate = self.bands.classify(avg);
        let published = self.hysteresis.evaluate(candidate);

        self.stats.samples_consumed += 1;

        if !self.throttle.tick() {
            return None;
        }

        let event = ClassificationEvent {
            step_count: self.steps.step_count(),
            activity_type: published,
            magnitude: avg,
        };
        log::trace!(
            "emit steps={} activity={} magnitude={:.3}",
            event.step_count,
            event.activity_type,
            event.magnitude
        );

        self.stats.events_emitted += 1;
        if !self.sink.deliver(&event) {
            self.stats.events_dropped += 1;
        }
        Some(event)
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ControlState::Running
    }

    pub fn step_count(&self) -> u64 {
        self.steps.step_count()
    }

    pub fn activity(&self) -> ActivityType {
        self.hysteresis.published()
    }

    pub fn confidence(&self) -> u32 {
        self.hysteresis.confidence()
    }

    pub fn window(&self) -> &MagnitudeWindow {
        &self.window
    }

    pub fn smoothed_average(&self) -> f64 {
        self.smoothed_average
    }

    pub fn stats(&self) -> ClassifierStats {
        self.stats
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn snapshot(&self) -> ClassifierSnapshot {
        ClassifierSnapshot {
            state: self.state,
            started_at: self.started_at.clone(),
            step_count: self.steps.step_count(),
            activity: self.hysteresis.published(),
            candidate: self.hysteresis.last_candidate(),
            confidence: self.hysteresis.confidence(),
            window_len: self.window.len(),
            smoothed_average: self.smoothed_average,
            last_magnitude: self.steps.last_magnitude(),
            stats: self.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Sample whose magnitude is exactly `m` (all of it on the z axis)
    fn mag(m: f64) -> Sample {
        Sample::new(0.0, 0.0, m, 0.0)
    }

    fn collecting() -> MotionClassifier<Vec<ClassificationEvent>> {
        MotionClassifier::with_config(ClassifierConfig::default(), Vec::new()).unwrap()
    }

    #[test]
    fn test_idle_until_started() {
        let mut classifier = collecting();
        assert_eq!(classifier.state(), ControlState::Idle);

        for _ in 0..10 {
            assert!(classifier.push_sample(&mag(20.0)).is_none());
        }
        assert_eq!(classifier.step_count(), 0);
        assert!(classifier.window().is_empty());
        assert!(classifier.sink().is_empty());
        assert_eq!(classifier.stats().samples_consumed, 0);
    }

    #[test]
    fn test_step_edges_through_pipeline() {
        let mut classifier = collecting();
        classifier.start();
        for m in [9.0, 9.0, 9.0, 15.0, 9.0, 15.0, 9.0] {
            classifier.push_sample(&mag(m));
        }
        assert_eq!(classifier.step_count(), 2);
    }

    #[test]
    fn test_emits_once_per_five_samples() {
        let mut classifier = collecting();
        classifier.start();

        for i in 1..=23 {
            let emitted = classifier.push_sample(&mag(9.81));
            assert_eq!(emitted.is_some(), i % 5 == 0, "sample {}", i);
        }
        assert_eq!(classifier.sink().len(), 4);
        assert_eq!(classifier.stats().events_emitted, 4);
        assert_eq!(classifier.stats().events_dropped, 0);
    }

    #[test]
    fn test_event_carries_smoothed_average_and_published_label() {
        let mut classifier = collecting();
        classifier.start();
        for m in [10.0, 12.0, 14.0, 10.0, 9.0] {
            classifier.push_sample(&mag(m));
        }

        let event = &classifier.sink()[0];
        assert_relative_eq!(event.magnitude, 11.0);
        // walking candidate for four evaluations, confidence only reached 3
        assert_eq!(event.activity_type, ActivityType::Stationary);
        assert_eq!(event.step_count, 0);
    }

    #[test]
    fn test_walking_published_after_confidence_builds() {
        let mut classifier = collecting();
        classifier.start();

        // avg of a window filled with 11.5 stays at 11.5: walking every time
        for _ in 0..5 {
            classifier.push_sample(&mag(11.5));
            assert_eq!(classifier.activity(), ActivityType::Stationary);
        }
        assert_eq!(classifier.confidence(), 4);

        classifier.push_sample(&mag(11.5));
        assert_eq!(classifier.activity(), ActivityType::Walking);
    }

    #[test]
    fn test_reset_only_zeroes_steps() {
        let mut classifier = collecting();
        classifier.start();
        for m in [9.0, 15.0, 9.0, 15.0, 11.5, 11.5, 11.5] {
            classifier.push_sample(&mag(m));
        }
        let before = classifier.snapshot();
        assert_eq!(before.step_count, 2);

        classifier.reset();
        let after = classifier.snapshot();

        assert_eq!(after.step_count, 0);
        assert_eq!(after.state, ControlState::Running);
        assert_eq!(after.activity, before.activity);
        assert_eq!(after.candidate, before.candidate);
        assert_eq!(after.confidence, before.confidence);
        assert_eq!(after.window_len, before.window_len);
        assert_eq!(after.smoothed_average, before.smoothed_average);
        assert_eq!(after.last_magnitude, before.last_magnitude);
    }

    #[test]
    fn test_reset_while_idle() {
        let mut classifier = collecting();
        classifier.start();
        classifier.push_sample(&mag(15.0));
        classifier.stop();

        classifier.reset();
        assert_eq!(classifier.step_count(), 0);
        assert_eq!(classifier.state(), ControlState::Idle);
    }

    #[test]
    fn test_stop_freezes_state() {
        let mut classifier = collecting();
        classifier.start();
        for m in [9.0, 15.0, 9.0] {
            classifier.push_sample(&mag(m));
        }
        classifier.stop();
        let frozen = classifier.snapshot();

        for m in [15.0, 9.0, 15.0, 9.0, 15.0, 9.0, 15.0] {
            assert!(classifier.push_sample(&mag(m)).is_none());
        }
        assert_eq!(classifier.snapshot(), frozen);
        assert!(classifier.sink().is_empty());
    }

    #[test]
    fn test_stop_truncates_partial_batch() {
        let mut classifier = collecting();
        classifier.start();
        for _ in 0..3 {
            classifier.push_sample(&mag(9.81));
        }
        classifier.stop();
        classifier.start();

        // a restart begins a fresh batch
        for _ in 0..4 {
            assert!(classifier.push_sample(&mag(9.81)).is_none());
        }
        assert!(classifier.push_sample(&mag(9.81)).is_some());
    }

    #[test]
    fn test_start_resets_everything() {
        let mut classifier = collecting();
        classifier.start();
        for _ in 0..12 {
            classifier.push_sample(&mag(16.0));
        }
        assert_eq!(classifier.activity(), ActivityType::Running);

        classifier.start();
        let snapshot = classifier.snapshot();
        assert_eq!(snapshot.state, ControlState::Running);
        assert_eq!(snapshot.step_count, 0);
        assert_eq!(snapshot.activity, ActivityType::Stationary);
        assert_eq!(snapshot.candidate, ActivityType::Stationary);
        assert_eq!(snapshot.confidence, 0);
        assert_eq!(snapshot.window_len, 0);
        assert_eq!(snapshot.last_magnitude, 0.0);
        assert_eq!(snapshot.stats, ClassifierStats::default());
        assert!(snapshot.started_at.is_some());

        // last_magnitude is back at 0, so a high first sample is an edge
        classifier.push_sample(&mag(16.0));
        assert_eq!(classifier.step_count(), 1);
    }

    #[test]
    fn test_window_bounded_through_pipeline() {
        let mut classifier = collecting();
        classifier.start();
        for i in 0..50 {
            classifier.push_sample(&mag(i as f64));
            assert!(classifier.window().len() <= 15);
        }
        let tail: Vec<f64> = classifier.window().iter().copied().collect();
        assert_eq!(tail.first().copied(), Some(35.0));
        assert_eq!(tail.last().copied(), Some(49.0));
    }

    #[test]
    fn test_null_sink_counts_drops() {
        let mut classifier = MotionClassifier::new();
        classifier.start();
        for _ in 0..10 {
            classifier.push_sample(&mag(9.81));
        }
        let stats = classifier.stats();
        assert_eq!(stats.events_emitted, 2);
        assert_eq!(stats.events_dropped, 2);
    }

    #[test]
    fn test_independent_instances() {
        let mut a = collecting();
        let mut b = collecting();
        a.start();
        b.start();
        a.push_sample(&mag(15.0));
        assert_eq!(a.step_count(), 1);
        assert_eq!(b.step_count(), 0);
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!("start".parse::<ControlCommand>().unwrap(), ControlCommand::Start);
        assert_eq!(" STOP ".parse::<ControlCommand>().unwrap(), ControlCommand::Stop);
        assert_eq!("Reset".parse::<ControlCommand>().unwrap(), ControlCommand::Reset);
        assert!(matches!(
            "pause".parse::<ControlCommand>(),
            Err(ClassifierError::UnknownCommand(_))
        ));

        let mut classifier = collecting();
        classifier.handle_command(ControlCommand::Start);
        assert!(classifier.is_running());
        classifier.handle_command(ControlCommand::Stop);
        assert!(!classifier.is_running());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = ClassifierConfig {
            emit_interval: 0,
            ..Default::default()
        };
        assert!(MotionClassifier::with_config(config, NullSink).is_err());
    }

    #[test]
    fn test_oversized_window_is_an_error_not_a_panic() {
        let config = ClassifierConfig {
            window_capacity: usize::MAX,
            ..Default::default()
        };
        let result = MotionClassifier::with_config(config, Vec::<ClassificationEvent>::new());
        assert!(matches!(result, Err(ClassifierError::InvalidConfig(_))));
    }
}
