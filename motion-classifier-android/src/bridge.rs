use crate::error::{BridgeError, JResult};
use crossbeam::channel::{bounded, Receiver};
use motion_classifier::{
    ChannelSink, ClassificationEvent, ClassifierConfig, ClassifierSnapshot, ControlCommand,
    MotionClassifier, Sample,
};

/// Events held for Kotlin between polls. Older undelivered events are kept,
/// newer ones are dropped once this fills.
pub const EVENT_BUFFER: usize = 64;

/// One classifier plus the receiving end of its event channel
pub struct Bridge {
    classifier: MotionClassifier<ChannelSink>,
    events: Receiver<ClassificationEvent>,
}

impl Bridge {
    pub fn new(config: ClassifierConfig) -> JResult<Self> {
        let (tx, rx) = bounded(EVENT_BUFFER);
        let classifier = MotionClassifier::with_config(config, ChannelSink::new(tx))?;
        Ok(Bridge {
            classifier,
            events: rx,
        })
    }

    pub fn command(&mut self, command: ControlCommand) {
        if command == ControlCommand::Start {
            // events from a previous run are stale
            let stale = self.events.try_iter().count();
            if stale > 0 {
                log::debug!("discarding {} undelivered events", stale);
            }
        }
        self.classifier.handle_command(command);
    }

    pub fn command_str(&mut self, name: &str) -> JResult<()> {
        let command: ControlCommand = name.parse()?;
        self.command(command);
        Ok(())
    }

    pub fn push_sample(&mut self, sample: Sample) {
        self.classifier.push_sample(&sample);
    }

    /// Drain pending events as a JSON array
    pub fn poll_events_json(&mut self) -> JResult<String> {
        let pending: Vec<ClassificationEvent> = self.events.try_iter().collect();
        serde_json::to_string(&pending)
            .map_err(|e| BridgeError::Internal(format!("event serialization failed: {}", e)))
    }

    pub fn step_count(&self) -> u64 {
        self.classifier.step_count()
    }

    pub fn snapshot(&self) -> ClassifierSnapshot {
        self.classifier.snapshot()
    }

    pub fn snapshot_json(&self) -> JResult<String> {
        serde_json::to_string(&self.snapshot())
            .map_err(|e| BridgeError::Internal(format!("snapshot serialization failed: {}", e)))
    }
}
