use crate::activity::ActivityType;
use crossbeam::channel::{Sender, TrySendError};
use serde::{Deserialize, Serialize};

/// Outbound classification event, serialized with the field names the
/// platform event stream expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationEvent {
    pub step_count: u64,
    pub activity_type: ActivityType,
    /// Smoothed window average at emission time
    pub magnitude: f64,
}

impl ClassificationEvent {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Destination for classification events.
///
/// Delivery is fire-and-forget: `deliver` reports whether the event was
/// accepted, and the classifier never retries a rejected one.
pub trait EventSink {
    fn deliver(&mut self, event: &ClassificationEvent) -> bool;
}

/// Sink with no listener attached. Every event is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn deliver(&mut self, _event: &ClassificationEvent) -> bool {
        false
    }
}

/// Collects every event, mostly useful for replay and tests
impl EventSink for Vec<ClassificationEvent> {
    fn deliver(&mut self, event: &ClassificationEvent) -> bool {
        self.push(event.clone());
        true
    }
}

/// Forwards events over a crossbeam channel without blocking.
/// A full or disconnected channel drops the event.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<ClassificationEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<ClassificationEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn deliver(&mut self, event: &ClassificationEvent) -> bool {
        match self.tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::debug!("event channel full, dropping event");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                log::debug!("no event listener, dropping event");
                false
            }
        }
    }
}

/// Counts evaluations and fires once every `interval` of them.
#[derive(Debug, Clone)]
pub struct EmissionThrottle {
    interval: u32,
    counter: u32,
}

impl EmissionThrottle {
    pub fn new(interval: u32) -> Self {
        Self {
            interval,
            counter: 0,
        }
    }

    /// Count one evaluation. Returns true when an event is due.
    pub fn tick(&mut self) -> bool {
        self.counter += 1;
        if self.counter >= self.interval {
            self.counter = 0;
            true
        } else {
            false
        }
    }

    pub fn pending(&self) -> u32 {
        self.counter
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }
}
