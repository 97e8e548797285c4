use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse activity label derived from the smoothed magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Stationary,
    Walking,
    Running,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Stationary => "stationary",
            ActivityType::Walking => "walking",
            ActivityType::Running => "running",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Magnitude bands mapping a smoothed average to a candidate label.
#[derive(Debug, Clone, Copy)]
pub struct ActivityBands {
    pub walking_threshold: f64,
    pub running_threshold: f64,
}

impl ActivityBands {
    pub fn classify(&self, avg: f64) -> ActivityType {
        if avg < self.walking_threshold {
            ActivityType::Stationary
        } else if avg < self.running_threshold {
            ActivityType::Walking
        } else {
            ActivityType::Running
        }
    }
}

/// Debounce over the candidate label.
///
/// Every evaluation compares the new candidate with the previous one. A match
/// raises confidence, a mismatch drops it to zero. The published label only
/// follows the candidate once confidence reaches `required`; until then the
/// last published label stands.
#[derive(Debug, Clone)]
pub struct ActivityHysteresis {
    published: ActivityType,
    last_candidate: ActivityType,
    confidence: u32,
    required: u32,
}

impl ActivityHysteresis {
    pub fn new(required: u32) -> Self {
        Self {
            published: ActivityType::Stationary,
            last_candidate: ActivityType::Stationary,
            confidence: 0,
            required,
        }
    }

    /// Run one evaluation and return the published label afterwards.
    pub fn evaluate(&mut self, candidate: ActivityType) -> ActivityType {
        if candidate == self.last_candidate {
            // saturate so a long steady stretch cannot overflow
            self.confidence = (self.confidence + 1).min(self.required);
        } else {
            self.confidence = 0;
        }
        self.last_candidate = candidate;

        if self.confidence >= self.required && self.published != candidate {
            log::debug!(
                "activity {} -> {} (confidence {})",
                self.published,
                candidate,
                self.confidence
            );
            self.published = candidate;
        }

        self.published
    }

    pub fn published(&self) -> ActivityType {
        self.published
    }

    pub fn last_candidate(&self) -> ActivityType {
        self.last_candidate
    }

    pub fn confidence(&self) -> u32 {
        self.confidence
    }

    pub fn reset(&mut self) {
        self.published = ActivityType::Stationary;
        self.last_candidate = ActivityType::Stationary;
        self.confidence = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bands() -> ActivityBands {
        ActivityBands {
            walking_threshold: 10.8,
            running_threshold: 14.0,
        }
    }

    #[test]
    fn test_band_edges() {
        let bands = bands();
        assert_eq!(bands.classify(9.81), ActivityType::Stationary);
        assert_eq!(bands.classify(10.79), ActivityType::Stationary);
        assert_eq!(bands.classify(10.8), ActivityType::Walking);
        assert_eq!(bands.classify(11.5), ActivityType::Walking);
        assert_eq!(bands.classify(13.99), ActivityType::Walking);
        assert_eq!(bands.classify(14.0), ActivityType::Running);
        assert_eq!(bands.classify(22.0), ActivityType::Running);
    }

    #[test]
    fn test_initial_state() {
        let hysteresis = ActivityHysteresis::new(5);
        assert_eq!(hysteresis.published(), ActivityType::Stationary);
        assert_eq!(hysteresis.last_candidate(), ActivityType::Stationary);
        assert_eq!(hysteresis.confidence(), 0);
    }

    #[test]
    fn test_flip_happens_when_confidence_reaches_required() {
        let mut hysteresis = ActivityHysteresis::new(5);

        // first walking evaluation is a candidate change, confidence restarts at 0
        for expected_confidence in 0..5 {
            let published = hysteresis.evaluate(ActivityType::Walking);
            assert_eq!(published, ActivityType::Stationary);
            assert_eq!(hysteresis.confidence(), expected_confidence);
        }

        // confidence sits at 4; the next match reaches 5 and publishes
        assert_eq!(hysteresis.evaluate(ActivityType::Walking), ActivityType::Walking);
        assert_eq!(hysteresis.confidence(), 5);
    }

    #[test]
    fn test_alternating_candidates_never_publish() {
        let mut hysteresis = ActivityHysteresis::new(5);
        for i in 0..100 {
            let candidate = if i % 2 == 0 {
                ActivityType::Walking
            } else {
                ActivityType::Running
            };
            assert_eq!(hysteresis.evaluate(candidate), ActivityType::Stationary);
            assert_eq!(hysteresis.confidence(), 0);
        }
    }

    #[test]
    fn test_single_spike_does_not_flip() {
        let mut hysteresis = ActivityHysteresis::new(5);
        for _ in 0..10 {
            hysteresis.evaluate(ActivityType::Stationary);
        }
        assert_eq!(hysteresis.evaluate(ActivityType::Running), ActivityType::Stationary);
        assert_eq!(hysteresis.evaluate(ActivityType::Stationary), ActivityType::Stationary);
        assert_eq!(hysteresis.confidence(), 0);
    }

    #[test]
    fn test_confidence_saturates() {
        let mut hysteresis = ActivityHysteresis::new(5);
        for _ in 0..1_000 {
            hysteresis.evaluate(ActivityType::Stationary);
        }
        assert_eq!(hysteresis.confidence(), 5);
    }

    #[test]
    fn test_interrupted_streak_starts_over() {
        let mut hysteresis = ActivityHysteresis::new(5);
        for _ in 0..4 {
            hysteresis.evaluate(ActivityType::Running);
        }
        hysteresis.evaluate(ActivityType::Walking);
        for _ in 0..5 {
            assert_eq!(hysteresis.evaluate(ActivityType::Running), ActivityType::Stationary);
        }
        assert_eq!(hysteresis.evaluate(ActivityType::Running), ActivityType::Running);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&ActivityType::Running).unwrap();
        assert_eq!(json, "\"running\"");
        let parsed: ActivityType = serde_json::from_str("\"walking\"").unwrap();
        assert_eq!(parsed, ActivityType::Walking);
    }
}
