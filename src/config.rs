use crate::error::{ClassifierError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Largest accepted smoothing window
pub const MAX_WINDOW_CAPACITY: usize = 4096;
/// Largest accepted repetition count for publishing a label
pub const MAX_REQUIRED_CONFIDENCE: u32 = 10_000;
/// Largest accepted samples-per-event ratio
pub const MAX_EMIT_INTERVAL: u32 = 10_000;

/// Tuning constants for the motion classifier.
///
/// Missing fields fall back to the defaults, so a config file only needs to
/// name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Number of magnitudes kept for the smoothed average
    pub window_capacity: usize,
    /// Raw magnitude a sample must rise above to count a step
    pub step_threshold: f64,
    /// Smoothed average at or above which the candidate is walking
    pub walking_threshold: f64,
    /// Smoothed average at or above which the candidate is running
    pub running_threshold: f64,
    /// Repeated identical candidates needed before the label is published
    pub required_confidence: u32,
    /// Consumed samples per emitted event
    pub emit_interval: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            window_capacity: 15,
            step_threshold: 14.0,
            walking_threshold: 10.8,
            running_threshold: 14.0,
            required_confidence: 5,
            emit_interval: 5,
        }
    }
}

impl ClassifierConfig {
    /// Load a config from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: ClassifierConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_capacity == 0 {
            return Err(ClassifierError::InvalidConfig(
                "window_capacity must be at least 1".to_string(),
            ));
        }
        if self.window_capacity > MAX_WINDOW_CAPACITY {
            return Err(ClassifierError::InvalidConfig(format!(
                "window_capacity must be at most {}, got {}",
                MAX_WINDOW_CAPACITY, self.window_capacity
            )));
        }
        if self.emit_interval == 0 {
            return Err(ClassifierError::InvalidConfig(
                "emit_interval must be at least 1".to_string(),
            ));
        }
        if self.emit_interval > MAX_EMIT_INTERVAL {
            return Err(ClassifierError::InvalidConfig(format!(
                "emit_interval must be at most {}, got {}",
                MAX_EMIT_INTERVAL, self.emit_interval
            )));
        }
        if self.required_confidence > MAX_REQUIRED_CONFIDENCE {
            return Err(ClassifierError::InvalidConfig(format!(
                "required_confidence must be at most {}, got {}",
                MAX_REQUIRED_CONFIDENCE, self.required_confidence
            )));
        }

        let thresholds = [
            ("step_threshold", self.step_threshold),
            ("walking_threshold", self.walking_threshold),
            ("running_threshold", self.running_threshold),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() {
                return Err(ClassifierError::InvalidConfig(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }

        if self.walking_threshold >= self.running_threshold {
            return Err(ClassifierError::InvalidConfig(format!(
                "walking_threshold ({}) must be below running_threshold ({})",
                self.walking_threshold, self.running_threshold
            )));
        }

        Ok(())
    }
}
