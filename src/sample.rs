use serde::{Deserialize, Serialize};

/// Accelerometer sample as delivered by the platform sensor feed.
///
/// Units are whatever the device reports (m/s² on Android); the classifier
/// thresholds assume gravity reads roughly 9.8 at rest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub timestamp: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64, z: f64, timestamp: f64) -> Self {
        Self { x, y, z, timestamp }
    }

    /// Euclidean norm of the three axes.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}
