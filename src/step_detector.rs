/// Counts steps as upward crossings of a fixed magnitude threshold.
///
/// Works on the raw per-sample magnitude, not the smoothed average, so a
/// step registers on the sample that crosses. A sustained peak counts once.
pub struct StepDetector {
    threshold: f64,
    last_magnitude: f64,
    step_count: u64,
}

impl StepDetector {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            last_magnitude: 0.0,
            step_count: 0,
        }
    }

    /// Feed one raw magnitude. Returns true when it completes a rising edge.
    pub fn observe(&mut self, magnitude: f64) -> bool {
        let stepped = magnitude > self.threshold && self.last_magnitude <= self.threshold;
        if stepped {
            self.step_count += 1;
        }
        self.last_magnitude = magnitude;
        stepped
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn last_magnitude(&self) -> f64 {
        self.last_magnitude
    }

    /// Zero the count, keep edge state
    pub fn reset_count(&mut self) {
        self.step_count = 0;
    }

    pub fn reset(&mut self) {
        self.step_count = 0;
        self.last_magnitude = 0.0;
    }
}
