use std::collections::VecDeque;

/// Upper bound on the up-front allocation; larger windows grow on demand
const PREALLOCATE_LIMIT: usize = 256;

/// Fixed-capacity FIFO of accelerometer magnitudes with a running mean.
pub struct MagnitudeWindow {
    window: VecDeque<f64>,
    capacity: usize,
}

impl MagnitudeWindow {
    /// Create an empty window holding at most `capacity` magnitudes
    pub fn new(capacity: usize) -> Self {
        MagnitudeWindow {
            window: VecDeque::with_capacity(capacity.min(PREALLOCATE_LIMIT)),
            capacity,
        }
    }

    /// Append a magnitude, evicting the oldest entries past capacity.
    /// Returns the mean of the window after the push.
    pub fn push(&mut self, magnitude: f64) -> f64 {
        self.window.push_back(magnitude);
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }
        self.mean()
    }

    /// Arithmetic mean of the current contents (0.0 when empty)
    pub fn mean(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window.iter().sum::<f64>() / self.window.len() as f64
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Magnitudes oldest first
    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.window.iter()
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}
