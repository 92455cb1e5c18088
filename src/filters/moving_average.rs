use std::collections::VecDeque;

use nalgebra::Vector3;

use super::SignalFilter;

/// Moving average filter over the last `window_size` samples
pub struct MovingAverageFilter {
    window_size: usize,
    buffer: VecDeque<Vector3<f64>>,
}

impl MovingAverageFilter {
    /// Create a new moving average filter
    ///
    /// # Panics
    ///
    /// Panics if `window_size` is 0
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "Window size must be greater than 0");
        Self {
            window_size,
            buffer: VecDeque::with_capacity(window_size),
        }
    }

    /// Configured window size
    #[must_use]
    pub const fn window_size(&self) -> usize {
        self.window_size
    }

    /// Number of samples currently buffered
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether no sample has been buffered yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl SignalFilter for MovingAverageFilter {
    #[allow(clippy::cast_precision_loss)]
    fn apply(&mut self, sample: Vector3<f64>) -> Vector3<f64> {
        self.buffer.push_back(sample);
        if self.buffer.len() > self.window_size {
            self.buffer.pop_front();
        }

        let sum: Vector3<f64> = self.buffer.iter().sum();
        sum / self.buffer.len() as f64
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }

    fn is_initialized(&self) -> bool {
        !self.buffer.is_empty()
    }

    fn name(&self) -> &str {
        "MovingAverageFilter"
    }
}
