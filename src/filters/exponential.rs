use nalgebra::Vector3;

use super::SignalFilter;

/// Single exponential smoothing filter
pub struct ExponentialFilter {
    alpha: f64,
    last: Option<Vector3<f64>>,
}

impl ExponentialFilter {
    /// Create a new exponential filter
    ///
    /// # Panics
    ///
    /// Panics if alpha is not in the range (0, 1]
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self { alpha, last: None }
    }

    /// Last output, if any sample has been seen
    #[must_use]
    pub const fn last(&self) -> Option<Vector3<f64>> {
        self.last
    }
}

impl SignalFilter for ExponentialFilter {
    fn apply(&mut self, sample: Vector3<f64>) -> Vector3<f64> {
        let filtered = match self.last {
            Some(last) => sample * self.alpha + last * (1.0 - self.alpha),
            None => sample,
        };
        self.last = Some(filtered);
        filtered
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn is_initialized(&self) -> bool {
        self.last.is_some()
    }

    fn name(&self) -> &str {
        "ExponentialFilter"
    }
}
