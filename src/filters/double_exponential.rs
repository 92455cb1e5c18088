use nalgebra::Vector3;

use super::SignalFilter;

/// Trend-corrected (Holt) double exponential smoothing
///
/// Keeps a level `s` and a trend `d`:
///
/// ```text
/// s_t = alpha * x_t + (1 - alpha) * (s_{t-1} + d_{t-1})
/// d_t = beta * (s_t - s_{t-1}) + (1 - beta) * d_{t-1}
/// ```
///
/// The output is the level. Extrapolating the trend removes most of the lag a
/// single exponential filter shows under sustained motion.
pub struct DoubleExponentialFilter {
    alpha: f64,
    beta: f64,
    state: Option<HoltState>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct HoltState {
    level: Vector3<f64>,
    trend: Vector3<f64>,
}

impl DoubleExponentialFilter {
    /// Create a new double exponential filter
    ///
    /// # Panics
    ///
    /// Panics if alpha is not in (0, 1] or beta is not in [0, 1]
    #[must_use]
    pub fn new(alpha: f64, beta: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        assert!((0.0..=1.0).contains(&beta), "Beta must be in [0, 1]");
        Self {
            alpha,
            beta,
            state: None,
        }
    }

    /// Current trend estimate, zero before the first sample
    #[must_use]
    pub fn trend(&self) -> Vector3<f64> {
        self.state.map_or_else(Vector3::zeros, |s| s.trend)
    }
}

impl SignalFilter for DoubleExponentialFilter {
    fn apply(&mut self, sample: Vector3<f64>) -> Vector3<f64> {
        let Some(prev) = self.state else {
            self.state = Some(HoltState {
                level: sample,
                trend: Vector3::zeros(),
            });
            return sample;
        };

        let level = sample * self.alpha + (prev.level + prev.trend) * (1.0 - self.alpha);
        let trend = (level - prev.level) * self.beta + prev.trend * (1.0 - self.beta);
        self.state = Some(HoltState { level, trend });
        level
    }

    fn reset(&mut self) {
        self.state = None;
    }

    fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    fn name(&self) -> &str {
        "DoubleExponentialFilter"
    }
}
