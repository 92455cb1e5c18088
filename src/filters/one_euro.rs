//! One Euro filter - adaptive low-pass filter for jitter reduction
//!
//! The cutoff frequency rises with the estimated speed of the signal: smooth
//! when the head is nearly still, responsive when it moves quickly.

use std::f64::consts::PI;

use nalgebra::Vector3;

use super::SignalFilter;
use crate::constants::{
    DEFAULT_ONE_EURO_BETA, DEFAULT_ONE_EURO_DERIVATIVE_CUTOFF, DEFAULT_ONE_EURO_MIN_CUTOFF,
};

/// Tunables of the One Euro filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OneEuroParams {
    /// Nominal sampling frequency (Hz)
    pub frequency: f64,
    /// Minimum cutoff frequency (Hz) - lower = smoother at rest
    pub min_cutoff: f64,
    /// Speed coefficient - higher = less lag during fast motion
    pub beta: f64,
    /// Derivative cutoff frequency (Hz)
    pub d_cutoff: f64,
}

impl OneEuroParams {
    /// Default tuning at the given sampling frequency
    #[must_use]
    pub const fn with_frequency(frequency: f64) -> Self {
        Self {
            frequency,
            min_cutoff: DEFAULT_ONE_EURO_MIN_CUTOFF,
            beta: DEFAULT_ONE_EURO_BETA,
            d_cutoff: DEFAULT_ONE_EURO_DERIVATIVE_CUTOFF,
        }
    }
}

/// Smoothing factor for a first-order low-pass at `cutoff` Hz sampled at `frequency` Hz
fn smoothing_factor(frequency: f64, cutoff: f64) -> f64 {
    let te = 1.0 / frequency;
    let tau = 1.0 / (2.0 * PI * cutoff);
    1.0 / (1.0 + tau / te)
}

#[derive(Debug, Clone, Copy, Default)]
struct LowPass {
    last_raw: Option<f64>,
    smoothed: f64,
}

impl LowPass {
    fn filter(&mut self, value: f64, alpha: f64) -> f64 {
        self.smoothed = match self.last_raw {
            Some(_) => alpha.mul_add(value - self.smoothed, self.smoothed),
            None => value,
        };
        self.last_raw = Some(value);
        self.smoothed
    }
}

/// One Euro state for a single scalar channel
#[derive(Debug, Clone, Copy, Default)]
struct OneEuroAxis {
    value: LowPass,
    derivative: LowPass,
}

impl OneEuroAxis {
    fn filter(&mut self, x: f64, frequency: f64, params: &OneEuroParams) -> f64 {
        // 1. Estimate derivative (velocity)
        let dx = self.value.last_raw.map_or(0.0, |last| (x - last) * frequency);
        let dx_hat = self
            .derivative
            .filter(dx, smoothing_factor(frequency, params.d_cutoff));

        // 2. Adaptive cutoff: more smoothing when slow, less when fast
        let cutoff = params.beta.mul_add(dx_hat.abs(), params.min_cutoff);

        // 3. Apply filter
        self.value.filter(x, smoothing_factor(frequency, cutoff))
    }
}

/// Component-wise One Euro filter for 3D positions
pub struct OneEuroFilter {
    params: OneEuroParams,
    frequency: f64,
    last_timestamp: Option<f64>,
    axes: [OneEuroAxis; 3],
}

impl OneEuroFilter {
    /// Create a filter with default tuning at the given sampling frequency
    ///
    /// # Panics
    ///
    /// Panics if `frequency` is not positive
    #[must_use]
    pub fn new(frequency: f64) -> Self {
        Self::with_params(OneEuroParams::with_frequency(frequency))
    }

    /// Create a filter with explicit tuning
    ///
    /// # Panics
    ///
    /// Panics if the frequency or either cutoff is not positive, or beta is negative
    #[must_use]
    pub fn with_params(params: OneEuroParams) -> Self {
        assert!(params.frequency > 0.0, "Frequency must be positive");
        assert!(params.min_cutoff > 0.0, "Cutoff frequency must be positive");
        assert!(params.d_cutoff > 0.0, "Cutoff frequency must be positive");
        assert!(params.beta >= 0.0, "Beta must be non-negative");
        Self {
            params,
            frequency: params.frequency,
            last_timestamp: None,
            axes: [OneEuroAxis::default(); 3],
        }
    }

    /// Configured tuning
    #[must_use]
    pub const fn params(&self) -> &OneEuroParams {
        &self.params
    }

    /// Sampling frequency currently in use, possibly re-estimated from timestamps
    #[must_use]
    pub const fn current_frequency(&self) -> f64 {
        self.frequency
    }

    /// Filter a sample taken at `timestamp` seconds
    ///
    /// Once two timestamps have been seen, the sampling frequency follows
    /// their spacing. Non-increasing timestamps keep the previous frequency.
    pub fn apply_at(&mut self, sample: Vector3<f64>, timestamp: f64) -> Vector3<f64> {
        if let Some(last) = self.last_timestamp {
            if timestamp > last {
                self.frequency = 1.0 / (timestamp - last);
            }
        }
        self.last_timestamp = Some(timestamp);
        self.filter(sample)
    }

    fn filter(&mut self, sample: Vector3<f64>) -> Vector3<f64> {
        let frequency = self.frequency;
        let params = self.params;
        Vector3::new(
            self.axes[0].filter(sample.x, frequency, &params),
            self.axes[1].filter(sample.y, frequency, &params),
            self.axes[2].filter(sample.z, frequency, &params),
        )
    }
}

impl SignalFilter for OneEuroFilter {
    fn apply(&mut self, sample: Vector3<f64>) -> Vector3<f64> {
        self.filter(sample)
    }

    fn reset(&mut self) {
        self.axes = [OneEuroAxis::default(); 3];
        self.frequency = self.params.frequency;
        self.last_timestamp = None;
    }

    fn is_initialized(&self) -> bool {
        self.axes[0].value.last_raw.is_some()
    }

    fn name(&self) -> &str {
        "OneEuroFilter"
    }
}
