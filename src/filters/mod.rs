//! Signal filtering algorithms for smoothing the head position stream.
//!
//! Each filter returns its first input unchanged and seeds its state from it;
//! later samples go through the filter's update law. [`FilterBank`] keeps one
//! instance of every algorithm and routes samples to the selected one, so
//! switching algorithms never disturbs the others.

/// Moving average filter for simple smoothing
pub mod moving_average;

/// Single exponential filter for responsive smoothing
pub mod exponential;

/// Trend-corrected double exponential filter
pub mod double_exponential;

/// Adaptive-cutoff One Euro filter
pub mod one_euro;

use std::fmt;
use std::str::FromStr;

use log::{debug, info};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{config::FilterConfig, Error, Result};
use double_exponential::DoubleExponentialFilter;
use exponential::ExponentialFilter;
use moving_average::MovingAverageFilter;
use one_euro::{OneEuroFilter, OneEuroParams};

/// Trait for all position filters
pub trait SignalFilter: Send + Sync {
    /// Apply filter to one sample
    fn apply(&mut self, sample: Vector3<f64>) -> Vector3<f64>;

    /// Reset filter state
    fn reset(&mut self);

    /// Whether the filter has seen a sample since construction or reset
    fn is_initialized(&self) -> bool;

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
pub struct NoFilter;

impl SignalFilter for NoFilter {
    fn apply(&mut self, sample: Vector3<f64>) -> Vector3<f64> {
        sample
    }

    fn reset(&mut self) {}

    fn is_initialized(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Selectable smoothing algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Mean of the last N samples
    MovingAverage,
    /// Exponentially weighted average
    SingleExponential,
    /// Holt level + trend smoothing
    DoubleExponential,
    /// Speed-adaptive low-pass
    OneEuro,
}

impl FilterKind {
    /// All algorithms, in bank order
    pub const ALL: [Self; 4] = [
        Self::MovingAverage,
        Self::SingleExponential,
        Self::DoubleExponential,
        Self::OneEuro,
    ];

    /// Configuration name of the algorithm
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MovingAverage => "moving_average",
            Self::SingleExponential => "single_exponential",
            Self::DoubleExponential => "double_exponential",
            Self::OneEuro => "one_euro",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "moving_average" | "movingaverage" => Ok(Self::MovingAverage),
            "single_exponential" | "exponential" => Ok(Self::SingleExponential),
            "double_exponential" | "doubleexponential" | "holt" => Ok(Self::DoubleExponential),
            "one_euro" | "oneeuro" => Ok(Self::OneEuro),
            _ => Err(Error::FilterError(format!("Unknown filter type: {s}"))),
        }
    }
}

fn parse_param<T: FromStr>(value: Option<&str>, default: T, what: &str) -> Result<T> {
    value.map_or(Ok(default), |v| {
        v.parse()
            .map_err(|_| Error::FilterError(format!("Invalid {what}: {v}")))
    })
}

/// Create a filter from a `name[:param[:param...]]` description
///
/// - `none`
/// - `moving_average[:window]`
/// - `exponential[:alpha]`
/// - `double_exponential[:alpha[:beta]]`
/// - `one_euro[:frequency[:min_cutoff[:beta[:d_cutoff]]]]`
///
/// # Errors
///
/// Returns [`Error::FilterError`] for unknown names or out-of-range parameters.
pub fn create_filter(description: &str) -> Result<Box<dyn SignalFilter>> {
    let mut parts = description.split(':');
    let name = parts.next().unwrap_or_default();
    if matches!(name.to_lowercase().as_str(), "none" | "nofilter") {
        return Ok(Box::new(NoFilter));
    }

    let defaults = FilterConfig::default();
    let p1 = parts.next();
    let p2 = parts.next();
    let p3 = parts.next();
    let p4 = parts.next();

    let filter: Box<dyn SignalFilter> = match name.parse::<FilterKind>()? {
        FilterKind::MovingAverage => {
            let window = parse_param(p1, defaults.moving_average_window, "window size")?;
            validate_window(window)?;
            Box::new(MovingAverageFilter::new(window))
        }
        FilterKind::SingleExponential => {
            let alpha = parse_param(p1, defaults.single_exponential_alpha, "alpha")?;
            validate_alpha(alpha)?;
            Box::new(ExponentialFilter::new(alpha))
        }
        FilterKind::DoubleExponential => {
            let alpha = parse_param(p1, defaults.double_exponential_alpha, "alpha")?;
            let beta = parse_param(p2, defaults.double_exponential_beta, "beta")?;
            validate_alpha(alpha)?;
            validate_beta(beta)?;
            Box::new(DoubleExponentialFilter::new(alpha, beta))
        }
        FilterKind::OneEuro => {
            let params = OneEuroParams {
                frequency: parse_param(p1, defaults.one_euro_frequency, "frequency")?,
                min_cutoff: parse_param(p2, defaults.one_euro_min_cutoff, "min cutoff")?,
                beta: parse_param(p3, defaults.one_euro_beta, "beta")?,
                d_cutoff: parse_param(p4, defaults.one_euro_d_cutoff, "derivative cutoff")?,
            };
            validate_one_euro(&params)?;
            Box::new(OneEuroFilter::with_params(params))
        }
    };
    Ok(filter)
}

pub(crate) fn validate_window(window: usize) -> Result<()> {
    if window == 0 {
        return Err(Error::FilterError("Window size must be greater than 0".to_string()));
    }
    Ok(())
}

pub(crate) fn validate_alpha(alpha: f64) -> Result<()> {
    if !(alpha > 0.0 && alpha <= 1.0) {
        return Err(Error::FilterError(format!("Alpha must be in (0, 1], got {alpha}")));
    }
    Ok(())
}

pub(crate) fn validate_beta(beta: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&beta) {
        return Err(Error::FilterError(format!("Beta must be in [0, 1], got {beta}")));
    }
    Ok(())
}

pub(crate) fn validate_one_euro(params: &OneEuroParams) -> Result<()> {
    if !(params.frequency > 0.0) {
        return Err(Error::FilterError(format!(
            "Frequency must be positive, got {}",
            params.frequency
        )));
    }
    if !(params.min_cutoff > 0.0 && params.d_cutoff > 0.0) {
        return Err(Error::FilterError("Cutoff frequency must be positive".to_string()));
    }
    if !(params.beta >= 0.0) {
        return Err(Error::FilterError(format!(
            "Beta must be non-negative, got {}",
            params.beta
        )));
    }
    Ok(())
}

/// One state block per algorithm with a selected active one
pub struct FilterBank {
    active: FilterKind,
    moving_average: MovingAverageFilter,
    single_exponential: ExponentialFilter,
    double_exponential: DoubleExponentialFilter,
    one_euro: OneEuroFilter,
}

impl FilterBank {
    /// Build a bank from filter configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::FilterError`] if any algorithm's parameters are out of range.
    pub fn new(config: &FilterConfig) -> Result<Self> {
        validate_window(config.moving_average_window)?;
        validate_alpha(config.single_exponential_alpha)?;
        validate_alpha(config.double_exponential_alpha)?;
        validate_beta(config.double_exponential_beta)?;
        let one_euro = config.one_euro_params();
        validate_one_euro(&one_euro)?;

        info!("Initializing FilterBank with active filter {}", config.kind);
        Ok(Self {
            active: config.kind,
            moving_average: MovingAverageFilter::new(config.moving_average_window),
            single_exponential: ExponentialFilter::new(config.single_exponential_alpha),
            double_exponential: DoubleExponentialFilter::new(
                config.double_exponential_alpha,
                config.double_exponential_beta,
            ),
            one_euro: OneEuroFilter::with_params(one_euro),
        })
    }

    /// Currently selected algorithm
    #[must_use]
    pub const fn active(&self) -> FilterKind {
        self.active
    }

    /// Select the algorithm used by [`FilterBank::apply`]; other states are kept
    pub fn select(&mut self, kind: FilterKind) {
        if kind != self.active {
            debug!("Switching filter {} -> {}", self.active, kind);
            self.active = kind;
        }
    }

    /// Filter one sample through the active algorithm
    pub fn apply(&mut self, sample: Vector3<f64>) -> Vector3<f64> {
        let kind = self.active;
        self.filter_mut(kind).apply(sample)
    }

    /// Filter a timestamped sample; only the One Euro filter uses the timestamp
    pub fn apply_at(&mut self, sample: Vector3<f64>, timestamp: f64) -> Vector3<f64> {
        match self.active {
            FilterKind::OneEuro => self.one_euro.apply_at(sample, timestamp),
            _ => self.apply(sample),
        }
    }

    /// Clear every algorithm and seed each with `seed`
    pub fn reset_state(&mut self, seed: Vector3<f64>) {
        debug!("Resetting all filters with seed {seed:?}");
        for kind in FilterKind::ALL {
            let filter = self.filter_mut(kind);
            filter.reset();
            filter.apply(seed);
        }
    }

    /// Change the One Euro sampling frequency, rebuilding it if the value differs
    ///
    /// # Errors
    ///
    /// Returns [`Error::FilterError`] if `frequency` is not positive.
    pub fn set_frequency(&mut self, frequency: f64) -> Result<()> {
        let params = OneEuroParams {
            frequency,
            ..*self.one_euro.params()
        };
        validate_one_euro(&params)?;
        if (params.frequency - self.one_euro.params().frequency).abs() > f64::EPSILON {
            info!("One Euro sampling frequency changed to {frequency} Hz, reinitializing");
            self.one_euro = OneEuroFilter::with_params(params);
        }
        Ok(())
    }

    /// Shared access to one algorithm's filter
    #[must_use]
    pub fn filter(&self, kind: FilterKind) -> &dyn SignalFilter {
        match kind {
            FilterKind::MovingAverage => &self.moving_average,
            FilterKind::SingleExponential => &self.single_exponential,
            FilterKind::DoubleExponential => &self.double_exponential,
            FilterKind::OneEuro => &self.one_euro,
        }
    }

    fn filter_mut(&mut self, kind: FilterKind) -> &mut dyn SignalFilter {
        match kind {
            FilterKind::MovingAverage => &mut self.moving_average,
            FilterKind::SingleExponential => &mut self.single_exponential,
            FilterKind::DoubleExponential => &mut self.double_exponential,
            FilterKind::OneEuro => &mut self.one_euro,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank(kind: FilterKind) -> FilterBank {
        FilterBank::new(&FilterConfig {
            kind,
            moving_average_window: 3,
            single_exponential_alpha: 0.5,
            ..FilterConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_no_filter() {
        let mut filter = NoFilter;
        let v = Vector3::new(10.0, 20.0, 30.0);
        assert_eq!(filter.apply(v), v);
    }

    #[test]
    fn test_create_filter() {
        assert!(create_filter("none").is_ok());
        assert!(create_filter("moving_average:5").is_ok());
        assert!(create_filter("one_euro").is_ok());
        assert!(create_filter("unknown").is_err());
    }

    #[test]
    fn test_filter_kind_round_trip_names() {
        for kind in FilterKind::ALL {
            assert_eq!(kind.as_str().parse::<FilterKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_switch_preserves_inactive_state() {
        let mut bank = bank(FilterKind::SingleExponential);
        bank.apply(Vector3::repeat(10.0));
        bank.apply(Vector3::repeat(20.0));

        bank.select(FilterKind::MovingAverage);
        // Moving average was never fed, so it bootstraps from the raw sample
        assert_eq!(bank.apply(Vector3::repeat(100.0)), Vector3::repeat(100.0));

        bank.select(FilterKind::SingleExponential);
        // 0.5 * 30 + 0.5 * 15
        assert_eq!(bank.apply(Vector3::repeat(30.0)), Vector3::repeat(22.5));
    }

    #[test]
    fn test_reset_state_seeds_every_filter() {
        let mut bank = bank(FilterKind::OneEuro);
        bank.apply(Vector3::repeat(5.0));
        let seed = Vector3::new(1.0, 2.0, 3.0);
        bank.reset_state(seed);

        for kind in FilterKind::ALL {
            assert!(bank.filter(kind).is_initialized());
            bank.select(kind);
            let out = bank.apply(seed);
            assert!((out - seed).norm() < 1e-12, "{kind} drifted after reseed");
        }
    }

    #[test]
    fn test_set_frequency_reinitializes_only_on_change() {
        let mut bank = bank(FilterKind::OneEuro);
        bank.apply(Vector3::repeat(1.0));
        bank.set_frequency(60.0).unwrap();
        assert!(bank.filter(FilterKind::OneEuro).is_initialized());

        bank.set_frequency(30.0).unwrap();
        assert!(!bank.filter(FilterKind::OneEuro).is_initialized());
        assert!(bank.set_frequency(0.0).is_err());
    }
}
