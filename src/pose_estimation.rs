//! Monocular head pose estimation from the apparent interocular distance.
//!
//! Position comes from the pinhole relation between the known physical eye
//! separation and its size in the image. Orientation is an approximation:
//! the eye-center offset from a calibrated neutral point is mapped linearly
//! to yaw and pitch. It is not a full 3D pose solve, and the deadzone and
//! smoothing constants are tuned against this model.

use crate::{
    config::EstimatorConfig,
    constants::{IMAGE_CENTER_FACTOR, NEUTRAL_REFERENCE},
    observation::{DetectorFrame, Observation},
};
use log::{debug, info, warn};
use nalgebra::{UnitQuaternion, Vector2, Vector3};

/// Approximate head orientation in degrees, roll fixed at zero
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeadOrientation {
    /// Rotation about the vertical axis
    pub yaw_deg: f64,
    /// Rotation about the horizontal axis
    pub pitch_deg: f64,
}

impl HeadOrientation {
    /// Create an orientation from yaw and pitch in degrees
    #[must_use]
    pub const fn new(yaw_deg: f64, pitch_deg: f64) -> Self {
        Self { yaw_deg, pitch_deg }
    }

    /// Rotation for pitch about X followed by yaw about Y
    #[must_use]
    pub fn to_rotation(self) -> UnitQuaternion<f64> {
        let yaw = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), self.yaw_deg.to_radians());
        let pitch = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), self.pitch_deg.to_radians());
        yaw * pitch
    }

    /// Wrap both angles into [-180, 180] and multiply by `strength`
    #[must_use]
    pub fn scaled(self, strength: f64) -> Self {
        Self {
            yaw_deg: normalize_angle(self.yaw_deg) * strength,
            pitch_deg: normalize_angle(self.pitch_deg) * strength,
        }
    }
}

/// Wrap an angle in degrees into [-180, 180]
#[must_use]
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = (angle + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid maps +180 to -180; keep the positive boundary as given
    if wrapped == -180.0 && angle > 0.0 {
        180.0
    } else {
        wrapped
    }
}

/// Symmetric deadzone with rescaling so the output is continuous at the edge
#[must_use]
pub fn apply_deadzone(value: f64, deadzone: f64) -> f64 {
    let magnitude = value.abs();
    if magnitude <= deadzone {
        return 0.0;
    }
    value.signum() * (magnitude - deadzone) / (1.0 - deadzone)
}

/// Estimated head pose in camera space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatedPose {
    /// Head position in meters, camera looking down -Z
    pub position: Vector3<f64>,
    /// Smoothed approximate orientation
    pub orientation: HeadOrientation,
}

/// Neutral eye-center reference and accumulated smoothed angles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationState {
    /// Whether a reference point has been captured
    pub has_reference: bool,
    /// Neutral eye center in normalized image coordinates
    pub reference: Vector2<f64>,
    /// Smoothed yaw in degrees
    pub yaw_smoothed: f64,
    /// Smoothed pitch in degrees
    pub pitch_smoothed: f64,
}

impl Default for CalibrationState {
    fn default() -> Self {
        Self {
            has_reference: false,
            reference: Vector2::new(NEUTRAL_REFERENCE.0, NEUTRAL_REFERENCE.1),
            yaw_smoothed: 0.0,
            pitch_smoothed: 0.0,
        }
    }
}

/// Head pose estimator working from eye-center detections
pub struct HeadPoseEstimator {
    config: EstimatorConfig,
    calibration: CalibrationState,
    orientation: HeadOrientation,
}

impl HeadPoseEstimator {
    /// Create a new estimator
    #[must_use]
    pub fn new(config: EstimatorConfig) -> Self {
        info!(
            "Initializing HeadPoseEstimator: focal length {} px, IPD {} m",
            config.focal_length_px, config.ipd_m
        );
        Self {
            config,
            calibration: CalibrationState::default(),
            orientation: HeadOrientation::default(),
        }
    }

    /// Current configuration
    #[must_use]
    pub const fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Current calibration state
    #[must_use]
    pub const fn calibration(&self) -> &CalibrationState {
        &self.calibration
    }

    /// Last smoothed orientation; retained while tracking is lost
    #[must_use]
    pub const fn orientation(&self) -> HeadOrientation {
        self.orientation
    }

    /// Forget the neutral reference so the next valid observation captures it
    pub fn recalibrate(&mut self) {
        info!("Recalibrating head pose reference");
        self.calibration = CalibrationState::default();
        self.orientation = HeadOrientation::default();
    }

    /// Estimate from a detector frame; `None` or an empty frame is loss of tracking
    pub fn estimate_frame(&mut self, frame: Option<&DetectorFrame>) -> Option<EstimatedPose> {
        let observation = frame.and_then(DetectorFrame::primary);
        self.estimate(observation.as_ref())
    }

    /// Estimate the head pose for one tick
    ///
    /// Returns `None` when there is no observation, the detector flagged it
    /// invalid, or the eyes are too close together in the image to trust.
    pub fn estimate(&mut self, observation: Option<&Observation>) -> Option<EstimatedPose> {
        let observation = observation.filter(|o| o.valid)?;
        let position = self.estimate_position(observation)?;
        let orientation = self.update_orientation(observation);
        Some(EstimatedPose { position, orientation })
    }

    /// Back-project the eye midpoint using depth from eye separation
    #[must_use]
    pub fn estimate_position(&self, observation: &Observation) -> Option<Vector3<f64>> {
        let pixel_distance = observation.eye_pixel_distance();
        debug!("Eye pixel distance: {pixel_distance:.3}");

        if pixel_distance <= self.config.min_eye_pixel_distance {
            warn!("Rejecting degenerate detection: eye pixel distance {pixel_distance:.3}");
            return None;
        }

        let focal = self.config.focal_length_px;
        let (u, v) = Self::pixel_midpoint(observation);
        let cx = f64::from(observation.width) / IMAGE_CENTER_FACTOR;
        let cy = f64::from(observation.height) / IMAGE_CENTER_FACTOR;

        let z = depth_from_eye_distance(focal, self.config.ipd_m, pixel_distance);
        let x = (u - cx) * z / focal;
        let y = -(v - cy) * z / focal;

        Some(Vector3::new(x, y, z))
    }

    fn pixel_midpoint(observation: &Observation) -> (f64, f64) {
        let (left, right) = observation.eyes_in_pixels();
        let mid = (left + right) / 2.0;
        (mid.x, mid.y)
    }

    fn update_orientation(&mut self, observation: &Observation) -> HeadOrientation {
        let (u, v) = Self::pixel_midpoint(observation);
        let current = Vector2::new(u / f64::from(observation.width), v / f64::from(observation.height));

        if !self.calibration.has_reference {
            info!("Captured neutral reference at ({:.4}, {:.4})", current.x, current.y);
            self.calibration.reference = current;
            self.calibration.has_reference = true;
        }

        let offset = current - self.calibration.reference;
        let dx = apply_deadzone(offset.x, self.config.deadzone);
        let dy = apply_deadzone(offset.y, self.config.deadzone);

        let mut yaw = dx * self.config.yaw_max_deg;
        let mut pitch = -dy * self.config.pitch_max_deg;
        if self.config.invert_yaw {
            yaw = -yaw;
        }
        if self.config.invert_pitch {
            pitch = -pitch;
        }
        debug!("Raw orientation: yaw {yaw:.3}, pitch {pitch:.3}");

        let t = 1.0 - self.config.rotation_smoothing;
        let calibration = &mut self.calibration;
        calibration.yaw_smoothed += (yaw - calibration.yaw_smoothed) * t;
        calibration.pitch_smoothed += (pitch - calibration.pitch_smoothed) * t;

        self.orientation = HeadOrientation::new(calibration.yaw_smoothed, calibration.pitch_smoothed);
        self.orientation
    }
}

/// Signed depth (negative, forward is -Z) from the pinhole relation
#[must_use]
pub fn depth_from_eye_distance(focal_length_px: f64, ipd_m: f64, pixel_distance: f64) -> f64 {
    -(focal_length_px * ipd_m) / pixel_distance
}
