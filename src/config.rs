//! Configuration management for the stereo head tracking pipeline

use crate::{
    constants::{
        DEFAULT_DEADZONE, DEFAULT_DOUBLE_EXPONENTIAL_ALPHA, DEFAULT_DOUBLE_EXPONENTIAL_BETA, DEFAULT_FOCAL_LENGTH_PX,
        DEFAULT_HEAD_OFFSET, DEFAULT_IPD_M, DEFAULT_MOVING_AVERAGE_WINDOW, DEFAULT_ONE_EURO_BETA,
        DEFAULT_ONE_EURO_DERIVATIVE_CUTOFF, DEFAULT_ONE_EURO_FREQUENCY, DEFAULT_ONE_EURO_MIN_CUTOFF,
        DEFAULT_PITCH_MAX_DEG, DEFAULT_POSITION_SCALE, DEFAULT_ROTATION_SMOOTHING, DEFAULT_ROTATION_STRENGTH,
        DEFAULT_SINGLE_EXPONENTIAL_ALPHA, DEFAULT_YAW_MAX_DEG, MIN_EYE_PIXEL_DISTANCE,
    },
    filters::{one_euro::OneEuroParams, FilterBank, FilterKind},
    pipeline::HeadTrackingPipeline,
    pose_estimation::HeadPoseEstimator,
    projection::{DisplayPlane, EyeCamera},
    stereo_rig::StereoRig,
    Error, Result,
};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Head pose estimation parameters
    pub estimator: EstimatorConfig,

    /// Position filter configuration
    pub filter: FilterConfig,

    /// Stereo rig behavior
    pub rig: RigConfig,

    /// Left/right eye camera clip settings
    pub cameras: CameraConfig,

    /// Physical display surface, required for off-axis projection
    pub display_plane: Option<DisplayPlaneConfig>,
}

/// Head pose estimation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Webcam focal length in pixels
    pub focal_length_px: f64,

    /// Physical distance between the eyes in meters
    pub ipd_m: f64,

    /// Yaw in degrees for a full-width eye-center offset
    pub yaw_max_deg: f64,

    /// Pitch in degrees for a full-height eye-center offset
    pub pitch_max_deg: f64,

    /// Deadzone in normalized image units (0..1)
    pub deadzone: f64,

    /// Rotation smoothing (0 = none, 1 = frozen)
    pub rotation_smoothing: f64,

    /// Invert yaw direction
    pub invert_yaw: bool,

    /// Invert pitch direction
    pub invert_pitch: bool,

    /// Eye pixel distance at or below which a detection is rejected
    pub min_eye_pixel_distance: f64,
}

/// Position filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Use the filter bank at all; disabled means pass-through
    pub enabled: bool,

    /// Active algorithm
    pub kind: FilterKind,

    /// Moving average window size
    pub moving_average_window: usize,

    /// Single exponential alpha
    pub single_exponential_alpha: f64,

    /// Double exponential alpha
    pub double_exponential_alpha: f64,

    /// Double exponential trend beta
    pub double_exponential_beta: f64,

    /// One Euro nominal sampling frequency (Hz)
    pub one_euro_frequency: f64,

    /// One Euro minimum cutoff (Hz)
    pub one_euro_min_cutoff: f64,

    /// One Euro speed coefficient
    pub one_euro_beta: f64,

    /// One Euro derivative cutoff (Hz)
    pub one_euro_d_cutoff: f64,
}

/// Stereo rig configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// Interocular distance used to place the eyes, in meters
    pub ipd_m: f64,

    /// Rotate both eyes to converge on `convergence_point`
    pub toe_in: bool,

    /// World-space convergence target
    pub convergence_point: Option<[f64; 3]>,

    /// Use the generalized off-axis projection
    pub off_axis: bool,

    /// Keep the last valid anchor position when tracking is lost
    pub freeze_when_lost: bool,

    /// Apply the estimated head rotation to the anchor
    pub apply_head_rotation: bool,

    /// Multiplier for head rotation angles
    pub rotation_strength: f64,

    /// Scale for head tracking translation
    pub position_scale: f64,

    /// Offset added to the anchor position (e.g. eye height)
    pub head_offset: [f64; 3],

    /// Invert X axis of the tracked position
    pub invert_x: bool,

    /// Invert Y axis of the tracked position
    pub invert_y: bool,

    /// Invert Z axis of the tracked position
    pub invert_z: bool,
}

/// Per-eye camera configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Left eye camera
    pub left: EyeCamera,

    /// Right eye camera
    pub right: EyeCamera,
}

/// Display plane given by three world-space corners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayPlaneConfig {
    /// Bottom-left corner
    pub bottom_left: [f64; 3],

    /// Bottom-right corner
    pub bottom_right: [f64; 3],

    /// Top-left corner
    pub top_left: [f64; 3],
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            focal_length_px: DEFAULT_FOCAL_LENGTH_PX,
            ipd_m: DEFAULT_IPD_M,
            yaw_max_deg: DEFAULT_YAW_MAX_DEG,
            pitch_max_deg: DEFAULT_PITCH_MAX_DEG,
            deadzone: DEFAULT_DEADZONE,
            rotation_smoothing: DEFAULT_ROTATION_SMOOTHING,
            invert_yaw: true,
            invert_pitch: false,
            min_eye_pixel_distance: MIN_EYE_PIXEL_DISTANCE,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            kind: FilterKind::OneEuro,
            moving_average_window: DEFAULT_MOVING_AVERAGE_WINDOW,
            single_exponential_alpha: DEFAULT_SINGLE_EXPONENTIAL_ALPHA,
            double_exponential_alpha: DEFAULT_DOUBLE_EXPONENTIAL_ALPHA,
            double_exponential_beta: DEFAULT_DOUBLE_EXPONENTIAL_BETA,
            one_euro_frequency: DEFAULT_ONE_EURO_FREQUENCY,
            one_euro_min_cutoff: DEFAULT_ONE_EURO_MIN_CUTOFF,
            one_euro_beta: DEFAULT_ONE_EURO_BETA,
            one_euro_d_cutoff: DEFAULT_ONE_EURO_DERIVATIVE_CUTOFF,
        }
    }
}

impl FilterConfig {
    /// One Euro tunables from this configuration
    #[must_use]
    pub const fn one_euro_params(&self) -> OneEuroParams {
        OneEuroParams {
            frequency: self.one_euro_frequency,
            min_cutoff: self.one_euro_min_cutoff,
            beta: self.one_euro_beta,
            d_cutoff: self.one_euro_d_cutoff,
        }
    }
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            ipd_m: DEFAULT_IPD_M,
            toe_in: false,
            convergence_point: None,
            off_axis: false,
            freeze_when_lost: true,
            apply_head_rotation: true,
            rotation_strength: DEFAULT_ROTATION_STRENGTH,
            position_scale: DEFAULT_POSITION_SCALE,
            head_offset: DEFAULT_HEAD_OFFSET,
            invert_x: false,
            invert_y: false,
            invert_z: false,
        }
    }
}

impl RigConfig {
    /// Head offset as a vector
    #[must_use]
    pub fn head_offset(&self) -> Vector3<f64> {
        Vector3::from(self.head_offset)
    }

    /// Convergence target as a point
    #[must_use]
    pub fn convergence_point(&self) -> Option<Point3<f64>> {
        self.convergence_point.map(Point3::from)
    }
}

impl DisplayPlaneConfig {
    /// Build the display plane with its derived basis
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegeneratePlane`] if the corners do not span a plane.
    pub fn to_plane(&self) -> Result<DisplayPlane> {
        DisplayPlane::from_corners(
            Point3::from(self.bottom_left),
            Point3::from(self.bottom_right),
            Point3::from(self.top_left),
        )
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the text is not a valid configuration.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Display plane, if configured
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegeneratePlane`] if the configured corners are degenerate.
    pub fn display_plane(&self) -> Result<Option<DisplayPlane>> {
        self.display_plane.as_ref().map(DisplayPlaneConfig::to_plane).transpose()
    }

    /// Create the filter bank, or `None` when filtering is disabled
    ///
    /// # Errors
    ///
    /// Returns [`Error::FilterError`] if filter parameters are out of range.
    pub fn create_filter_bank(&self) -> Result<Option<FilterBank>> {
        if !self.filter.enabled {
            return Ok(None);
        }
        FilterBank::new(&self.filter).map(Some)
    }

    /// Validate and assemble the full pipeline
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn build_pipeline(&self) -> Result<HeadTrackingPipeline> {
        self.validate()?;
        let estimator = HeadPoseEstimator::new(self.estimator.clone());
        let rig = StereoRig::new(
            self.rig.clone(),
            self.cameras.left,
            self.cameras.right,
            self.display_plane()?,
            self.create_filter_bank()?,
        );
        Ok(HeadTrackingPipeline::new(estimator, rig))
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`], [`Error::FilterError`],
    /// [`Error::MissingDisplayPlane`] or [`Error::DegeneratePlane`].
    pub fn validate(&self) -> Result<()> {
        let est = &self.estimator;
        if !(est.focal_length_px > 0.0) {
            return Err(Error::ConfigError("Focal length must be positive".to_string()));
        }
        if !(est.ipd_m > 0.0) {
            return Err(Error::ConfigError("Estimator IPD must be positive".to_string()));
        }
        if !(0.0..1.0).contains(&est.deadzone) {
            return Err(Error::ConfigError("Deadzone must be in [0, 1)".to_string()));
        }
        if !(0.0..=1.0).contains(&est.rotation_smoothing) {
            return Err(Error::ConfigError(
                "Rotation smoothing must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(est.min_eye_pixel_distance >= 0.0) {
            return Err(Error::ConfigError(
                "Minimum eye pixel distance must be non-negative".to_string(),
            ));
        }

        // Filter parameters are checked even when the bank is disabled
        let filter = &self.filter;
        crate::filters::validate_window(filter.moving_average_window)?;
        crate::filters::validate_alpha(filter.single_exponential_alpha)?;
        crate::filters::validate_alpha(filter.double_exponential_alpha)?;
        crate::filters::validate_beta(filter.double_exponential_beta)?;
        crate::filters::validate_one_euro(&filter.one_euro_params())?;

        if !(self.rig.ipd_m >= 0.0) {
            return Err(Error::ConfigError("Rig IPD must be non-negative".to_string()));
        }
        if self.rig.toe_in && self.rig.convergence_point.is_none() {
            log::warn!("Toe-in enabled without a convergence point; eyes stay parallel");
        }

        for (name, camera) in [("left", &self.cameras.left), ("right", &self.cameras.right)] {
            if !(camera.near > 0.0 && camera.far > camera.near) {
                return Err(Error::ConfigError(format!(
                    "Camera {name}: clip planes must satisfy 0 < near < far"
                )));
            }
            if !(camera.aspect > 0.0 && camera.fov_y_deg > 0.0 && camera.fov_y_deg < 180.0) {
                return Err(Error::ConfigError(format!(
                    "Camera {name}: aspect must be positive and FOV in (0, 180)"
                )));
            }
        }

        match (&self.display_plane, self.rig.off_axis) {
            (None, true) => Err(Error::MissingDisplayPlane),
            (Some(plane), _) => plane.to_plane().map(|_| ()),
            (None, false) => Ok(()),
        }
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Stereo Head Tracking Configuration

# Head pose estimation
estimator:
  focal_length_px: 492.0
  ipd_m: 0.064
  yaw_max_deg: 25.0
  pitch_max_deg: 20.0
  deadzone: 0.02
  rotation_smoothing: 0.85
  invert_yaw: true
  invert_pitch: false
  min_eye_pixel_distance: 1.0

# Position smoothing
filter:
  enabled: true
  kind: one_euro
  moving_average_window: 30
  single_exponential_alpha: 0.03
  double_exponential_alpha: 0.04
  double_exponential_beta: 0.5
  one_euro_frequency: 60.0
  one_euro_min_cutoff: 1.0
  one_euro_beta: 0.0
  one_euro_d_cutoff: 1.0

# Stereo rig
rig:
  ipd_m: 0.064
  toe_in: false
  convergence_point: null
  off_axis: false
  freeze_when_lost: true
  apply_head_rotation: true
  rotation_strength: 1.0
  position_scale: 0.3
  head_offset: [0.0, 1.6, 0.0]
  invert_x: false
  invert_y: false
  invert_z: false

# Eye cameras
cameras:
  left:
    fov_y_deg: 60.0
    aspect: 1.7777777777777777
    near: 0.3
    far: 1000.0
  right:
    fov_y_deg: 60.0
    aspect: 1.7777777777777777
    near: 0.3
    far: 1000.0

# Physical display (required when rig.off_axis is true)
# display_plane:
#   bottom_left: [-0.26, 1.45, -0.6]
#   bottom_right: [0.26, 1.45, -0.6]
#   top_left: [-0.26, 1.75, -0.6]
"#;
