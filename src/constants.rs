//! Constants used throughout the library

/// Webcam focal length in pixels
pub const DEFAULT_FOCAL_LENGTH_PX: f64 = 492.0;

/// Average adult interocular distance in meters
pub const DEFAULT_IPD_M: f64 = 0.064;

/// Eye pixel distance at or below which a detection is rejected
pub const MIN_EYE_PIXEL_DISTANCE: f64 = 1.0;

/// Image center factor (center = size / factor)
pub const IMAGE_CENTER_FACTOR: f64 = 2.0;

/// Rotation approximation defaults
pub const DEFAULT_YAW_MAX_DEG: f64 = 25.0;
pub const DEFAULT_PITCH_MAX_DEG: f64 = 20.0;
pub const DEFAULT_DEADZONE: f64 = 0.02;
pub const DEFAULT_ROTATION_SMOOTHING: f64 = 0.85;

/// Neutral eye-center reference before calibration (normalized image coordinates)
pub const NEUTRAL_REFERENCE: (f64, f64) = (0.5, 0.5);

/// Default filter parameters
pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 30;
pub const DEFAULT_SINGLE_EXPONENTIAL_ALPHA: f64 = 0.03;
pub const DEFAULT_DOUBLE_EXPONENTIAL_ALPHA: f64 = 0.04;
pub const DEFAULT_DOUBLE_EXPONENTIAL_BETA: f64 = 0.5;

/// One-euro filter defaults
pub const DEFAULT_ONE_EURO_FREQUENCY: f64 = 60.0;
pub const DEFAULT_ONE_EURO_MIN_CUTOFF: f64 = 1.0;
pub const DEFAULT_ONE_EURO_BETA: f64 = 0.0;
pub const DEFAULT_ONE_EURO_DERIVATIVE_CUTOFF: f64 = 1.0;

/// Stereo rig defaults
pub const DEFAULT_HEAD_OFFSET: [f64; 3] = [0.0, 1.6, 0.0];
pub const DEFAULT_POSITION_SCALE: f64 = 0.3;
pub const DEFAULT_ROTATION_STRENGTH: f64 = 1.0;

/// Camera clip defaults
pub const DEFAULT_NEAR_CLIP: f64 = 0.3;
pub const DEFAULT_FAR_CLIP: f64 = 1000.0;
pub const DEFAULT_FOV_Y_DEG: f64 = 60.0;
pub const DEFAULT_ASPECT: f64 = 16.0 / 9.0;

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-10;
