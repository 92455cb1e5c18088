//! Head-tracked stereoscopic rendering rig driven by a monocular camera.
//!
//! This library turns eye-center detections from an external face detector
//! into per-eye view and projection matrices:
//! 1. Head pose estimation from the apparent interocular distance
//! 2. Temporal smoothing with one of four selectable filters
//! 3. Stereo rig placement with optional toe-in convergence
//! 4. Generalized off-axis projection onto a physical display plane
//!
//! Face detection, frame acquisition and rendering stay outside the crate.
//!
//! # Examples
//!
//! ## Complete Pipeline
//!
//! ```no_run
//! use stereo_head_tracking::{
//!     config::Config,
//!     observation::{DetectorFrame, EyeDetection, EyePoint},
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_file("tracking.yaml")?;
//! let mut pipeline = config.build_pipeline()?;
//!
//! let frame = DetectorFrame::new(
//!     vec![EyeDetection {
//!         left_eye: EyePoint::new(0.45, 0.5),
//!         right_eye: EyePoint::new(0.55, 0.5),
//!     }],
//!     640,
//!     480,
//! );
//!
//! let output = pipeline.tick(Some(&frame), false)?;
//! let left_view = output.rig.left.view_f32();
//! let left_projection = output.rig.left.projection_f32();
//! # let _ = (left_view, left_projection);
//! # Ok(())
//! # }
//! ```
//!
//! ## Using Filters
//!
//! ```
//! use nalgebra::Vector3;
//! use stereo_head_tracking::filters::{create_filter, SignalFilter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut filter = create_filter("double_exponential:0.5:0.5")?;
//!
//! let first = filter.apply(Vector3::new(0.0, 1.6, -0.5));
//! assert_eq!(first, Vector3::new(0.0, 1.6, -0.5));
//!
//! filter.reset();
//! # Ok(())
//! # }
//! ```

/// Detector observations consumed each tick
pub mod observation;

/// Head pose estimation from eye detections
pub mod pose_estimation;

/// Signal filtering algorithms for smoothing head positions
pub mod filters;

/// Off-axis and symmetric projection math
pub mod projection;

/// Stereo camera rig driven by head pose
pub mod stereo_rig;

/// Per-tick pipeline wiring all stages together
pub mod pipeline;

/// Observation log replay
pub mod replay;

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
