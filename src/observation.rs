//! Detector observations handed to the core once per tick.
//!
//! The face detector itself lives outside this crate. It produces a
//! [`DetectorFrame`] with zero or more detections, each carrying the two eye
//! centers in normalized image coordinates.

use nalgebra::Vector2;

/// A point in normalized image coordinates, `[0,1] x [0,1]`, y growing downward
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyePoint {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl EyePoint {
    /// Create a new normalized eye point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Scale into pixel coordinates
    #[must_use]
    pub fn to_pixels(self, width: u32, height: u32) -> Vector2<f64> {
        Vector2::new(self.x * f64::from(width), self.y * f64::from(height))
    }
}

/// A single face detection: both eye centers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeDetection {
    /// Left eye center
    pub left_eye: EyePoint,
    /// Right eye center
    pub right_eye: EyePoint,
}

/// One detector observation: the eye pair plus image size and validity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Left eye center
    pub left_eye: EyePoint,
    /// Right eye center
    pub right_eye: EyePoint,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Whether the detector considers this observation usable
    pub valid: bool,
}

impl Observation {
    /// Create a valid observation
    #[must_use]
    pub const fn new(left_eye: EyePoint, right_eye: EyePoint, width: u32, height: u32) -> Self {
        Self {
            left_eye,
            right_eye,
            width,
            height,
            valid: true,
        }
    }

    /// Left and right eye centers in pixels
    #[must_use]
    pub fn eyes_in_pixels(&self) -> (Vector2<f64>, Vector2<f64>) {
        (
            self.left_eye.to_pixels(self.width, self.height),
            self.right_eye.to_pixels(self.width, self.height),
        )
    }

    /// Euclidean distance between the eyes in pixels
    #[must_use]
    pub fn eye_pixel_distance(&self) -> f64 {
        let (left, right) = self.eyes_in_pixels();
        (right - left).norm()
    }
}

/// Everything the detector reported for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorFrame {
    /// Detections above the detector's confidence threshold, best first
    pub detections: Vec<EyeDetection>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl DetectorFrame {
    /// Create a frame from its detections
    #[must_use]
    pub const fn new(detections: Vec<EyeDetection>, width: u32, height: u32) -> Self {
        Self {
            detections,
            width,
            height,
        }
    }

    /// Frame with no face in view
    #[must_use]
    pub const fn empty(width: u32, height: u32) -> Self {
        Self::new(Vec::new(), width, height)
    }

    /// Observation built from the first detection, if any
    #[must_use]
    pub fn primary(&self) -> Option<Observation> {
        self.detections
            .first()
            .map(|d| Observation::new(d.left_eye, d.right_eye, self.width, self.height))
    }
}
