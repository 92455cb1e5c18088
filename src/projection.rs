//! Generalized (off-axis) perspective projection onto a planar display.
//!
//! Conventions are right-handed with the camera looking down -Z, and
//! projection matrices map to OpenGL clip space. The display plane normal
//! `vr x vu` points from the screen toward the viewer.

use crate::{
    constants::{DEFAULT_ASPECT, DEFAULT_FAR_CLIP, DEFAULT_FOV_Y_DEG, DEFAULT_NEAR_CLIP, EPSILON},
    Error, Result,
};
use log::debug;
use nalgebra::{Matrix4, Perspective3, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Per-eye camera clip configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeCamera {
    /// Vertical field of view for the symmetric fallback, in degrees
    pub fov_y_deg: f64,
    /// Width / height of the render target
    pub aspect: f64,
    /// Near clip distance
    pub near: f64,
    /// Far clip distance
    pub far: f64,
}

impl Default for EyeCamera {
    fn default() -> Self {
        Self {
            fov_y_deg: DEFAULT_FOV_Y_DEG,
            aspect: DEFAULT_ASPECT,
            near: DEFAULT_NEAR_CLIP,
            far: DEFAULT_FAR_CLIP,
        }
    }
}

impl EyeCamera {
    /// Standard symmetric-frustum perspective projection
    #[must_use]
    pub fn symmetric_projection(&self) -> Matrix4<f64> {
        Perspective3::new(self.aspect, self.fov_y_deg.to_radians(), self.near, self.far).to_homogeneous()
    }
}

/// A planar display surface described by three world-space corners
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayPlane {
    bottom_left: Point3<f64>,
    bottom_right: Point3<f64>,
    top_left: Point3<f64>,
    right: Vector3<f64>,
    up: Vector3<f64>,
    normal: Vector3<f64>,
    basis: Matrix4<f64>,
    rotation: UnitQuaternion<f64>,
}

impl DisplayPlane {
    /// Derive the plane basis from its bottom-left, bottom-right and top-left corners
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegeneratePlane`] if the corners are coincident or collinear.
    pub fn from_corners(bottom_left: Point3<f64>, bottom_right: Point3<f64>, top_left: Point3<f64>) -> Result<Self> {
        let across = bottom_right - bottom_left;
        let upward = top_left - bottom_left;
        let normal = across.cross(&upward);
        if across.norm() < EPSILON || upward.norm() < EPSILON || normal.norm() < EPSILON {
            return Err(Error::DegeneratePlane(format!(
                "corners {bottom_left:?}, {bottom_right:?}, {top_left:?} do not span a plane"
            )));
        }

        let right = across.normalize();
        let normal = normal.normalize();
        let up = normal.cross(&right);
        Ok(Self::from_basis(bottom_left, bottom_right, top_left, right, up, normal))
    }

    /// Build a plane from corners and an externally supplied orthonormal basis
    #[must_use]
    pub fn from_basis(
        bottom_left: Point3<f64>,
        bottom_right: Point3<f64>,
        top_left: Point3<f64>,
        right: Vector3<f64>,
        up: Vector3<f64>,
        normal: Vector3<f64>,
    ) -> Self {
        #[rustfmt::skip]
        let basis = Matrix4::new(
            right.x,  right.y,  right.z,  0.0,
            up.x,     up.y,     up.z,     0.0,
            normal.x, normal.y, normal.z, 0.0,
            0.0,      0.0,      0.0,      1.0,
        );
        let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_basis_unchecked(&[right, up, normal]));

        Self {
            bottom_left,
            bottom_right,
            top_left,
            right,
            up,
            normal,
            basis,
            rotation,
        }
    }

    /// Bottom-left corner (pa)
    #[must_use]
    pub const fn bottom_left(&self) -> Point3<f64> {
        self.bottom_left
    }

    /// Bottom-right corner (pb)
    #[must_use]
    pub const fn bottom_right(&self) -> Point3<f64> {
        self.bottom_right
    }

    /// Top-left corner (pc)
    #[must_use]
    pub const fn top_left(&self) -> Point3<f64> {
        self.top_left
    }

    /// Unit vector along the bottom edge (vr)
    #[must_use]
    pub const fn right(&self) -> Vector3<f64> {
        self.right
    }

    /// Unit vector along the left edge (vu)
    #[must_use]
    pub const fn up(&self) -> Vector3<f64> {
        self.up
    }

    /// Unit normal toward the viewer (vn)
    #[must_use]
    pub const fn normal(&self) -> Vector3<f64> {
        self.normal
    }

    /// World to plane-aligned basis change (M)
    #[must_use]
    pub const fn basis(&self) -> &Matrix4<f64> {
        &self.basis
    }

    /// World orientation of the plane
    #[must_use]
    pub const fn rotation(&self) -> &UnitQuaternion<f64> {
        &self.rotation
    }

    /// Center of the rectangle spanned by the corners
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        let top_right = self.top_left + (self.bottom_right - self.bottom_left);
        Point3::from((self.bottom_left.coords + top_right.coords) / 2.0)
    }
}

/// Signed frustum edges at the near plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumEdges {
    /// Left edge
    pub left: f64,
    /// Right edge
    pub right: f64,
    /// Bottom edge
    pub bottom: f64,
    /// Top edge
    pub top: f64,
    /// Near clip distance
    pub near: f64,
    /// Far clip distance
    pub far: f64,
}

impl FrustumEdges {
    /// Whether left/right and bottom/top mirror each other within `tolerance`
    #[must_use]
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        (self.left + self.right).abs() <= tolerance && (self.bottom + self.top).abs() <= tolerance
    }

    /// Asymmetric perspective matrix for these edges
    #[must_use]
    pub fn to_matrix(&self) -> Matrix4<f64> {
        frustum(self.left, self.right, self.bottom, self.top, self.near, self.far)
    }
}

/// OpenGL-style perspective frustum matrix
#[must_use]
pub fn frustum(left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> Matrix4<f64> {
    let width = right - left;
    let height = top - bottom;
    let depth = far - near;

    #[rustfmt::skip]
    let m = Matrix4::new(
        2.0 * near / width, 0.0,                 (right + left) / width,  0.0,
        0.0,                2.0 * near / height, (top + bottom) / height, 0.0,
        0.0,                0.0,                 -(far + near) / depth,   -2.0 * far * near / depth,
        0.0,                0.0,                 -1.0,                    0.0,
    );
    m
}

/// Near-plane frustum edges for an eye at `eye` looking through `plane`
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the eye lies in the display plane.
pub fn frustum_edges(plane: &DisplayPlane, eye: &Point3<f64>, near: f64, far: f64) -> Result<FrustumEdges> {
    let va = plane.bottom_left - *eye;
    let vb = plane.bottom_right - *eye;
    let vc = plane.top_left - *eye;

    let distance = -va.dot(&plane.normal);
    if distance.abs() < EPSILON {
        return Err(Error::InvalidInput(format!(
            "Eye at {eye:?} lies in the display plane"
        )));
    }

    let scale = near / distance;
    let edges = FrustumEdges {
        left: plane.right.dot(&va) * scale,
        right: plane.right.dot(&vb) * scale,
        bottom: plane.up.dot(&va) * scale,
        top: plane.up.dot(&vc) * scale,
        near,
        far,
    };
    debug!(
        "Frustum edges l={:.5} r={:.5} b={:.5} t={:.5} (d={distance:.4})",
        edges.left, edges.right, edges.bottom, edges.top
    );
    Ok(edges)
}

/// View matrix `M * relativeRotation * translate(-eye)` for the off-axis path
///
/// `rig_rotation` is the rig's world orientation; the relative rotation maps
/// it onto the plane's orientation.
#[must_use]
pub fn off_axis_view(plane: &DisplayPlane, rig_rotation: &UnitQuaternion<f64>, eye: &Point3<f64>) -> Matrix4<f64> {
    let relative_rotation = (rig_rotation.inverse() * plane.rotation).to_homogeneous();
    let camera_translation = Translation3::from(-eye.coords).to_homogeneous();
    plane.basis * relative_rotation * camera_translation
}
