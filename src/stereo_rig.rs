//! Stereo camera rig driven by the filtered head pose.
//!
//! The rig owns its two eye viewpoints, their clip settings and the optional
//! display plane. Every tick it moves its anchor from the head pose, places the
//! eyes half an IPD either side of the anchor, orients them (parallel or
//! toe-in) and produces a view/projection pair per eye.

use crate::{
    config::RigConfig,
    constants::EPSILON,
    filters::FilterBank,
    pose_estimation::EstimatedPose,
    projection::{frustum_edges, off_axis_view, DisplayPlane, EyeCamera, FrustumEdges},
    Error, Result,
};
use log::{debug, error, info, warn};
use nalgebra::{Isometry3, Matrix4, Point3, Translation3, UnitQuaternion, Vector3};

/// Which of the two viewpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eye {
    /// Left eye, offset toward -X
    Left,
    /// Right eye, offset toward +X
    Right,
}

impl Eye {
    /// Sign of the lateral offset along the rig's local right axis
    #[must_use]
    pub const fn lateral_sign(self) -> f64 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}

/// Per-eye result of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct EyeViewpoint {
    /// Which eye this is
    pub eye: Eye,
    /// Position relative to the rig anchor
    pub local_position: Vector3<f64>,
    /// Orientation relative to the rig anchor
    pub local_rotation: UnitQuaternion<f64>,
    /// World pose of the eye
    pub world: Isometry3<f64>,
    /// World to eye matrix
    pub view: Matrix4<f64>,
    /// Eye to clip matrix
    pub projection: Matrix4<f64>,
    /// Near-plane edges when the off-axis projection was used
    pub frustum: Option<FrustumEdges>,
}

impl EyeViewpoint {
    /// World position of the eye
    #[must_use]
    pub fn world_position(&self) -> Point3<f64> {
        Point3::from(self.world.translation.vector)
    }

    /// View matrix as column-major `f32` for GPU upload
    #[must_use]
    pub fn view_f32(&self) -> [f32; 16] {
        to_column_major(&self.view)
    }

    /// Projection matrix as column-major `f32` for GPU upload
    #[must_use]
    pub fn projection_f32(&self) -> [f32; 16] {
        to_column_major(&self.projection)
    }
}

fn to_column_major(m: &Matrix4<f64>) -> [f32; 16] {
    let mut out = [0.0_f32; 16];
    for (dst, src) in out.iter_mut().zip(m.cast::<f32>().iter()) {
        *dst = *src;
    }
    out
}

/// Immutable snapshot of the rig after one tick
#[derive(Debug, Clone, PartialEq)]
pub struct RigFrame {
    /// Whether a valid head pose drove this tick
    pub tracking: bool,
    /// Anchor position relative to the parent
    pub anchor_position: Vector3<f64>,
    /// Anchor rotation relative to the parent, without the head offset
    pub anchor_rotation: UnitQuaternion<f64>,
    /// Anchor rotation with the head rotation offset applied
    pub head_rotation: UnitQuaternion<f64>,
    /// World pose of the anchor
    pub rig_world: Isometry3<f64>,
    /// Left eye
    pub left: EyeViewpoint,
    /// Right eye
    pub right: EyeViewpoint,
}

/// Stereo rig with head-tracked anchor
///
/// The rig frame is `parent * anchor`, where the anchor carries the head
/// position and the base rotation. The head rotation offset is kept apart in
/// [`StereoRig::head_rotation`]: it turns the eyes on the symmetric path only,
/// since on the off-axis path the display plane fixes the view orientation.
pub struct StereoRig {
    config: RigConfig,
    left_camera: EyeCamera,
    right_camera: EyeCamera,
    plane: Option<DisplayPlane>,
    filter: Option<FilterBank>,
    parent: Isometry3<f64>,
    anchor_position: Vector3<f64>,
    base_rotation: UnitQuaternion<f64>,
    head_rotation: UnitQuaternion<f64>,
    last_known_position: Option<Vector3<f64>>,
    tracking: bool,
}

impl StereoRig {
    /// Create a rig; without a filter bank positions pass through unfiltered
    #[must_use]
    pub fn new(
        config: RigConfig,
        left_camera: EyeCamera,
        right_camera: EyeCamera,
        plane: Option<DisplayPlane>,
        filter: Option<FilterBank>,
    ) -> Self {
        info!(
            "Initializing StereoRig: IPD {} m, off-axis {}, toe-in {}",
            config.ipd_m, config.off_axis, config.toe_in
        );
        if filter.is_none() {
            warn!("No filter bank configured, head positions pass through unfiltered");
        }
        let anchor_position = config.head_offset();
        Self {
            config,
            left_camera,
            right_camera,
            plane,
            filter,
            parent: Isometry3::identity(),
            anchor_position,
            base_rotation: UnitQuaternion::identity(),
            head_rotation: UnitQuaternion::identity(),
            last_known_position: None,
            tracking: false,
        }
    }

    /// Rig configuration
    #[must_use]
    pub const fn config(&self) -> &RigConfig {
        &self.config
    }

    /// Filter bank, if any
    pub fn filter_bank_mut(&mut self) -> Option<&mut FilterBank> {
        self.filter.as_mut()
    }

    /// Replace the display plane
    pub fn set_display_plane(&mut self, plane: Option<DisplayPlane>) {
        self.plane = plane;
    }

    /// Display plane, if any
    #[must_use]
    pub const fn display_plane(&self) -> Option<&DisplayPlane> {
        self.plane.as_ref()
    }

    /// World pose of the transform the anchor is attached to
    pub fn set_parent(&mut self, parent: Isometry3<f64>) {
        self.parent = parent;
    }

    /// Calibrated base rotation of the anchor; also clears any head rotation offset
    pub fn set_base_rotation(&mut self, rotation: UnitQuaternion<f64>) {
        self.base_rotation = rotation;
        self.head_rotation = rotation;
    }

    /// Anchor position relative to the parent
    #[must_use]
    pub const fn anchor_position(&self) -> Vector3<f64> {
        self.anchor_position
    }

    /// Anchor rotation relative to the parent, without the head offset
    #[must_use]
    pub const fn anchor_rotation(&self) -> UnitQuaternion<f64> {
        self.base_rotation
    }

    /// Base rotation composed with the head rotation offset
    #[must_use]
    pub const fn head_rotation(&self) -> UnitQuaternion<f64> {
        self.head_rotation
    }

    /// Last anchor position produced from a valid pose
    #[must_use]
    pub const fn last_known_position(&self) -> Option<Vector3<f64>> {
        self.last_known_position
    }

    /// Advance one tick from the head pose, or `None` if tracking is unavailable
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingDisplayPlane`] if off-axis projection is enabled
    /// without a display plane, or [`Error::InvalidInput`] if an eye lies in
    /// the display plane.
    pub fn update(&mut self, pose: Option<&EstimatedPose>) -> Result<RigFrame> {
        self.update_anchor(pose, None);
        self.frame()
    }

    /// Like [`StereoRig::update`], with the capture time of the pose in seconds
    ///
    /// The timestamp reaches the position filter, where the One Euro filter
    /// uses it to follow the real sampling rate.
    ///
    /// # Errors
    ///
    /// Same as [`StereoRig::update`].
    pub fn update_at(&mut self, pose: Option<&EstimatedPose>, timestamp: f64) -> Result<RigFrame> {
        self.update_anchor(pose, Some(timestamp));
        self.frame()
    }

    /// Recompute the eye matrices without a new observation
    ///
    /// Anchor position, rotations and the tracking flag are left as they are.
    ///
    /// # Errors
    ///
    /// Same as [`StereoRig::update`].
    pub fn hold(&self) -> Result<RigFrame> {
        self.frame()
    }

    fn frame(&self) -> Result<RigFrame> {
        let translation = Translation3::from(self.anchor_position);
        let rig_world = self.parent * Isometry3::from_parts(translation, self.base_rotation);
        let eye_frame = if self.config.off_axis {
            rig_world
        } else {
            self.parent * Isometry3::from_parts(translation, self.head_rotation)
        };

        let left = self.compute_eye(Eye::Left, &rig_world, &eye_frame)?;
        let right = self.compute_eye(Eye::Right, &rig_world, &eye_frame)?;

        Ok(RigFrame {
            tracking: self.tracking,
            anchor_position: self.anchor_position,
            anchor_rotation: self.base_rotation,
            head_rotation: self.head_rotation,
            rig_world,
            left,
            right,
        })
    }

    fn update_anchor(&mut self, pose: Option<&EstimatedPose>, timestamp: Option<f64>) {
        let Some(pose) = pose else {
            if self.tracking {
                warn!("Head tracking lost");
            }
            self.tracking = false;

            if self.config.freeze_when_lost {
                if let Some(last) = self.last_known_position {
                    self.anchor_position = last;
                }
            }
            if self.config.apply_head_rotation {
                self.head_rotation = self.base_rotation;
            }
            return;
        };

        if !self.tracking {
            info!("Head tracking acquired");
        }
        self.tracking = true;

        let mut head = pose.position;
        if self.config.invert_x {
            head.x = -head.x;
        }
        if self.config.invert_y {
            head.y = -head.y;
        }
        if self.config.invert_z {
            head.z = -head.z;
        }

        let target = head * self.config.position_scale + self.config.head_offset();
        let filtered = match (self.filter.as_mut(), timestamp) {
            (Some(bank), Some(t)) => bank.apply_at(target, t),
            (Some(bank), None) => bank.apply(target),
            (None, _) => target,
        };
        debug!("Anchor target {target:?} filtered {filtered:?}");

        self.anchor_position = filtered;
        self.last_known_position = Some(filtered);

        if self.config.apply_head_rotation {
            let offset = pose.orientation.scaled(self.config.rotation_strength).to_rotation();
            self.head_rotation = self.base_rotation * offset;
        }
    }

    fn eye_local_rotation(&self, local_position: &Vector3<f64>, eye_frame: &Isometry3<f64>) -> UnitQuaternion<f64> {
        let target = match (self.config.toe_in, self.config.convergence_point()) {
            (true, Some(target)) => target,
            _ => return UnitQuaternion::identity(),
        };

        let eye_world = eye_frame * Point3::from(*local_position);
        let direction = target - eye_world;
        let up = eye_frame.rotation * Vector3::y();
        if direction.norm() < EPSILON || direction.cross(&up).norm() < EPSILON {
            return UnitQuaternion::identity();
        }

        // face_towards aligns +Z; the eye looks down -Z
        let world_rotation = UnitQuaternion::face_towards(&-direction, &up);
        eye_frame.rotation.inverse() * world_rotation
    }

    fn compute_eye(&self, eye: Eye, rig_world: &Isometry3<f64>, eye_frame: &Isometry3<f64>) -> Result<EyeViewpoint> {
        let local_position = Vector3::x() * (eye.lateral_sign() * self.config.ipd_m / 2.0);
        let local_rotation = self.eye_local_rotation(&local_position, eye_frame);
        let world = eye_frame * Isometry3::from_parts(Translation3::from(local_position), local_rotation);
        let camera = match eye {
            Eye::Left => &self.left_camera,
            Eye::Right => &self.right_camera,
        };

        let (view, projection, frustum) = if self.config.off_axis {
            let plane = self.plane.as_ref().ok_or_else(|| {
                error!("Off-axis projection enabled but no display plane is configured");
                Error::MissingDisplayPlane
            })?;
            let position = Point3::from(world.translation.vector);
            let edges = frustum_edges(plane, &position, camera.near, camera.far)?;
            let view = off_axis_view(plane, &rig_world.rotation, &position);
            (view, edges.to_matrix(), Some(edges))
        } else {
            (world.inverse().to_homogeneous(), camera.symmetric_projection(), None)
        };

        Ok(EyeViewpoint {
            eye,
            local_position,
            local_rotation,
            world,
            view,
            projection,
            frustum,
        })
    }
}
