//! Per-tick pipeline: detector frame -> head pose -> filtered rig -> eye matrices.
//!
//! One call to [`HeadTrackingPipeline::tick`] runs every stage synchronously
//! and returns a [`TickOutput`] snapshot. Downstream consumers (renderer,
//! audio spatialization) read that snapshot rather than the live components.

use crate::{
    filters::FilterKind,
    observation::DetectorFrame,
    pose_estimation::{EstimatedPose, HeadOrientation, HeadPoseEstimator},
    stereo_rig::{RigFrame, StereoRig},
    Result,
};
use log::debug;
use nalgebra::{Isometry3, Vector3};

/// Turns a held boolean into a single pulse on its rising edge
#[derive(Debug, Clone, Copy, Default)]
pub struct RecalibrationTrigger {
    previous: bool,
}

impl RecalibrationTrigger {
    /// Feed the current level; true only on a false -> true transition
    pub fn rising(&mut self, level: bool) -> bool {
        let fired = level && !self.previous;
        self.previous = level;
        fired
    }
}

/// Immutable result of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutput {
    /// Monotonic tick counter, starting at 1
    pub tick: u64,
    /// Head pose estimated this tick, `None` without a new frame or when tracking was unavailable
    pub pose: Option<EstimatedPose>,
    /// Smoothed orientation, held across tracking loss
    pub orientation: HeadOrientation,
    /// Recalibration happened at the start of this tick
    pub recalibrated: bool,
    /// Rig and per-eye matrices
    pub rig: RigFrame,
}

impl TickOutput {
    /// World pose of the head anchor, for listeners such as audio spatialization
    #[must_use]
    pub const fn head_world_pose(&self) -> &Isometry3<f64> {
        &self.rig.rig_world
    }
}

/// The three-stage head tracking pipeline
pub struct HeadTrackingPipeline {
    estimator: HeadPoseEstimator,
    rig: StereoRig,
    trigger: RecalibrationTrigger,
    tick: u64,
}

impl HeadTrackingPipeline {
    /// Wire an estimator to a rig
    #[must_use]
    pub fn new(estimator: HeadPoseEstimator, rig: StereoRig) -> Self {
        Self {
            estimator,
            rig,
            trigger: RecalibrationTrigger::default(),
            tick: 0,
        }
    }

    /// The pose estimator
    #[must_use]
    pub const fn estimator(&self) -> &HeadPoseEstimator {
        &self.estimator
    }

    /// The stereo rig
    #[must_use]
    pub const fn rig(&self) -> &StereoRig {
        &self.rig
    }

    /// Number of ticks run so far
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.tick
    }

    /// Mutable stereo rig, e.g. to move its parent or swap the display plane
    pub fn rig_mut(&mut self) -> &mut StereoRig {
        &mut self.rig
    }

    /// Select the active position filter, if a filter bank is present
    pub fn select_filter(&mut self, kind: FilterKind) {
        if let Some(bank) = self.rig.filter_bank_mut() {
            bank.select(kind);
        }
    }

    /// Clear and reseed every position filter with `seed`
    pub fn reset_filters(&mut self, seed: Vector3<f64>) {
        if let Some(bank) = self.rig.filter_bank_mut() {
            bank.reset_state(seed);
        }
    }

    /// Run one tick
    ///
    /// `frame` is `None` when the detector delivered nothing new this tick;
    /// the rig then keeps its previous pose and tracking state. An empty
    /// frame means the detector ran and found no face. `recalibrate` is the
    /// current level of the recalibration input; only its rising edge
    /// recalibrates.
    ///
    /// # Errors
    ///
    /// Propagates configuration errors from the rig, such as off-axis
    /// projection without a display plane.
    pub fn tick(&mut self, frame: Option<&DetectorFrame>, recalibrate: bool) -> Result<TickOutput> {
        self.advance(frame, recalibrate, None)
    }

    /// Like [`HeadTrackingPipeline::tick`], with the frame's capture time in seconds
    ///
    /// # Errors
    ///
    /// Same as [`HeadTrackingPipeline::tick`].
    pub fn tick_at(&mut self, frame: Option<&DetectorFrame>, recalibrate: bool, timestamp: f64) -> Result<TickOutput> {
        self.advance(frame, recalibrate, Some(timestamp))
    }

    fn advance(&mut self, frame: Option<&DetectorFrame>, recalibrate: bool, timestamp: Option<f64>) -> Result<TickOutput> {
        self.tick += 1;

        let recalibrated = self.trigger.rising(recalibrate);
        if recalibrated {
            self.estimator.recalibrate();
        }

        let (pose, rig) = match frame {
            None => {
                debug!("Tick {}: no new detector frame, holding rig", self.tick);
                (None, self.rig.hold()?)
            }
            Some(frame) => {
                let pose = self.estimator.estimate_frame(Some(frame));
                let rig = match timestamp {
                    Some(t) => self.rig.update_at(pose.as_ref(), t)?,
                    None => self.rig.update(pose.as_ref())?,
                };
                (pose, rig)
            }
        };
        debug!(
            "Tick {}: tracking {}, anchor {:?}",
            self.tick, rig.tracking, rig.anchor_position
        );

        Ok(TickOutput {
            tick: self.tick,
            pose,
            orientation: self.estimator.orientation(),
            recalibrated,
            rig,
        })
    }
}
