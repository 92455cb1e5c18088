//! End-to-end tests driving the pipeline through configuration


use approx::assert_relative_eq;
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector2, Vector3};
use stereo_head_tracking::{
    config::{Config, DisplayPlaneConfig},
    filters::FilterKind,
    observation::DetectorFrame,
    replay, Error,
};
use test_helpers::{assert_vector_finite, frame_at};

fn desk_plane_config() -> DisplayPlaneConfig {
    DisplayPlaneConfig {
        bottom_left: [-0.26, 1.45, -0.6],
        bottom_right: [0.26, 1.45, -0.6],
        top_left: [-0.26, 1.75, -0.6],
    }
}

fn unfiltered_config() -> Config {
    let mut config = Config::default();
    config.filter.enabled = false;
    config
}

#[test]
fn test_anchor_follows_head_without_filter() {
    let mut pipeline = unfiltered_config().build_pipeline().unwrap();
    let output = pipeline.tick(Some(&frame_at(0.5, 0.5, 100.0, 640, 480)), false).unwrap();

    let z = -492.0 * 0.064 / 100.0;
    assert!(output.rig.tracking);
    assert_relative_eq!(output.rig.anchor_position, Vector3::new(0.0, 1.6, 0.3 * z), epsilon = 1e-12);
    assert_relative_eq!(output.pose.unwrap().position, Vector3::new(0.0, 0.0, z), epsilon = 1e-12);
    assert_eq!(output.tick, 1);
}

#[test]
fn test_tracking_loss_freezes_anchor() {
    let mut pipeline = Config::default().build_pipeline().unwrap();
    let mut last = None;
    for i in 0..20 {
        let cx = 0.5 + 0.01 * f64::from(i);
        last = Some(pipeline.tick(Some(&frame_at(cx, 0.5, 90.0, 640, 480)), false).unwrap());
    }
    let tracked = last.unwrap();

    let lost = pipeline.tick(Some(&DetectorFrame::empty(640, 480)), false).unwrap();
    assert!(!lost.rig.tracking);
    assert!(lost.pose.is_none());
    assert_eq!(lost.rig.anchor_position, tracked.rig.anchor_position);
    assert_eq!(lost.orientation, tracked.orientation);
    assert_eq!(lost.rig.head_rotation, UnitQuaternion::identity());
}

#[test]
fn test_missing_frame_holds_previous_state() {
    let mut config = Config::default();
    config.estimator.rotation_smoothing = 0.0;
    let mut pipeline = config.build_pipeline().unwrap();

    pipeline.tick(Some(&frame_at(0.5, 0.5, 80.0, 640, 480)), false).unwrap();
    let turned = pipeline.tick(Some(&frame_at(0.8, 0.4, 80.0, 640, 480)), false).unwrap();
    assert!(turned.rig.head_rotation.angle() > 0.05);

    // Renderer ticks faster than the detector delivers frames
    for _ in 0..2 {
        let idle = pipeline.tick(None, false).unwrap();
        assert!(idle.pose.is_none());
        assert!(idle.rig.tracking);
        assert_eq!(idle.rig.anchor_position, turned.rig.anchor_position);
        assert_eq!(idle.rig.head_rotation, turned.rig.head_rotation);
        assert_eq!(idle.rig.left.view, turned.rig.left.view);
    }

    let resumed = pipeline.tick(Some(&frame_at(0.8, 0.4, 80.0, 640, 480)), false).unwrap();
    assert!(resumed.rig.tracking);
}

#[test]
fn test_degenerate_detection_is_loss() {
    let mut pipeline = unfiltered_config().build_pipeline().unwrap();
    let tracked = pipeline.tick(Some(&frame_at(0.5, 0.5, 80.0, 640, 480)), false).unwrap();
    let degenerate = pipeline.tick(Some(&frame_at(0.5, 0.5, 0.5, 640, 480)), false).unwrap();

    assert!(!degenerate.rig.tracking);
    assert_eq!(degenerate.rig.anchor_position, tracked.rig.anchor_position);
    assert_vector_finite(&degenerate.rig.anchor_position);
}

#[test]
fn test_recalibration_on_rising_edge_only() {
    let mut config = unfiltered_config();
    config.estimator.rotation_smoothing = 0.0;
    let mut pipeline = config.build_pipeline().unwrap();

    pipeline.tick(Some(&frame_at(0.5, 0.5, 80.0, 640, 480)), false).unwrap();
    let turned = pipeline.tick(Some(&frame_at(0.7, 0.5, 80.0, 640, 480)), false).unwrap();
    assert!(turned.orientation.yaw_deg.abs() > 1.0);

    let first = pipeline.tick(Some(&frame_at(0.7, 0.5, 80.0, 640, 480)), true).unwrap();
    assert!(first.recalibrated);
    assert_eq!(first.orientation.yaw_deg, 0.0);

    // Holding the input does not recalibrate again
    let held = pipeline.tick(Some(&frame_at(0.8, 0.5, 80.0, 640, 480)), true).unwrap();
    assert!(!held.recalibrated);
    assert!(held.orientation.yaw_deg.abs() > 1.0);

    pipeline.tick(Some(&frame_at(0.8, 0.5, 80.0, 640, 480)), false).unwrap();
    let again = pipeline.tick(Some(&frame_at(0.8, 0.5, 80.0, 640, 480)), true).unwrap();
    assert!(again.recalibrated);
    assert_eq!(pipeline.ticks(), 6);
}

#[test]
fn test_off_axis_requires_display_plane() {
    let mut config = Config::default();
    config.rig.off_axis = true;
    assert!(matches!(config.build_pipeline(), Err(Error::MissingDisplayPlane)));

    // Removing the plane at runtime surfaces the error on the next tick
    config.display_plane = Some(desk_plane_config());
    let mut pipeline = config.build_pipeline().unwrap();
    pipeline.rig_mut().set_display_plane(None);
    assert!(matches!(
        pipeline.tick(Some(&frame_at(0.5, 0.5, 80.0, 640, 480)), false),
        Err(Error::MissingDisplayPlane)
    ));
}

#[test]
fn test_off_axis_eyes_mirror_when_centered() {
    let mut config = unfiltered_config();
    config.rig.off_axis = true;
    config.display_plane = Some(desk_plane_config());
    let mut pipeline = config.build_pipeline().unwrap();

    let output = pipeline.tick(Some(&frame_at(0.5, 0.5, 80.0, 640, 480)), false).unwrap();
    let left = output.rig.left.frustum.unwrap();
    let right = output.rig.right.frustum.unwrap();

    assert!(!left.is_symmetric(1e-6));
    assert_relative_eq!(left.left, -right.right, epsilon = 1e-12);
    assert_relative_eq!(left.right, -right.left, epsilon = 1e-12);
    assert_relative_eq!(left.top, right.top, epsilon = 1e-12);
    assert_eq!(output.rig.left.projection, left.to_matrix());
}

#[test]
fn test_off_axis_follows_head_motion() {
    let mut config = unfiltered_config();
    config.rig.off_axis = true;
    config.display_plane = Some(desk_plane_config());
    let mut pipeline = config.build_pipeline().unwrap();

    let centered = pipeline.tick(Some(&frame_at(0.5, 0.5, 80.0, 640, 480)), false).unwrap();
    let moved = pipeline.tick(Some(&frame_at(0.8, 0.5, 80.0, 640, 480)), false).unwrap();

    let before = centered.rig.left.frustum.unwrap();
    let after = moved.rig.left.frustum.unwrap();
    assert!((after.left - before.left).abs() > 1e-4);
}

#[test]
fn test_off_axis_corners_stay_registered_while_head_turns() {
    let mut config = unfiltered_config();
    config.estimator.rotation_smoothing = 0.0;
    config.rig.off_axis = true;
    config.display_plane = Some(desk_plane_config());
    let plane = desk_plane_config().to_plane().unwrap();
    let mut pipeline = config.build_pipeline().unwrap();

    pipeline.tick(Some(&frame_at(0.5, 0.5, 80.0, 640, 480)), false).unwrap();
    let output = pipeline.tick(Some(&frame_at(0.8, 0.35, 80.0, 640, 480)), false).unwrap();
    assert!(output.orientation.yaw_deg.abs() > 1.0);
    assert!(output.rig.head_rotation.angle() > 0.05);

    for eye in [&output.rig.left, &output.rig.right] {
        let clip_from_world = eye.projection * eye.view;
        let expected = [
            (plane.bottom_left(), Vector2::new(-1.0, -1.0)),
            (plane.bottom_right(), Vector2::new(1.0, -1.0)),
            (plane.top_left(), Vector2::new(-1.0, 1.0)),
        ];
        for (corner, ndc) in expected {
            let clip = clip_from_world * corner.to_homogeneous();
            assert_relative_eq!(Vector2::new(clip.x / clip.w, clip.y / clip.w), ndc, epsilon = 1e-9);
        }
    }
}

#[test]
fn test_timestamps_drive_one_euro_rate() {
    let start = frame_at(0.5, 0.5, 100.0, 640, 480);
    let closer = frame_at(0.5, 0.5, 50.0, 640, 480);

    let mut nominal = Config::default().build_pipeline().unwrap();
    nominal.tick(Some(&start), false).unwrap();
    let at_60 = nominal.tick(Some(&closer), false).unwrap();

    let mut timed = Config::default().build_pipeline().unwrap();
    timed.tick_at(Some(&start), false, 10.0).unwrap();
    let at_30 = timed.tick_at(Some(&closer), false, 10.0 + 1.0 / 30.0).unwrap();

    // Zero speed coefficient: a fixed 1 Hz low-pass at the measured rate
    let alpha = |rate: f64| 1.0 / (1.0 + rate / (2.0 * std::f64::consts::PI));
    let first_z = 0.3 * (-492.0 * 0.064 / 100.0);
    let target_z = 0.3 * (-492.0 * 0.064 / 50.0);
    assert_relative_eq!(at_60.rig.anchor_position.z, first_z + (target_z - first_z) * alpha(60.0), epsilon = 1e-9);
    assert_relative_eq!(at_30.rig.anchor_position.z, first_z + (target_z - first_z) * alpha(30.0), epsilon = 1e-9);
}

#[test]
fn test_parent_transform_composition() {
    let mut pipeline = unfiltered_config().build_pipeline().unwrap();
    let parent = Isometry3::from_parts(
        Translation3::new(10.0, 0.0, 5.0),
        UnitQuaternion::from_axis_angle(&Vector3::y_axis(), std::f64::consts::FRAC_PI_2),
    );
    pipeline.rig_mut().set_parent(parent);

    let output = pipeline.tick(None, false).unwrap();
    let expected = parent * Point3::new(0.0, 1.6, 0.0);
    assert_relative_eq!(Point3::from(output.head_world_pose().translation.vector), expected, epsilon = 1e-12);

    let eye_gap = output.rig.right.world_position() - output.rig.left.world_position();
    assert_relative_eq!(eye_gap.norm(), 0.064, epsilon = 1e-12);
    // Rig +X is world -Z after a quarter turn about +Y
    assert_relative_eq!(eye_gap.normalize(), -Vector3::z(), epsilon = 1e-12);
}

#[test]
fn test_switching_filter_keeps_running() {
    let mut pipeline = Config::default().build_pipeline().unwrap();
    for (i, frame) in replay::synthetic_sweep(90, 640, 480).iter().enumerate() {
        if i % 30 == 0 {
            pipeline.select_filter(FilterKind::ALL[(i / 30) % FilterKind::ALL.len()]);
        }
        let output = pipeline.tick(frame.as_ref(), false).unwrap();
        assert_vector_finite(&output.rig.anchor_position);
        assert_vector_finite(&output.rig.left.world_position().coords);
    }
}

#[test]
fn test_reset_filters_seeds_anchor() {
    let mut pipeline = Config::default().build_pipeline().unwrap();
    pipeline.tick(Some(&frame_at(0.3, 0.5, 60.0, 640, 480)), false).unwrap();

    let seed = Vector3::new(0.0, 1.6, -0.1);
    pipeline.reset_filters(seed);
    pipeline.select_filter(FilterKind::SingleExponential);
    let output = pipeline.tick(Some(&frame_at(0.5, 0.5, 60.0, 640, 480)), false).unwrap();

    // One step of alpha = 0.03 away from the seed
    let target = Vector3::new(0.0, 1.6, 0.3 * (-492.0 * 0.064 / 60.0));
    assert_relative_eq!(output.rig.anchor_position, seed + (target - seed) * 0.03, epsilon = 1e-9);
}

#[test]
fn test_replayed_log_matches_direct_frames() {
    let log = "0.45 0.5 0.55 0.5 640 480\n-\n.\n0.40 0.5 0.52 0.5 640 480\n";
    let ticks = replay::parse_log(log).unwrap();
    let mut pipeline = unfiltered_config().build_pipeline().unwrap();

    let tracking: Vec<bool> = ticks
        .iter()
        .map(|frame| pipeline.tick(frame.as_ref(), false).unwrap().rig.tracking)
        .collect();
    assert_eq!(tracking, vec![true, false, false, true]);
}
