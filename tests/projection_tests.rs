//! Tests for off-axis and symmetric projection math


use approx::assert_relative_eq;
use nalgebra::{Point3, Translation3, UnitQuaternion, Vector2, Vector3, Vector4};
use stereo_head_tracking::{
    projection::{frustum, frustum_edges, off_axis_view, DisplayPlane, EyeCamera},
    Error,
};
use test_helpers::desk_monitor;

fn to_ndc(clip: Vector4<f64>) -> Vector3<f64> {
    Vector3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w)
}

/// A 0.6 x 0.4 m screen centered at (0, 1.6, -0.6), yawed by `yaw_deg` about +Y
fn yawed_screen(yaw_deg: f64) -> DisplayPlane {
    let rotation = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw_deg.to_radians());
    let center = Point3::new(0.0, 1.6, -0.6);
    let corner = |x: f64, y: f64| center + rotation * Vector3::new(x, y, 0.0);
    DisplayPlane::from_corners(corner(-0.3, -0.2), corner(0.3, -0.2), corner(-0.3, 0.2)).unwrap()
}

#[test]
fn test_frustum_matrix_layout() {
    let m = frustum(-1.0, 3.0, -2.0, 2.0, 1.0, 11.0);

    assert_relative_eq!(m[(0, 0)], 0.5);
    assert_relative_eq!(m[(0, 2)], 0.5);
    assert_relative_eq!(m[(1, 1)], 0.5);
    assert_relative_eq!(m[(1, 2)], 0.0);
    assert_relative_eq!(m[(2, 2)], -1.2);
    assert_relative_eq!(m[(2, 3)], -2.2);
    assert_relative_eq!(m[(3, 2)], -1.0);
    assert_relative_eq!(m[(3, 3)], 0.0);
}

#[test]
fn test_symmetric_frustum_matches_perspective() {
    let camera = EyeCamera::default();
    let top = camera.near * (camera.fov_y_deg.to_radians() / 2.0).tan();
    let right = top * camera.aspect;

    let expected = frustum(-right, right, -top, top, camera.near, camera.far);
    assert_relative_eq!(camera.symmetric_projection(), expected, epsilon = 1e-9);
}

#[test]
fn test_centered_eye_symmetric_edges() {
    let plane = desk_monitor().unwrap();
    let eye = Point3::new(0.0, 1.6, 0.0);
    let edges = frustum_edges(&plane, &eye, 0.3, 1000.0).unwrap();

    assert!(edges.is_symmetric(1e-12));
    assert_relative_eq!(edges.left, -edges.right, epsilon = 1e-12);
    // 0.26 m half-width at 0.6 m distance, scaled to the near plane
    assert_relative_eq!(edges.right, 0.26 * 0.3 / 0.6, epsilon = 1e-12);
    assert_relative_eq!(edges.top, 0.15 * 0.3 / 0.6, epsilon = 1e-12);
}

#[test]
fn test_lateral_eye_shifts_frustum() {
    let plane = desk_monitor().unwrap();
    let centered = frustum_edges(&plane, &Point3::new(0.0, 1.6, 0.0), 0.3, 1000.0).unwrap();
    let shifted = frustum_edges(&plane, &Point3::new(0.1, 1.6, 0.0), 0.3, 1000.0).unwrap();

    assert!(!shifted.is_symmetric(1e-6));
    assert!(shifted.left < centered.left);
    assert!(shifted.right < centered.right);
    assert_relative_eq!(shifted.right - shifted.left, centered.right - centered.left, epsilon = 1e-12);
}

#[test]
fn test_closer_eye_widens_frustum() {
    let plane = desk_monitor().unwrap();
    let far = frustum_edges(&plane, &Point3::new(0.0, 1.6, 0.0), 0.3, 1000.0).unwrap();
    let near = frustum_edges(&plane, &Point3::new(0.0, 1.6, -0.3), 0.3, 1000.0).unwrap();

    assert_relative_eq!(near.right, 2.0 * far.right, epsilon = 1e-12);
}

#[test]
fn test_eye_in_plane_rejected() {
    let plane = desk_monitor().unwrap();
    match frustum_edges(&plane, &Point3::new(0.0, 1.6, -0.6), 0.3, 1000.0) {
        Err(Error::InvalidInput(_)) => {}
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
}

#[test]
fn test_degenerate_plane_rejected() {
    let p = Point3::new(0.0, 1.0, -1.0);
    match DisplayPlane::from_corners(p, Point3::new(1.0, 1.0, -1.0), Point3::new(3.0, 1.0, -1.0)) {
        Err(Error::DegeneratePlane(_)) => {}
        other => panic!("Expected DegeneratePlane, got {other:?}"),
    }
}

#[test]
fn test_axis_aligned_view_is_translation() {
    let plane = desk_monitor().unwrap();
    let eye = Point3::new(0.05, 1.62, -0.1);
    let view = off_axis_view(&plane, &UnitQuaternion::identity(), &eye);

    let origin = view * eye.to_homogeneous();
    assert_relative_eq!(origin, Vector4::new(0.0, 0.0, 0.0, 1.0), epsilon = 1e-12);
    assert_relative_eq!(view, Translation3::from(-eye.coords).to_homogeneous(), epsilon = 1e-12);
}

#[test]
fn test_plane_corners_map_to_ndc_edges() {
    for yaw in [0.0, 30.0, -45.0] {
        let plane = yawed_screen(yaw);
        let eye = plane.center() + plane.normal() * 0.7 + plane.right() * 0.08 - plane.up() * 0.05;
        let edges = frustum_edges(&plane, &eye, 0.3, 1000.0).unwrap();
        let clip_from_world = edges.to_matrix() * off_axis_view(&plane, plane.rotation(), &eye);

        let bl = to_ndc(clip_from_world * plane.bottom_left().to_homogeneous());
        let br = to_ndc(clip_from_world * plane.bottom_right().to_homogeneous());
        let tl = to_ndc(clip_from_world * plane.top_left().to_homogeneous());

        assert_relative_eq!(bl.xy(), Vector2::new(-1.0, -1.0), epsilon = 1e-9);
        assert_relative_eq!(br.xy(), Vector2::new(1.0, -1.0), epsilon = 1e-9);
        assert_relative_eq!(tl.xy(), Vector2::new(-1.0, 1.0), epsilon = 1e-9);
        // The screen sits between the clip planes
        assert!(bl.z > -1.0 && bl.z < 1.0);
    }
}
