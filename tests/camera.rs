use glam::{Mat4, Vec3, Vec4};
use verlet_swarm::renderer::camera::{CameraConfig, CameraController, CameraUniform};
use verlet_swarm::renderer::frame_context::FrameContext;

#[test]
fn orbit_starts_on_the_x_axis() {
    let controller = CameraController::new(CameraConfig::default());
    assert!(controller.eye(0).abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-6));
}

#[test]
fn orbit_follows_the_ellipse() {
    let controller = CameraController::new(CameraConfig::default());
    let tick = 1234;
    let t = tick as f32 * 0.001;
    let eye = controller.eye(tick);

    assert!(eye.abs_diff_eq(Vec3::new(5.0 * t.cos(), 0.0, 10.0 * t.sin()), 1e-5));
    assert!(((eye.x / 5.0).powi(2) + (eye.z / 10.0).powi(2) - 1.0).abs() < 1e-5);
}

#[test]
fn view_looks_at_the_origin() {
    let controller = CameraController::new(CameraConfig::default());
    for tick in [0, 500, 3000] {
        let view = controller.view(tick);
        let origin = view.transform_point3(Vec3::ZERO);
        // In view space the origin sits straight ahead, down -z.
        assert!(origin.x.abs() < 1e-4 && origin.y.abs() < 1e-4, "{origin:?}");
        assert!(origin.z < 0.0);
        assert!((origin.length() - controller.eye(tick).length()).abs() < 1e-4);
    }
}

#[test]
fn view_is_a_function_of_the_tick() {
    let controller = CameraController::new(CameraConfig::default());
    assert_eq!(controller.view(42), controller.view(42));
    assert_ne!(controller.view(42), controller.view(43));
}

#[test]
fn projection_matches_the_lens() {
    let controller = CameraController::new(CameraConfig::default());
    let expected = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 1280.0 / 720.0, 0.125, 1000.0);
    assert_eq!(controller.projection(1280, 720), expected);
}

#[test]
fn projection_maps_near_and_far_to_the_depth_range() {
    let projection = CameraController::new(CameraConfig::default()).projection(800, 600);

    let near = projection * Vec4::new(0.0, 0.0, -0.125, 1.0);
    let far = projection * Vec4::new(0.0, 0.0, -1000.0, 1.0);
    assert!((near.z / near.w).abs() < 1e-5);
    assert!((far.z / far.w - 1.0).abs() < 1e-4);
}

#[test]
fn zero_height_viewport_is_clamped() {
    let projection = CameraController::new(CameraConfig::default()).projection(640, 0);
    assert!(projection.is_finite());
}

#[test]
fn uniform_carries_both_matrices() {
    let controller = CameraController::new(CameraConfig::default());
    let frame = FrameContext::new(10, 640, 480);
    let uniform = controller.uniform(&frame);

    assert_eq!(uniform.view(), controller.view(10));
    assert_eq!(uniform.projection(), controller.projection(640, 480));
    assert_eq!(uniform, CameraUniform::new(&controller.view(10), &controller.projection(640, 480)));
}

#[test]
fn frame_context_advances_one_tick() {
    let frame = FrameContext::new(0, 320, 200);
    let next = frame.next();
    assert_eq!(next.tick, 1);
    assert_eq!((next.viewport_width, next.viewport_height), (320, 200));
}

#[test]
fn custom_orbit_is_respected() {
    let config = CameraConfig { orbit_radius_x: 2.0, orbit_radius_z: 2.0, orbit_rate: std::f32::consts::FRAC_PI_2, ..Default::default() };
    let controller = CameraController::new(config);
    assert!(controller.eye(1).abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-5));
}
