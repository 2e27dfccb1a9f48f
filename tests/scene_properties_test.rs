//! CPU-side behavior checks against the public crate API. Nothing here
//! needs a GPU; render output itself is covered by running the demo.

use astroscene::camera::{Camera, CameraUniform, Projection};
use astroscene::controls::{FlyControls, Navigation, NavigationMode};
use astroscene::environment::PROBE_ERROR_MESSAGE;
use astroscene::scene::flare::{
    edge_fade, flare_opacities, layout_flare, tetrahedron_points, FLARE_OPACITY_RANGES,
};
use astroscene::scene::rng::SceneRng;
use astroscene::scene::{Animation, CUBE_SPIN_STEP, PLANET_SPIN_MAX, SPECK_COUNT};
use cgmath::{Deg, InnerSpace, Matrix4, MetricSpace, Point3, Vector2};
use instant::Duration;

#[test]
fn flare_tetrahedron_scales_uniformly() {
    for m in [1.0, 250.0, 1000.0] {
        let pts = tetrahedron_points(m);
        let edge = pts[0].distance(pts[1]);
        for i in 0..4 {
            for j in (i + 1)..4 {
                assert!((pts[i].distance(pts[j]) - edge).abs() < edge * 1e-5);
            }
        }
        assert!((edge - m * 2.0 * 2.0_f32.sqrt()).abs() < edge * 1e-5);
    }
}

#[test]
fn flare_opacities_cover_all_four_bands() {
    let mut rng = SceneRng::seeded(1234);
    for _ in 0..500 {
        for (value, (lo, hi)) in flare_opacities(&mut rng).iter().zip(FLARE_OPACITY_RANGES) {
            assert!(*value >= lo && *value < hi);
        }
    }
}

#[test]
fn cube_rotation_is_a_fixed_increment_per_frame() {
    let mut rng = SceneRng::seeded(0);
    let mut animation = Animation::new(2);
    for frame in 1..=100u32 {
        animation.advance(&mut rng);
        assert!((animation.cube_spin.0 - frame as f32 * CUBE_SPIN_STEP).abs() < 1e-4);
        assert!((animation.cube_spin.1 - frame as f32 * CUBE_SPIN_STEP).abs() < 1e-4);
    }
}

#[test]
fn planet_rotation_steps_stay_below_the_bound() {
    let mut rng = SceneRng::seeded(77);
    let mut animation = Animation::new(4);
    let mut previous = animation.planet_spin.clone();
    for _ in 0..200 {
        animation.advance(&mut rng);
        for (now, before) in animation.planet_spin.iter().zip(&previous) {
            for (a, b) in [(now.x, before.x), (now.y, before.y), (now.z, before.z)] {
                let step = a - b;
                assert!(step >= 0.0 && step < PLANET_SPIN_MAX);
            }
        }
        previous = animation.planet_spin.clone();
    }
}

#[test]
fn resize_recomputes_the_projection_aspect() {
    let mut projection = Projection::new(1280, 720, Deg(80.0), 1.0, 500.0);
    assert_eq!(projection.aspect, 1280.0 / 720.0);
    projection.resize(500, 1000);
    assert_eq!(projection.aspect, 0.5);

    let mut camera = Camera::new((55.0, 0.0, -35.0));
    camera.look_at(Point3::new(0.0, 0.0, 0.0));
    let mut uniform = CameraUniform::new();
    uniform.update_view_proj(&camera, &projection);
}

#[test]
fn freeze_is_a_pure_toggle() {
    let mut fly = FlyControls::new(50.0, std::f32::consts::PI / 6.0);
    assert!(!fly.frozen());
    fly.set_frozen(true);
    fly.set_frozen(true);
    assert!(fly.frozen());
    fly.set_frozen(false);
    assert!(!fly.frozen());

    // While frozen the camera cannot move, whatever time passes.
    fly.set_frozen(true);
    let mut camera = Camera::new((55.0, 0.0, -35.0));
    camera.look_at(Point3::new(0.0, 0.0, 0.0));
    let before = camera.position;
    fly.update(&mut camera, Duration::from_secs(5));
    assert_eq!(camera.position, before);
}

#[test]
fn navigation_ships_with_fly_active_and_orbit_inert() {
    let mut camera = Camera::new((55.0, 0.0, -35.0));
    camera.look_at(Point3::new(0.0, 0.0, 0.0));
    let mut navigation = Navigation::new(&camera);
    assert_eq!(navigation.mode(), NavigationMode::Fly);

    // Switching is a supported, explicit operation.
    navigation.set_mode(NavigationMode::Orbit);
    assert_eq!(navigation.mode(), NavigationMode::Orbit);

    // Orbit keeps the distance to the origin it started with.
    let start = camera.position.distance(Point3::new(0.0, 0.0, 0.0));
    navigation.handle_mouse(50.0, 20.0);
    for _ in 0..60 {
        navigation.update(&mut camera, Duration::from_millis(16));
    }
    let after = camera.position.distance(Point3::new(0.0, 0.0, 0.0));
    assert!((after - start).abs() < 1e-2);
}

#[test]
fn probe_failure_message_names_the_requirement() {
    assert!(PROBE_ERROR_MESSAGE.contains("graphics adapter"));
}

#[test]
fn flares_vanish_offscreen_and_speck_count_is_fixed() {
    assert_eq!(SPECK_COUNT, 15_000);
    assert_eq!(edge_fade(Vector2::new(2.0, 0.0)), 0.0);

    let view_proj: Matrix4<f32> = cgmath::perspective(Deg(80.0), 16.0 / 9.0, 1.0, 500.0);
    let mut out = Vec::new();
    // Far off to the side: projected outside the viewport, fully faded.
    layout_flare(
        Point3::new(400.0, 0.0, -10.0),
        [1.0, 0.5, 0.2],
        [0.05, 0.2, 0.1, 0.35],
        &view_proj,
        &mut out,
    );
    assert!(out.is_empty());

    // Dead ahead: all four elements laid out toward screen center.
    layout_flare(
        Point3::new(0.0, 0.0, -100.0),
        [1.0, 0.5, 0.2],
        [0.05, 0.2, 0.1, 0.35],
        &view_proj,
        &mut out,
    );
    assert_eq!(out.len(), 4);
    for element in &out {
        assert!(element.clip_pos.magnitude() < 1e-4);
    }
}
