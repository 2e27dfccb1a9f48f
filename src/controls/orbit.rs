//! Orbit controller: the camera circles a fixed target on a sphere.
//!
//! Mouse motion nudges the spherical angles; the deltas decay with a
//! damping factor so the orbit glides to rest. Zoom is disabled, so the
//! orbit radius stays at whatever distance the camera started at.

use cgmath::{InnerSpace, Point3};
use instant::Duration;
use winit::event::WindowEvent;

use crate::camera::Camera;

const ROTATE_SENSITIVITY: f32 = 0.005;

/// Spherical-coordinate orbit around `target`.
#[derive(Debug)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    pub damping_factor: f32,
    pub enable_zoom: bool,
    radius: f32,
    /// Azimuth around +Y, measured from +Z.
    theta: f32,
    /// Inclination from +Y, clamped away from the poles.
    phi: f32,
    theta_delta: f32,
    phi_delta: f32,
}

impl OrbitControls {
    /// Derive the starting spherical coordinates from wherever the camera
    /// currently sits relative to `target`.
    pub fn new(camera: &Camera, target: Point3<f32>) -> Self {
        let offset = camera.position - target;
        let radius = offset.magnitude().max(1e-4);
        let theta = offset.x.atan2(offset.z);
        let phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
        Self {
            target,
            damping_factor: 0.1,
            enable_zoom: false,
            radius,
            theta,
            phi,
            theta_delta: 0.0,
            phi_delta: 0.0,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn handle_window_events(&mut self, _event: &WindowEvent) {
        // Orbit is mouse-driven only; keyboard input is ignored.
    }

    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        self.theta_delta -= dx as f32 * ROTATE_SENSITIVITY;
        self.phi_delta -= dy as f32 * ROTATE_SENSITIVITY;
    }

    pub fn update(&mut self, camera: &mut Camera, _dt: Duration) {
        self.theta += self.theta_delta;
        self.phi = (self.phi + self.phi_delta).clamp(0.01, std::f32::consts::PI - 0.01);

        // Accumulated deltas decay instead of resetting, which is what
        // makes the orbit glide after the mouse stops.
        self.theta_delta *= 1.0 - self.damping_factor;
        self.phi_delta *= 1.0 - self.damping_factor;

        let sin_phi = self.phi.sin();
        camera.position = self.target
            + cgmath::Vector3::new(
                self.radius * sin_phi * self.theta.sin(),
                self.radius * self.phi.cos(),
                self.radius * sin_phi * self.theta.cos(),
            );
        camera.look_at(self.target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::MetricSpace;

    #[test]
    fn orbit_preserves_distance_to_target() {
        let mut camera = Camera::new((55.0, 0.0, -35.0));
        let target = Point3::new(0.0, 0.0, 0.0);
        camera.look_at(target);
        let mut orbit = OrbitControls::new(&camera, target);
        let start = orbit.radius();

        orbit.handle_mouse(120.0, -45.0);
        for _ in 0..120 {
            orbit.update(&mut camera, Duration::from_millis(16));
        }
        let dist = camera.position.distance(target);
        assert!((dist - start).abs() < 1e-2);
    }

    #[test]
    fn orbit_keeps_looking_at_target() {
        let mut camera = Camera::new((0.0, 20.0, 80.0));
        let target = Point3::new(0.0, 0.0, 0.0);
        camera.look_at(target);
        let mut orbit = OrbitControls::new(&camera, target);

        orbit.handle_mouse(300.0, 80.0);
        for _ in 0..30 {
            orbit.update(&mut camera, Duration::from_millis(16));
        }
        let expected = (target - camera.position).normalize();
        assert!((camera.forward() - expected).magnitude() < 1e-4);
    }

    #[test]
    fn deltas_decay_toward_zero() {
        let mut camera = Camera::new((0.0, 0.0, 50.0));
        let target = Point3::new(0.0, 0.0, 0.0);
        camera.look_at(target);
        let mut orbit = OrbitControls::new(&camera, target);

        orbit.handle_mouse(100.0, 0.0);
        for _ in 0..500 {
            orbit.update(&mut camera, Duration::from_millis(16));
        }
        let before = camera.position;
        orbit.update(&mut camera, Duration::from_millis(16));
        assert!((camera.position.x - before.x).abs() < 1e-4);
    }
}
