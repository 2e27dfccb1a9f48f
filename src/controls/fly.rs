//! Six-degrees-of-freedom fly controller with damping and a freeze flag.
//!
//! WASD translates in the camera plane, R/F move up/down, Q/E roll and the
//! arrow keys (or mouse motion) pitch/yaw. Velocities ease toward the
//! current input with exponential damping so releasing a key coasts to a
//! stop instead of halting. The freeze flag suspends all motion while the
//! pointer is outside the viewport.

use cgmath::{InnerSpace, Quaternion, Rad, Rotation3, Vector3, Zero};
use instant::Duration;
use winit::{
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

/// Exponential smoothing factor per second for velocity easing.
const DAMPING: f32 = 5.0;
/// Scales raw mouse counts into rotational impulse.
const MOUSE_SENSITIVITY: f32 = 0.002;

#[derive(Debug, Default)]
struct MoveState {
    forward: f32,
    back: f32,
    left: f32,
    right: f32,
    up: f32,
    down: f32,
    pitch_up: f32,
    pitch_down: f32,
    yaw_left: f32,
    yaw_right: f32,
    roll_left: f32,
    roll_right: f32,
}

#[derive(Debug)]
pub struct FlyControls {
    pub movement_speed: f32,
    pub roll_speed: f32,
    pub auto_forward: bool,
    /// When false, mouse motion steers continuously (no button required).
    pub drag_to_look: bool,
    frozen: bool,
    state: MoveState,
    velocity: Vector3<f32>,
    rot_velocity: Vector3<f32>,
    mouse_impulse: (f32, f32),
}

impl FlyControls {
    pub fn new(movement_speed: f32, roll_speed: f32) -> Self {
        Self {
            movement_speed,
            roll_speed,
            auto_forward: false,
            drag_to_look: false,
            frozen: false,
            state: MoveState::default(),
            velocity: Vector3::zero(),
            rot_velocity: Vector3::zero(),
            mouse_impulse: (0.0, 0.0),
        }
    }

    pub fn frozen(&self) -> bool {
        self.frozen
    }

    /// Freeze or unfreeze all camera motion. Toggled by pointer enter/leave
    /// on the viewport; changes nothing but the flag itself.
    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state,
                    ..
                },
            ..
        } = event
        {
            let pressed = if *state == ElementState::Pressed { 1.0 } else { 0.0 };
            match code {
                KeyCode::KeyW => self.state.forward = pressed,
                KeyCode::KeyS => self.state.back = pressed,
                KeyCode::KeyA => self.state.left = pressed,
                KeyCode::KeyD => self.state.right = pressed,
                KeyCode::KeyR => self.state.up = pressed,
                KeyCode::KeyF => self.state.down = pressed,
                KeyCode::ArrowUp => self.state.pitch_up = pressed,
                KeyCode::ArrowDown => self.state.pitch_down = pressed,
                KeyCode::ArrowLeft => self.state.yaw_left = pressed,
                KeyCode::ArrowRight => self.state.yaw_right = pressed,
                KeyCode::KeyQ => self.state.roll_left = pressed,
                KeyCode::KeyE => self.state.roll_right = pressed,
                _ => (),
            }
        }
    }

    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        if self.drag_to_look {
            // Steering by motion is disabled; a drag gesture layer would
            // consume the deltas instead.
            return;
        }
        self.mouse_impulse.0 += dx as f32 * MOUSE_SENSITIVITY;
        self.mouse_impulse.1 += dy as f32 * MOUSE_SENSITIVITY;
    }

    pub fn update(&mut self, camera: &mut crate::camera::Camera, dt: Duration) {
        let dt = dt.as_secs_f32();
        if self.frozen || dt <= 0.0 {
            self.mouse_impulse = (0.0, 0.0);
            return;
        }

        let forward_input = if self.auto_forward {
            1.0
        } else {
            self.state.forward - self.state.back
        };
        let target_velocity = Vector3::new(
            self.state.right - self.state.left,
            self.state.up - self.state.down,
            -forward_input,
        ) * self.movement_speed;

        let (mdx, mdy) = self.mouse_impulse;
        self.mouse_impulse = (0.0, 0.0);
        let target_rotation = Vector3::new(
            (self.state.pitch_up - self.state.pitch_down) - mdy / dt.max(1e-4) * 0.1,
            (self.state.yaw_left - self.state.yaw_right) - mdx / dt.max(1e-4) * 0.1,
            self.state.roll_left - self.state.roll_right,
        ) * self.roll_speed;

        // Ease velocities toward the input instead of snapping.
        let blend = (DAMPING * dt).min(1.0);
        self.velocity += (target_velocity - self.velocity) * blend;
        self.rot_velocity += (target_rotation - self.rot_velocity) * blend;

        camera.position += camera.rotation * (self.velocity * dt);

        let delta = Quaternion::from_angle_x(Rad(self.rot_velocity.x * dt))
            * Quaternion::from_angle_y(Rad(self.rot_velocity.y * dt))
            * Quaternion::from_angle_z(Rad(self.rot_velocity.z * dt));
        camera.rotation = (camera.rotation * delta).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use cgmath::Point3;

    #[test]
    fn freeze_toggles_only_the_flag() {
        let mut fly = FlyControls::new(50.0, std::f32::consts::PI / 6.0);
        let speed = fly.movement_speed;
        let roll = fly.roll_speed;
        assert!(!fly.frozen());

        fly.set_frozen(true);
        assert!(fly.frozen());
        assert_eq!(fly.movement_speed, speed);
        assert_eq!(fly.roll_speed, roll);

        fly.set_frozen(false);
        assert!(!fly.frozen());
        assert_eq!(fly.movement_speed, speed);
        assert_eq!(fly.roll_speed, roll);
    }

    #[test]
    fn frozen_controller_never_moves_the_camera() {
        let mut fly = FlyControls::new(50.0, std::f32::consts::PI / 6.0);
        fly.state.forward = 1.0;
        fly.set_frozen(true);

        let mut camera = Camera::new((55.0, 0.0, -35.0));
        camera.look_at(Point3::new(0.0, 0.0, 0.0));
        let before = camera.position;
        for _ in 0..10 {
            fly.update(&mut camera, Duration::from_millis(16));
        }
        assert_eq!(camera.position, before);
    }

    #[test]
    fn forward_key_moves_along_view_direction() {
        let mut fly = FlyControls::new(50.0, std::f32::consts::PI / 6.0);
        fly.state.forward = 1.0;

        let mut camera = Camera::new((0.0, 0.0, 100.0));
        camera.look_at(Point3::new(0.0, 0.0, 0.0));
        for _ in 0..60 {
            fly.update(&mut camera, Duration::from_millis(16));
        }
        // Looking down -Z from +Z: forward motion decreases z.
        assert!(camera.position.z < 100.0);
        assert!(camera.position.x.abs() < 1e-3);
    }

    #[test]
    fn released_keys_coast_to_a_stop() {
        let mut fly = FlyControls::new(50.0, std::f32::consts::PI / 6.0);
        fly.state.forward = 1.0;

        let mut camera = Camera::new((0.0, 0.0, 100.0));
        camera.look_at(Point3::new(0.0, 0.0, 0.0));
        for _ in 0..30 {
            fly.update(&mut camera, Duration::from_millis(16));
        }
        fly.state.forward = 0.0;
        for _ in 0..600 {
            fly.update(&mut camera, Duration::from_millis(16));
        }
        let resting = camera.position;
        fly.update(&mut camera, Duration::from_millis(16));
        assert!((camera.position.z - resting.z).abs() < 1e-3);
    }
}
