//! Camera navigation: fly and orbit controllers layered on one camera.
//!
//! Both controllers are always constructed and configured; exactly one is
//! active at a time via [`Navigation::set_mode`]. The orbit mode ships
//! disabled (matching the demo's shipped configuration) but stays fully
//! wired so it can be switched on without further setup.

use instant::Duration;
use winit::event::WindowEvent;

use crate::camera::Camera;

pub mod fly;
pub mod orbit;

pub use fly::FlyControls;
pub use orbit::OrbitControls;

/// Which controller currently drives the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
    Fly,
    Orbit,
}

/// The two controllers plus the active-mode switch.
#[derive(Debug)]
pub struct Navigation {
    pub fly: FlyControls,
    pub orbit: OrbitControls,
    mode: NavigationMode,
}

impl Navigation {
    /// The demo's shipped configuration: fly active, orbit configured but
    /// inert.
    pub fn new(camera: &Camera) -> Self {
        Self {
            fly: FlyControls::new(50.0, std::f32::consts::PI / 6.0),
            orbit: OrbitControls::new(camera, (0.0, 0.0, 0.0).into()),
            mode: NavigationMode::Fly,
        }
    }

    pub fn mode(&self) -> NavigationMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: NavigationMode) {
        self.mode = mode;
    }

    /// Forward window events (keyboard) to the active controller.
    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        match self.mode {
            NavigationMode::Fly => self.fly.handle_window_events(event),
            NavigationMode::Orbit => self.orbit.handle_window_events(event),
        }
    }

    /// Forward raw mouse motion to the active controller.
    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        match self.mode {
            NavigationMode::Fly => self.fly.handle_mouse(dx, dy),
            NavigationMode::Orbit => self.orbit.handle_mouse(dx, dy),
        }
    }

    /// Advance the active controller by the measured frame delta.
    pub fn update(&mut self, camera: &mut Camera, dt: Duration) {
        match self.mode {
            NavigationMode::Fly => self.fly.update(camera, dt),
            NavigationMode::Orbit => self.orbit.update(camera, dt),
        }
    }
}
