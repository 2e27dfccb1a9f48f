//! Camera, projection and the view/projection uniform.
//!
//! The camera is a free transform (position + orientation quaternion) so the
//! fly controller can roll it; the orbit controller instead re-derives the
//! transform from spherical coordinates around its target each update.

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Quaternion, Rad, SquareMatrix, Vector3};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// A camera looking down its local -Z axis, +Y up.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub rotation: Quaternion<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P) -> Self {
        Self {
            position: position.into(),
            rotation: Quaternion::from_sv(1.0, Vector3::new(0.0, 0.0, 0.0)),
        }
    }

    /// Orient the camera so its -Z axis points at `target`.
    pub fn look_at(&mut self, target: Point3<f32>) {
        let dir = (target - self.position).normalize();
        let up = Vector3::unit_y();
        // Camera-space basis: z points away from the view direction.
        let z = -dir;
        let x = up.cross(z).normalize();
        let y = z.cross(x);
        self.rotation = Quaternion::from(cgmath::Matrix3::from_cols(x, y, z));
    }

    /// World-space forward direction (-Z of the camera frame).
    pub fn forward(&self) -> Vector3<f32> {
        self.rotation * -Vector3::unit_z()
    }

    pub fn calc_view(&self) -> Matrix4<f32> {
        Matrix4::from(self.rotation.conjugate())
            * Matrix4::from_translation(-self.position.to_vec())
    }
}

/// Perspective projection with a resizable aspect ratio.
#[derive(Debug, Clone)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// The camera data as it is laid out on the GPU.
///
/// The inverse view-projection matrix is carried for the sky pass, which
/// unprojects fullscreen fragments back into world-space view rays.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    inv_view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
            inv_view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        let view_proj = projection.calc_matrix() * camera.calc_view();
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = view_proj.into();
        self.inv_view_proj = view_proj
            .invert()
            .unwrap_or_else(Matrix4::identity)
            .into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera GPU resources bundled the way the context hands them around.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

pub fn camera_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("camera_bind_group_layout"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Deg;

    #[test]
    fn resize_sets_aspect_to_exact_ratio() {
        let mut projection = Projection::new(800, 600, Deg(80.0), 1.0, 500.0);
        projection.resize(1920, 1080);
        assert_eq!(projection.aspect, 1920.0 / 1080.0);
        projection.resize(333, 777);
        assert_eq!(projection.aspect, 333.0 / 777.0);
    }

    #[test]
    fn look_at_points_forward_at_target() {
        let mut camera = Camera::new((55.0, 0.0, -35.0));
        camera.look_at(Point3::new(0.0, 0.0, 0.0));
        let expected = (Point3::new(0.0, 0.0, 0.0) - camera.position).normalize();
        let forward = camera.forward();
        assert!((forward - expected).magnitude() < 1e-5);
    }

    #[test]
    fn view_matrix_moves_target_onto_negative_z() {
        let mut camera = Camera::new((10.0, 0.0, 0.0));
        camera.look_at(Point3::new(0.0, 0.0, 0.0));
        let view = camera.calc_view();
        let target_in_view = view * Point3::new(0.0, 0.0, 0.0).to_homogeneous();
        assert!(target_in_view.x.abs() < 1e-5);
        assert!(target_in_view.y.abs() < 1e-5);
        assert!(target_in_view.z < 0.0);
    }
}
