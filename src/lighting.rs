//! Point light uniform shared by the lit pipelines.
//!
//! The five flare lights double as the scene's point lights. An ambient
//! term starts near black and is raised once the environment panorama is
//! installed, standing in for image-based ambient lighting.

use wgpu::util::DeviceExt;

use crate::scene::FlareLight;

pub const MAX_LIGHTS: usize = 5;

/// Ambient intensity before and after the environment map arrives.
pub const AMBIENT_DEFAULT: f32 = 0.02;
pub const AMBIENT_WITH_ENVIRONMENT: f32 = 0.25;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct PointLight {
    position: [f32; 3],
    _pad0: f32,
    color: [f32; 3],
    _pad1: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    lights: [PointLight; MAX_LIGHTS],
    /// rgb ambient color, w = intensity.
    ambient: [f32; 4],
}

impl LightsUniform {
    pub fn new() -> Self {
        Self {
            lights: [PointLight {
                position: [0.0; 3],
                _pad0: 0.0,
                color: [0.0; 3],
                _pad1: 0.0,
            }; MAX_LIGHTS],
            ambient: [1.0, 1.0, 1.0, AMBIENT_DEFAULT],
        }
    }

    pub fn set_lights(&mut self, lights: &[FlareLight]) {
        for (slot, light) in self.lights.iter_mut().zip(lights) {
            slot.position = light.position.into();
            slot.color = light.color;
        }
    }

    pub fn set_ambient_intensity(&mut self, intensity: f32) {
        self.ambient[3] = intensity;
    }

    pub fn ambient_intensity(&self) -> f32 {
        self.ambient[3]
    }
}

impl Default for LightsUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// The uniform plus its GPU buffer and bind group.
pub struct LightResources {
    pub uniform: LightsUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = LightsUniform::new();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lights_buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = light_bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("lights_bind_group"),
        });
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn light_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
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
        label: Some("light_bind_group_layout"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Point3;

    #[test]
    fn ambient_starts_low_and_can_be_raised() {
        let mut uniform = LightsUniform::new();
        assert_eq!(uniform.ambient_intensity(), AMBIENT_DEFAULT);
        uniform.set_ambient_intensity(AMBIENT_WITH_ENVIRONMENT);
        assert_eq!(uniform.ambient_intensity(), AMBIENT_WITH_ENVIRONMENT);
    }

    #[test]
    fn set_lights_copies_position_and_color() {
        let mut uniform = LightsUniform::new();
        let lights = vec![FlareLight {
            position: Point3::new(1.0, 2.0, 3.0),
            color: [0.5, 0.6, 0.7],
            opacities: [0.05, 0.2, 0.1, 0.35],
        }];
        uniform.set_lights(&lights);
        assert_eq!(uniform.lights[0].position, [1.0, 2.0, 3.0]);
        assert_eq!(uniform.lights[0].color, [0.5, 0.6, 0.7]);
        // Untouched slots stay zeroed.
        assert_eq!(uniform.lights[1].position, [0.0; 3]);
    }
}
