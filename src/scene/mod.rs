//! Scene population and per-frame animation state.
//!
//! Everything visible lives here: the spinning cube, the blue accent line,
//! the 15,000-speck field, the textured planets and the five flare lights.
//! Placement draws from one injected random stream so a seeded scene is
//! fully reproducible.

use cgmath::{Deg, Euler, Matrix4, Point3, Quaternion, Rad, Rotation3, Vector3};
use wgpu::util::DeviceExt;

use crate::data_structures::{
    instance::Instance,
    model::{Material, Mesh, Model, ModelVertex},
    texture::Texture,
};
use crate::pipelines::flare::FlareInstance;

pub mod flare;
pub mod geometry;
pub mod rng;

use flare::{flare_light_positions, flare_opacities, hsl_to_rgb, layout_flare, FlareElement};
use rng::SceneRng;

/// Number of small spheres in the background speck field.
pub const SPECK_COUNT: usize = 15_000;
/// Side length of the cube the specks (and the fifth light) scatter in.
pub const FIELD_SIDE: f32 = 4000.0;
/// Placement scale for the tetrahedron of flare lights.
pub const FLARE_PLACEMENT_SCALE: f32 = 1000.0;
/// Fixed angle added to the cube's x and y rotation every frame.
pub const CUBE_SPIN_STEP: f32 = 0.01;
/// Upper bound (exclusive) of the per-axis random planet spin per frame.
pub const PLANET_SPIN_MAX: f32 = 0.01;

/// Texture file, world position and radius for each planet.
const PLANET_SPECS: &[(&str, [f32; 3], f32)] = &[
    ("sun.jpg", [-400.0, 150.0, -900.0], 120.0),
    ("mercury.jpg", [300.0, -80.0, -500.0], 25.0),
    ("earth.jpg", [-150.0, 40.0, 600.0], 60.0),
    ("moon.jpg", [500.0, 250.0, 300.0], 18.0),
];

/// A mesh with its instance list and the matching GPU buffer.
pub struct MeshNode {
    pub model: Model,
    pub instances: Vec<Instance>,
    pub instance_buffer: wgpu::Buffer,
}

impl MeshNode {
    pub fn new(device: &wgpu::Device, model: Model, instances: Vec<Instance>) -> Self {
        let raws = instances.iter().map(Instance::to_raw).collect::<Vec<_>>();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("instance_buffer"),
            contents: bytemuck::cast_slice(&raws),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            model,
            instances,
            instance_buffer,
        }
    }

    /// Push the current CPU-side instance transforms to the GPU.
    pub fn write_instances(&self, queue: &wgpu::Queue) {
        let raws = self.instances.iter().map(Instance::to_raw).collect::<Vec<_>>();
        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&raws));
    }
}

/// One light with its lens flare parameters.
#[derive(Debug, Clone)]
pub struct FlareLight {
    pub position: Point3<f32>,
    pub color: [f32; 3],
    pub opacities: [f32; 4],
}

/// Pure per-frame rotation state, kept separate from the GPU resources so
/// the frame stepping is testable on its own.
#[derive(Debug, Clone)]
pub struct Animation {
    pub cube_spin: (f32, f32),
    pub planet_spin: Vec<Vector3<f32>>,
}

impl Animation {
    pub fn new(planet_count: usize) -> Self {
        Self {
            cube_spin: (0.0, 0.0),
            planet_spin: vec![Vector3::new(0.0, 0.0, 0.0); planet_count],
        }
    }

    /// One frame step: the cube gains a fixed increment on two axes, each
    /// planet an independent random increment per axis.
    pub fn advance(&mut self, rng: &mut SceneRng) {
        self.cube_spin.0 += CUBE_SPIN_STEP;
        self.cube_spin.1 += CUBE_SPIN_STEP;
        for spin in &mut self.planet_spin {
            spin.x += rng.range(0.0, PLANET_SPIN_MAX);
            spin.y += rng.range(0.0, PLANET_SPIN_MAX);
            spin.z += rng.range(0.0, PLANET_SPIN_MAX);
        }
    }

    pub fn cube_rotation(&self) -> Quaternion<f32> {
        Quaternion::from(Euler::new(
            Rad(self.cube_spin.0),
            Rad(self.cube_spin.1),
            Rad(0.0),
        ))
    }

    pub fn planet_rotation(&self, idx: usize) -> Quaternion<f32> {
        let spin = self.planet_spin[idx];
        Quaternion::from(Euler::new(Rad(spin.x), Rad(spin.y), Rad(spin.z)))
    }
}

pub struct Scene {
    pub cube: MeshNode,
    pub specks: MeshNode,
    pub planets: Vec<MeshNode>,
    pub line_buffer: wgpu::Buffer,
    pub line_vertex_count: u32,
    pub flare_buffer: wgpu::Buffer,
    pub flare_count: u32,
    pub animation: Animation,
    flare_lights: Vec<FlareLight>,
    flare_scratch: Vec<FlareElement>,
    rng: SceneRng,
}

impl Scene {
    /// Build the whole scene. Planet textures that fail to load degrade to
    /// a flat gray stand-in with a warning; nothing else notices.
    pub async fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture_layout: &wgpu::BindGroupLayout,
        mut rng: SceneRng,
    ) -> Self {
        let cube = build_cube(device, queue, texture_layout);
        let specks = build_specks(device, queue, texture_layout, &mut rng);
        let planets = build_planets(device, queue, texture_layout).await;

        let line = geometry::accent_line();
        let line_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("accent_line_buffer"),
            contents: bytemuck::cast_slice(&line),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let flare_lights = build_flare_lights(&mut rng);
        let flare_capacity = flare_lights.len() * flare::FLARE_ELEMENT_OFFSETS.len();
        let flare_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("flare_instance_buffer"),
            size: (flare_capacity * std::mem::size_of::<FlareInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let animation = Animation::new(planets.len());
        Self {
            cube,
            specks,
            planets,
            line_buffer,
            line_vertex_count: line.len() as u32,
            flare_buffer,
            flare_count: 0,
            animation,
            flare_lights,
            flare_scratch: Vec::with_capacity(flare_capacity),
            rng,
        }
    }

    pub fn flare_lights(&self) -> &[FlareLight] {
        &self.flare_lights
    }

    /// Advance one frame of animation and push the changed transforms.
    pub fn advance(&mut self, queue: &wgpu::Queue) {
        self.animation.advance(&mut self.rng);

        self.cube.instances[0].rotation = self.animation.cube_rotation();
        self.cube.write_instances(queue);

        for (idx, planet) in self.planets.iter_mut().enumerate() {
            planet.instances[0].rotation = self.animation.planet_rotation(idx);
            planet.write_instances(queue);
        }
    }

    /// Re-lay the flare sprites out against the current view-projection and
    /// upload them. Returns the instance count for the draw call.
    pub fn update_flares(&mut self, queue: &wgpu::Queue, view_proj: &Matrix4<f32>) -> u32 {
        self.flare_scratch.clear();
        for light in &self.flare_lights {
            layout_flare(
                light.position,
                light.color,
                light.opacities,
                view_proj,
                &mut self.flare_scratch,
            );
        }
        let raws = self
            .flare_scratch
            .iter()
            .map(|e| FlareInstance {
                clip_pos: [e.clip_pos.x, e.clip_pos.y],
                size_px: e.size_px,
                opacity: e.opacity,
                color: e.color,
                _pad: 0.0,
            })
            .collect::<Vec<_>>();
        if !raws.is_empty() {
            queue.write_buffer(&self.flare_buffer, 0, bytemuck::cast_slice(&raws));
        }
        self.flare_count = raws.len() as u32;
        self.flare_count
    }
}

fn upload_mesh(
    device: &wgpu::Device,
    name: &str,
    vertices: &[ModelVertex],
    indices: &[u32],
) -> Mesh {
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{name}_vertex_buffer")),
        contents: bytemuck::cast_slice(vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{name}_index_buffer")),
        contents: bytemuck::cast_slice(indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    Mesh {
        name: name.to_string(),
        vertex_buffer,
        index_buffer,
        num_elements: indices.len() as u32,
        material: 0,
    }
}

fn solid_model(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    name: &str,
    rgba: [u8; 4],
    vertices: &[ModelVertex],
    indices: &[u32],
) -> Model {
    let texture = Texture::solid_color(device, queue, rgba, &format!("{name}_color"));
    let material = Material::new(device, name, texture, layout);
    Model {
        meshes: vec![upload_mesh(device, name, vertices, indices)],
        materials: vec![material],
    }
}

fn build_cube(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> MeshNode {
    let (vertices, indices) = geometry::cube();
    let model = solid_model(
        device,
        queue,
        layout,
        "cube",
        [0, 255, 0, 255],
        &vertices,
        &indices,
    );
    MeshNode::new(device, model, vec![Instance::new()])
}

fn build_specks(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    rng: &mut SceneRng,
) -> MeshNode {
    let (vertices, indices) = geometry::uv_sphere(1.0, 8, 6);
    let model = solid_model(
        device,
        queue,
        layout,
        "speck",
        [255, 255, 255, 255],
        &vertices,
        &indices,
    );

    let half = FIELD_SIDE / 2.0;
    let mut instances = Vec::with_capacity(SPECK_COUNT);
    for _ in 0..SPECK_COUNT {
        let scale = rng.range(0.5, 1.5);
        instances.push(Instance {
            position: Vector3::new(
                rng.range(-half, half),
                rng.range(-half, half),
                rng.range(-half, half),
            ),
            rotation: Quaternion::from_angle_y(Deg(0.0)),
            scale: Vector3::new(scale, scale, scale),
        });
    }
    MeshNode::new(device, model, instances)
}

async fn build_planets(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> Vec<MeshNode> {
    let (vertices, indices) = geometry::uv_sphere(1.0, 48, 24);

    // All texture fetches run concurrently; each failure degrades alone.
    let loads = PLANET_SPECS
        .iter()
        .map(|(file, _, _)| crate::resources::load_binary(file));
    let loaded = futures::future::join_all(loads).await;

    let mut planets = Vec::with_capacity(PLANET_SPECS.len());
    for ((file, position, radius), bytes) in PLANET_SPECS.iter().zip(loaded) {
        let texture = match bytes {
            Ok(bytes) => match Texture::from_bytes(device, queue, &bytes, file) {
                Ok(texture) => texture,
                Err(err) => {
                    log::warn!("decoding {file} failed ({err}), using flat color");
                    Texture::solid_color(device, queue, [128, 128, 128, 255], file)
                }
            },
            Err(err) => {
                log::warn!("loading {file} failed ({err}), using flat color");
                Texture::solid_color(device, queue, [128, 128, 128, 255], file)
            }
        };
        let material = Material::new(device, file, texture, layout);
        let model = Model {
            meshes: vec![upload_mesh(device, file, &vertices, &indices)],
            materials: vec![material],
        };
        let instance = Instance {
            position: Vector3::from(*position),
            rotation: Quaternion::from_angle_y(Deg(0.0)),
            scale: Vector3::new(*radius, *radius, *radius),
        };
        planets.push(MeshNode::new(device, model, vec![instance]));
    }
    planets
}

fn build_flare_lights(rng: &mut SceneRng) -> Vec<FlareLight> {
    flare_light_positions(FLARE_PLACEMENT_SCALE, FIELD_SIDE, rng)
        .into_iter()
        .map(|position| FlareLight {
            position,
            color: hsl_to_rgb(rng.unit(), 0.5, 0.7),
            opacities: flare_opacities(rng),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_rotation_accumulates_fixed_steps() {
        let mut rng = SceneRng::seeded(1);
        let mut animation = Animation::new(0);
        for _ in 0..250 {
            animation.advance(&mut rng);
        }
        assert!((animation.cube_spin.0 - 250.0 * CUBE_SPIN_STEP).abs() < 1e-4);
        assert!((animation.cube_spin.1 - 250.0 * CUBE_SPIN_STEP).abs() < 1e-4);
    }

    #[test]
    fn planet_spin_grows_within_the_per_frame_bound() {
        let mut rng = SceneRng::seeded(5);
        let mut animation = Animation::new(3);
        let frames = 500;
        for _ in 0..frames {
            animation.advance(&mut rng);
        }
        for spin in &animation.planet_spin {
            for axis in [spin.x, spin.y, spin.z] {
                assert!(axis >= 0.0);
                assert!(axis < frames as f32 * PLANET_SPIN_MAX);
            }
        }
    }

    #[test]
    fn seeded_animations_are_identical() {
        let mut a = (SceneRng::seeded(9), Animation::new(4));
        let mut b = (SceneRng::seeded(9), Animation::new(4));
        for _ in 0..100 {
            a.1.advance(&mut a.0);
            b.1.advance(&mut b.0);
        }
        assert_eq!(a.1.planet_spin, b.1.planet_spin);
    }

    #[test]
    fn flare_lights_follow_the_placement_rule() {
        let mut rng = SceneRng::seeded(21);
        let lights = build_flare_lights(&mut rng);
        assert_eq!(lights.len(), 5);
        let tetra = flare::tetrahedron_points(FLARE_PLACEMENT_SCALE);
        for (light, vertex) in lights.iter().zip(tetra) {
            assert_eq!(light.position, vertex);
        }
        for light in &lights {
            for (value, (lo, hi)) in light.opacities.iter().zip(flare::FLARE_OPACITY_RANGES) {
                assert!((lo..hi).contains(value));
            }
        }
    }
}
