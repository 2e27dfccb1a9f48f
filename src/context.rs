//! Central GPU and window context.
//!
//! Owns the surface, device, camera and light resources and all render
//! pipelines, and composes the per-frame render pass: sky background, lit
//! meshes, the accent line, then the additive flare sprites.

use std::{iter, sync::Arc};

use anyhow::{Context as _, Result};
use cgmath::Matrix4;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    camera::{self, CameraResources, CameraUniform, Projection},
    data_structures::{model::DrawModel, texture::Texture},
    environment::{Environment, EnvironmentImage},
    lighting::{LightResources, AMBIENT_WITH_ENVIRONMENT},
    pipelines::{
        basic::mk_basic_pipeline,
        flare::{mk_flare_pipeline, FlareResources},
        line::mk_line_pipeline,
        sky::{mk_sky_pipeline, sky_texture_layout},
    },
    scene::{MeshNode, Scene},
};

pub struct Context {
    pub window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub depth_texture: Texture,
    pub camera: CameraResources,
    pub projection: Projection,
    pub lights: LightResources,
    pub flares: FlareResources,
    pub environment: Option<Environment>,
    sky_layout: wgpu::BindGroupLayout,
    basic_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    sky_pipeline: wgpu::RenderPipeline,
    flare_pipeline: wgpu::RenderPipeline,
}

impl Context {
    /// Probe for a usable adapter and build every GPU resource. Any failure
    /// bubbles up so the app can show a static error instead of a scene.
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible graphics adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so when
                // building for the web some limits have to come down.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("graphics device request failed")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shaders output linear color and rely on an sRGB surface for
        // the final transfer curve.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let mut camera = camera::Camera::new((55.0, 0.0, -35.0));
        camera.look_at(cgmath::Point3::new(0.0, 0.0, 0.0));
        let projection =
            Projection::new(config.width, config.height, cgmath::Deg(80.0), 1.0, 500.0);

        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update_view_proj(&camera, &projection);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group_layout = camera::camera_bind_group_layout(&device);
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });
        let camera = CameraResources {
            camera,
            uniform: camera_uniform,
            buffer: camera_buffer,
            bind_group: camera_bind_group,
            bind_group_layout: camera_bind_group_layout,
        };

        let lights = LightResources::new(&device);
        let flares = FlareResources::new(&device, config.width, config.height);

        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");

        let sky_layout = sky_texture_layout(&device);
        let basic_pipeline = mk_basic_pipeline(
            &device,
            &config,
            &camera.bind_group_layout,
            &lights.bind_group_layout,
        );
        let line_pipeline = mk_line_pipeline(&device, &config, &camera.bind_group_layout);
        let sky_pipeline = mk_sky_pipeline(&device, &config, &camera.bind_group_layout);
        let flare_pipeline = mk_flare_pipeline(&device, &config, &flares.bind_group_layout);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            depth_texture,
            camera,
            projection,
            lights,
            flares,
            environment: None,
            sky_layout,
            basic_pipeline,
            line_pipeline,
            sky_pipeline,
            flare_pipeline,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
        self.projection.resize(width, height);
        self.flares.resize(&self.queue, width, height);
    }

    /// Install the loaded panorama as background and raise the ambient
    /// term, the stand-in for environment lighting.
    pub fn install_environment(&mut self, image: &EnvironmentImage) -> Result<()> {
        let environment = Environment::new(&self.device, &self.queue, &self.sky_layout, image)?;
        self.environment = Some(environment);
        self.lights
            .uniform
            .set_ambient_intensity(AMBIENT_WITH_ENVIRONMENT);
        self.lights.write(&self.queue);
        Ok(())
    }

    /// Push the current camera state to the GPU.
    pub fn update_camera(&mut self) {
        self.camera
            .uniform
            .update_view_proj(&self.camera.camera, &self.projection);
        self.queue.write_buffer(
            &self.camera.buffer,
            0,
            bytemuck::cast_slice(&[self.camera.uniform]),
        );
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        self.projection.calc_matrix() * self.camera.camera.calc_view()
    }

    pub fn render(&mut self, scene: &mut Scene) -> Result<(), wgpu::SurfaceError> {
        let view_proj = self.view_proj();
        let flare_count = scene.update_flares(&self.queue, &view_proj);

        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(environment) = &self.environment {
                render_pass.set_pipeline(&self.sky_pipeline);
                render_pass.set_bind_group(0, &self.camera.bind_group, &[]);
                render_pass.set_bind_group(1, &environment.bind_group, &[]);
                render_pass.draw(0..3, 0..1);
            }

            render_pass.set_pipeline(&self.basic_pipeline);
            draw_node(&mut render_pass, &scene.cube, &self.camera, &self.lights);
            draw_node(&mut render_pass, &scene.specks, &self.camera, &self.lights);
            for planet in &scene.planets {
                draw_node(&mut render_pass, planet, &self.camera, &self.lights);
            }

            render_pass.set_pipeline(&self.line_pipeline);
            render_pass.set_bind_group(0, &self.camera.bind_group, &[]);
            render_pass.set_vertex_buffer(0, scene.line_buffer.slice(..));
            render_pass.draw(0..scene.line_vertex_count, 0..1);

            if flare_count > 0 {
                render_pass.set_pipeline(&self.flare_pipeline);
                render_pass.set_bind_group(0, &self.flares.bind_group, &[]);
                render_pass.set_vertex_buffer(0, scene.flare_buffer.slice(..));
                render_pass.draw(0..6, 0..flare_count);
            }
        }

        self.queue.submit(iter::once(encoder.finish()));
        frame.present();

        Ok(())
    }
}

fn draw_node<'a>(
    render_pass: &mut wgpu::RenderPass<'a>,
    node: &'a MeshNode,
    camera: &'a CameraResources,
    lights: &'a LightResources,
) {
    render_pass.set_vertex_buffer(1, node.instance_buffer.slice(..));
    render_pass.draw_model_instanced(
        &node.model,
        0..node.instances.len() as u32,
        &camera.bind_group,
        &lights.bind_group,
    );
}
