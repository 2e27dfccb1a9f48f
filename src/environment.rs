//! Asynchronous HDR environment loading.
//!
//! The panorama is fetched and decoded off the render path; the decoded
//! pixels travel back to the event loop as a user event and are installed
//! between frames. Until then the background stays black and ambient light
//! stays at its startup level, which is the accepted race.

use anyhow::Result;

use crate::data_structures::texture::Texture;
use crate::resources::load_binary;

/// The equirectangular panorama asset.
pub const ENVIRONMENT_FILE: &str = "space-bg.hdr";

/// Shown instead of the scene when no usable graphics adapter exists.
pub const PROBE_ERROR_MESSAGE: &str =
    "This demo requires a graphics adapter with WebGL2-level support, \
     which is not available on this system.";

/// A decoded HDR panorama, RGBA f32 pixels in scanline order.
#[derive(Debug, Clone)]
pub struct EnvironmentImage {
    pub pixels: Vec<f32>,
    pub width: u32,
    pub height: u32,
}

/// Fetch and decode the panorama. Runs on whatever async context the
/// platform provides; the caller forwards the result to the event loop.
pub async fn load_environment() -> Result<EnvironmentImage> {
    let bytes = load_binary(ENVIRONMENT_FILE).await?;
    decode_hdr(&bytes)
}

pub fn decode_hdr(bytes: &[u8]) -> Result<EnvironmentImage> {
    let image = image::load_from_memory(bytes)?;
    let rgba = image.to_rgba32f();
    let (width, height) = rgba.dimensions();
    Ok(EnvironmentImage {
        pixels: rgba.into_raw(),
        width,
        height,
    })
}

/// The installed environment: the GPU texture plus the sky pass bind group.
pub struct Environment {
    #[allow(unused)]
    pub texture: Texture,
    pub bind_group: wgpu::BindGroup,
}

impl Environment {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        image: &EnvironmentImage,
    ) -> Result<Self> {
        let texture = Texture::from_hdr_pixels(
            device,
            queue,
            &image.pixels,
            image.width,
            image.height,
            ENVIRONMENT_FILE,
        )?;
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
            label: Some("sky_bind_group"),
        });
        Ok(Self {
            texture,
            bind_group,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_non_hdr_bytes() {
        assert!(decode_hdr(b"definitely not an image").is_err());
    }

    #[test]
    fn decode_handles_a_minimal_radiance_file() {
        // A 1x1 Radiance HDR file built by the image crate itself.
        let mut bytes = Vec::new();
        let encoder = image::codecs::hdr::HdrEncoder::new(&mut bytes);
        encoder
            .encode(&[image::Rgb([0.5f32, 1.0, 2.0])], 1, 1)
            .unwrap();

        let decoded = decode_hdr(&bytes).unwrap();
        assert_eq!((decoded.width, decoded.height), (1, 1));
        assert_eq!(decoded.pixels.len(), 4);
        assert!((decoded.pixels[3] - 1.0).abs() < 1e-6);
    }
}
