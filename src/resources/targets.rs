//! Render targets allocated once at init.

use crate::{config::RendererConfig, data_structures::texture::Texture};

pub const ALBEDO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub const NORMAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const MATERIAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Linear distance to the light, one layer per cube face.
pub const CUBE_SHADOW_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;

/// Albedo is cleared to the default albedo so uncovered pixels still
/// receive the ambient term.
pub const ALBEDO_CLEAR: wgpu::Color = wgpu::Color::WHITE;

#[derive(Debug)]
pub struct GBuffer {
    pub albedo: Texture,
    /// World-space normal; w = 1 where geometry was drawn.
    pub normal: Texture,
    /// r = metallic, g = roughness
    pub material: Texture,
    pub depth: Texture,
}

impl GBuffer {
    pub const FORMATS: [wgpu::TextureFormat; 3] = [ALBEDO_FORMAT, NORMAL_FORMAT, MATERIAL_FORMAT];

    fn new(device: &wgpu::Device, size: [u32; 2]) -> Self {
        let target = |format: wgpu::TextureFormat, label: &str| {
            Texture::create_render_target(device, size, format, wgpu::TextureUsages::empty(), label)
        };
        Self {
            albedo: target(ALBEDO_FORMAT, "gbuffer albedo"),
            normal: target(NORMAL_FORMAT, "gbuffer normal"),
            material: target(MATERIAL_FORMAT, "gbuffer material"),
            depth: Texture::create_depth_texture(device, size, "gbuffer depth"),
        }
    }

    pub fn color_attachments(&self) -> [Option<wgpu::RenderPassColorAttachment<'_>>; 3] {
        [
            clear_attachment(&self.albedo.view, ALBEDO_CLEAR),
            clear_attachment(&self.normal.view, wgpu::Color::TRANSPARENT),
            clear_attachment(&self.material.view, wgpu::Color::BLACK),
        ]
    }
}

pub fn clear_attachment(
    view: &wgpu::TextureView,
    clear: wgpu::Color,
) -> Option<wgpu::RenderPassColorAttachment<'_>> {
    Some(wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        depth_slice: None,
        ops: wgpu::Operations {
            load: wgpu::LoadOp::Clear(clear),
            store: wgpu::StoreOp::Store,
        },
    })
}

pub fn load_attachment(view: &wgpu::TextureView) -> Option<wgpu::RenderPassColorAttachment<'_>> {
    Some(wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        depth_slice: None,
        ops: wgpu::Operations {
            load: wgpu::LoadOp::Load,
            store: wgpu::StoreOp::Store,
        },
    })
}

#[derive(Debug)]
pub struct RenderTargets {
    pub size: [u32; 2],
    pub gbuffer: GBuffer,
    pub hdr: Texture,
    /// The tone-mapped image; readable with `Renderer::read_output`.
    pub output: Texture,
    pub spot_shadow: Texture,
    pub cube_shadow: Texture,
    pub cube_faces: [wgpu::TextureView; 6],
    /// Depth buffer shared by the six cube faces.
    pub cube_depth: Texture,
}

impl RenderTargets {
    pub fn new(device: &wgpu::Device, config: &RendererConfig) -> Self {
        let size = [config.width, config.height];
        let shadows = &config.shadows;
        let cube_shadow = Texture::create_layered_target(
            device,
            shadows.cube_resolution,
            6,
            CUBE_SHADOW_FORMAT,
            "cube shadow map",
        );
        let cube_faces = std::array::from_fn(|face| cube_shadow.layer_view(face as u32));
        log::info!(
            "allocated {}x{} targets, spot shadow {}, cube shadow {}",
            size[0],
            size[1],
            shadows.spot_resolution,
            shadows.cube_resolution
        );

        Self {
            size,
            gbuffer: GBuffer::new(device, size),
            hdr: Texture::create_render_target(
                device,
                size,
                HDR_FORMAT,
                wgpu::TextureUsages::empty(),
                "hdr accumulation",
            ),
            output: Texture::create_render_target(
                device,
                size,
                config.output_format,
                wgpu::TextureUsages::COPY_SRC,
                "output",
            ),
            spot_shadow: Texture::create_depth_texture(
                device,
                [shadows.spot_resolution, shadows.spot_resolution],
                "spot shadow map",
            ),
            cube_shadow,
            cube_faces,
            cube_depth: Texture::create_depth_texture(
                device,
                [shadows.cube_resolution, shadows.cube_resolution],
                "cube shadow depth",
            ),
        }
    }
}

/// Row pitch for copying a 4-byte-per-pixel target of `width` into a buffer.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    crate::resources::uniforms::aligned_stride(
        width as u64 * 4,
        wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as u64,
    ) as u32
}
