//! Renderer configuration.

use std::path::PathBuf;

use cgmath::Vector3;

/// Options fixed at [`Renderer::init`](crate::renderer::Renderer::init).
///
/// Target dimensions never change after init; a different size needs a new
/// renderer.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub width: u32,
    pub height: u32,
    /// Directory holding the WGSL programs. Defaults to the copy `build.rs`
    /// places in `OUT_DIR`.
    pub shader_dir: PathBuf,
    pub fovy: cgmath::Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
    /// Format of the renderer-owned output target. A view passed to
    /// `end_frame_into` must have the same format.
    pub output_format: wgpu::TextureFormat,
    pub shadows: ShadowSettings,
    /// Initial number of per-instance uniform slots; grows on demand.
    pub instance_capacity: u32,
    /// Initial number of debug shape slots; grows on demand.
    pub debug_capacity: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            shader_dir: default_shader_dir(),
            fovy: cgmath::Deg(45.0),
            znear: 0.1,
            zfar: 100.0,
            output_format: wgpu::TextureFormat::Rgba8Unorm,
            shadows: ShadowSettings::default(),
            instance_capacity: 64,
            debug_capacity: 16,
        }
    }
}

impl RendererConfig {
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

pub fn default_shader_dir() -> PathBuf {
    std::path::Path::new(env!("OUT_DIR")).join("shaders")
}

/// Shadow quality shared by every light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    pub spot_resolution: u32,
    /// Edge length of each cube face.
    pub cube_resolution: u32,
    pub near: f32,
    pub far: f32,
    /// Subtracted from the NDC depth before the spot comparison.
    pub depth_bias: f32,
    /// Subtracted from the light distance before the cube comparison.
    pub distance_bias: f32,
    pub pcf: bool,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            spot_resolution: 1024,
            cube_resolution: 512,
            near: 0.1,
            far: 50.0,
            depth_bias: 0.0005,
            distance_bias: 0.05,
            pcf: true,
        }
    }
}

/// Composite-time parameters. Adjustable at any point; read at `end_frame`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub global_illumination: Vector3<f32>,
    pub gamma: f32,
    pub exposure: f32,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            global_illumination: Vector3::new(0.1, 0.1, 0.1),
            gamma: 2.2,
            exposure: 1.0,
        }
    }
}

impl FrameParams {
    pub fn set_global_illumination(&mut self, color: Vector3<f32>) -> bool {
        if !(color.x.is_finite() && color.y.is_finite() && color.z.is_finite()) {
            log::warn!("ignoring non-finite global illumination {:?}", color);
            return false;
        }
        self.global_illumination = color;
        true
    }

    pub fn set_gamma(&mut self, gamma: f32) -> bool {
        if !gamma.is_finite() || gamma <= 0.0 {
            log::warn!("ignoring invalid gamma {}", gamma);
            return false;
        }
        self.gamma = gamma;
        true
    }

    pub fn set_exposure(&mut self, exposure: f32) -> bool {
        if !exposure.is_finite() || exposure < 0.0 {
            log::warn!("ignoring invalid exposure {}", exposure);
            return false;
        }
        self.exposure = exposure;
        true
    }
}
