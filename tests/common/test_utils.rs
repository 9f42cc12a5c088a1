#![allow(dead_code)]

use std::path::PathBuf;

use cgmath::{Matrix4, SquareMatrix, Vector3};
#[cfg(feature = "integration-tests")]
use umbra::{context::Context, renderer::Renderer};
use umbra::{config::RendererConfig, frame::RendererState};

/// Bookkeeping-only state with plain ids standing in for GPU handles.
pub(crate) type TestState = RendererState<u32, u32>;

pub(crate) fn shader_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("shaders")
}

pub(crate) fn test_config(width: u32, height: u32) -> RendererConfig {
    RendererConfig {
        shader_dir: shader_dir(),
        ..RendererConfig::with_size(width, height)
    }
}

pub(crate) fn identity() -> Matrix4<f32> {
    Matrix4::identity()
}

pub(crate) fn approx(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

pub(crate) fn approx_vec(a: Vector3<f32>, b: Vector3<f32>, eps: f32) -> bool {
    approx(a.x, b.x, eps) && approx(a.y, b.y, eps) && approx(a.z, b.z, eps)
}

/// A device, or `None` on machines without a usable adapter.
#[cfg(feature = "integration-tests")]
pub(crate) fn headless_context() -> Option<Context> {
    umbra::init_logging();
    match Context::new_headless_blocking() {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            eprintln!("skipping GPU test, no adapter: {}", e);
            None
        }
    }
}

/// A device on the OpenGL backend, or `None` where no GL adapter exists.
///
/// The GL shader backend cannot translate every WGSL construct the lighting
/// pass uses, so pipeline creation on this device fails.
#[cfg(feature = "integration-tests")]
pub(crate) fn gl_context() -> Option<Context> {
    umbra::init_logging();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    runtime.block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::GL,
            ..Default::default()
        });
        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
        {
            Ok(adapter) => adapter,
            Err(e) => {
                eprintln!("skipping GL test, no adapter: {}", e);
                return None;
            }
        };
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("gl test device"),
                required_limits: adapter.limits(),
                ..Default::default()
            })
            .await
            .ok()?;
        Some(Context::from_parts(device, queue))
    })
}

#[cfg(feature = "integration-tests")]
pub(crate) fn test_renderer(config: RendererConfig) -> Option<Renderer> {
    let ctx = headless_context()?;
    Some(Renderer::init_blocking(ctx, config).expect("renderer init failed"))
}

/// Average of the rgb channels over the whole image.
#[cfg(feature = "integration-tests")]
pub(crate) fn mean_intensity(image: &image::RgbaImage) -> f32 {
    let sum: u64 = image
        .pixels()
        .map(|p| p.0[0] as u64 + p.0[1] as u64 + p.0[2] as u64)
        .sum();
    sum as f32 / (image.width() * image.height() * 3) as f32
}

#[cfg(feature = "integration-tests")]
pub(crate) fn intensity_at(image: &image::RgbaImage, x: u32, y: u32) -> f32 {
    let p = image.get_pixel(x, y).0;
    (p[0] as f32 + p[1] as f32 + p[2] as f32) / 3.0
}

/// Runs the body against a fresh renderer, or returns early without a GPU.
#[macro_export]
macro_rules! with_renderer {
    ($config:expr, |$renderer:ident| $body:block) => {{
        let Some(mut $renderer) = crate::common::test_utils::test_renderer($config) else {
            return;
        };
        $body
    }};
}
