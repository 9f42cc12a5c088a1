//! Error types.
//!
//! Only initialisation can fail. Everything that happens inside a frame is
//! soft: bad submissions are dropped and logged instead of surfacing here.

use std::path::PathBuf;

use crate::data_structures::light::LightId;

/// Fatal failure while building a [`Renderer`](crate::renderer::Renderer).
///
/// A renderer that failed to initialise does not exist; the caller must not
/// proceed with rendering.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("render target dimensions must be non-zero, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("render target {width}x{height} exceeds the device limit of {limit}")]
    DimensionsExceedLimit { width: u32, height: u32, limit: u32 },
    #[error("could not read shader {path:?}")]
    ShaderRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("shader {path:?} failed to compile:\n{message}")]
    ShaderCompile { path: PathBuf, message: String },
    #[error("pipeline `{label}` failed to link: {message}")]
    PipelineLink { label: String, message: String },
    #[error("render target allocation failed: {0}")]
    TargetAllocation(String),
    #[error("no suitable adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

/// Violation of the single-slot shadow map protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ShadowSlotError {
    #[error("shadow map is held by {holder:?}, {requester:?} cannot render into it")]
    Busy { holder: LightId, requester: LightId },
    #[error("{requester:?} reads a shadow map it does not hold")]
    NotHeld { requester: LightId },
    #[error("{requester:?} reads a shadow map rendered for {holder:?}")]
    Stale { holder: LightId, requester: LightId },
}
