//! umbra
//!
//! A multi-pass deferred renderer on wgpu. Meshes are rasterized once into a
//! G-buffer; every light is then applied as a full-screen additive pass over
//! an HDR accumulation target, preceded by its own shadow pass when the light
//! kind casts shadows. Global illumination and a gamma/exposure composite
//! produce the final image, with an optional wireframe debug overlay on top.
//!
//! High-level modules
//! - `renderer`: the [`Renderer`] and its frame execution
//! - `frame`: frame state machine, submission lists and pass planning
//! - `shadow`: shadow-map ownership tracking and light-space matrices
//! - `shading`: CPU reference of the lighting and tone-mapping math
//! - `data_structures`: meshes, materials, textures, instances and lights
//! - `pipelines`: bind group layouts and render pipelines per pass
//! - `resources`: render targets, shaders, primitives and uniform arenas
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod frame;
pub mod pipelines;
pub mod renderer;
pub mod resources;
pub mod shading;
pub mod shadow;

// Re-exports commonly used types for convenience in downstream code.
pub use camera::Camera;
pub use config::{FrameParams, RendererConfig, ShadowSettings};
pub use context::{init_logging, Context};
pub use data_structures::{
    light::{DirectionalLight, Light, LightId, LightKind, PointLight, SpotLight},
    material::{Material, MaterialHandle, MaterialSlot},
    mesh::{Mesh, MeshHandle, MeshKind, ModelVertex, SkinnedVertex},
    texture::{Texture, TextureHandle},
};
pub use error::{InitError, ShadowSlotError};
pub use frame::{FramePlan, FrameState, PassCommand, RendererState};
pub use renderer::Renderer;
pub use cgmath;
pub use wgpu;
