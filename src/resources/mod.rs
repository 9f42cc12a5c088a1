//! GPU resources owned by the renderer.
//!
//! - `shader` reads and validates the WGSL programs
//! - `primitives` generates plane, cube and sphere geometry
//! - `fallback` uploads default textures and primitive meshes
//! - `targets` allocates the G-buffer, HDR, output and shadow targets
//! - `uniforms` packs per-draw data into dynamic-offset arenas

pub mod fallback;
pub mod primitives;
pub mod shader;
pub mod targets;
pub mod uniforms;
