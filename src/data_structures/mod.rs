//! Engine data structures: meshes, materials, textures, lights and instances.
//!
//! - `mesh` holds vertex formats and GPU mesh handles
//! - `material` maps the four texture slots to their defaults
//! - `texture` wraps GPU textures and render targets
//! - `instance` holds per-frame mesh and debug submissions
//! - `light` holds the light variants and their dispatch table

pub mod instance;
pub mod light;
pub mod material;
pub mod mesh;
pub mod texture;
