//! Loading and validating WGSL programs.
//!
//! Shaders are external text resources read by path at init. A missing file
//! or a program naga rejects fails init before any pipeline is created.

use std::path::{Path, PathBuf};

use crate::error::InitError;

pub const GEOMETRY: &str = "geometry.wgsl";
pub const SHADOW: &str = "shadow.wgsl";
pub const LIGHTING: &str = "lighting.wgsl";
pub const COMPOSITE: &str = "composite.wgsl";
pub const DEBUG: &str = "debug.wgsl";

pub const ALL: [&str; 5] = [GEOMETRY, SHADOW, LIGHTING, COMPOSITE, DEBUG];

/// A program that parsed and validated.
#[derive(Debug, Clone)]
pub struct Shader {
    pub path: PathBuf,
    pub source: String,
    pub module: naga::Module,
}

impl Shader {
    pub fn load(dir: &Path, name: &str) -> Result<Self, InitError> {
        let path = dir.join(name);
        let source = std::fs::read_to_string(&path).map_err(|source| InitError::ShaderRead {
            path: path.clone(),
            source,
        })?;
        Self::from_source(path, source)
    }

    pub fn from_source(path: PathBuf, source: String) -> Result<Self, InitError> {
        match validate_wgsl(&source) {
            Ok(module) => {
                log::debug!("validated shader {:?}", path);
                Ok(Self {
                    path,
                    source,
                    module,
                })
            }
            Err(message) => Err(InitError::ShaderCompile { path, message }),
        }
    }

    pub fn has_entry_point(&self, name: &str) -> bool {
        self.module.entry_points.iter().any(|ep| ep.name == name)
    }

    pub fn create_module(&self, device: &wgpu::Device) -> wgpu::ShaderModule {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: self.path.file_name().and_then(|n| n.to_str()),
            source: wgpu::ShaderSource::Wgsl(self.source.as_str().into()),
        })
    }
}

/// Parses and validates WGSL, returning a printable diagnostic on failure.
pub fn validate_wgsl(source: &str) -> Result<naga::Module, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    )
    .validate(&module)
    .map_err(|e| e.emit_to_string(source))?;
    Ok(module)
}

/// Every program the renderer needs, in [`ALL`] order.
pub fn load_all(dir: &Path) -> Result<Vec<Shader>, InitError> {
    ALL.iter().map(|name| Shader::load(dir, name)).collect()
}
