//! Engine-owned assets: default material textures and primitive meshes.

use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::DebugShape,
        material::DefaultTextures,
        mesh::{Mesh, MeshHandle},
    },
    resources::primitives::{self, Geometry},
};

/// A mesh drawn as a line list.
#[derive(Debug)]
pub struct LineMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
}

impl LineMesh {
    pub fn from_geometry(device: &wgpu::Device, name: &str, geometry: &Geometry) -> Self {
        let indices = primitives::wire_indices(&geometry.indices);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} wire vertices", name)),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} wire indices", name)),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            num_indices: indices.len() as u32,
        }
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.num_indices, 0, 0..1);
    }
}

#[derive(Debug)]
pub struct Fallbacks {
    pub textures: DefaultTextures,
    /// Drawn by every full-screen pass.
    pub screen_quad: Mesh,
    pub plane: MeshHandle,
    pub cube: MeshHandle,
    pub sphere: MeshHandle,
    pub cube_wire: LineMesh,
    pub sphere_wire: LineMesh,
}

impl Fallbacks {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let upload = |name: &str, geometry: &Geometry| {
            Mesh::new_static(device, name, &geometry.vertices, Some(&geometry.indices))
        };
        let cube = primitives::cube();
        let sphere = primitives::sphere();
        Self {
            textures: DefaultTextures::new(device, queue),
            screen_quad: upload("screen quad", &primitives::screen_quad()),
            plane: Arc::new(upload("plane", &primitives::plane(1.0))),
            cube_wire: LineMesh::from_geometry(device, "cube", &cube),
            sphere_wire: LineMesh::from_geometry(device, "sphere", &sphere),
            cube: Arc::new(upload("cube", &cube)),
            sphere: Arc::new(upload("sphere", &sphere)),
        }
    }

    pub fn wire(&self, shape: DebugShape) -> &LineMesh {
        match shape {
            DebugShape::Cube => &self.cube_wire,
            DebugShape::Sphere => &self.sphere_wire,
        }
    }
}
