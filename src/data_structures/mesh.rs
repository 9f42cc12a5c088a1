//! GPU mesh handles and vertex formats.
//!
//! Meshes are uploaded by the caller's asset loader through
//! [`Mesh::new_static`] / [`Mesh::new_animated`] and then submitted by
//! handle every frame.

use std::{mem, sync::Arc};

use wgpu::util::DeviceExt;

pub type MeshHandle = Arc<Mesh>;

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

/// [`ModelVertex`] plus up to four bone influences.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkinnedVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    pub bone_weights: [f32; 4],
    pub bone_ids: [u32; 4],
}

impl From<ModelVertex> for SkinnedVertex {
    /// Fully bound to bone 0.
    fn from(v: ModelVertex) -> Self {
        Self {
            position: v.position,
            tex_coords: v.tex_coords,
            normal: v.normal,
            bone_weights: [1.0, 0.0, 0.0, 0.0],
            bone_ids: [0; 4],
        }
    }
}

const MODEL_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2, 2 => Float32x3];

const SKINNED_ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x2,
    2 => Float32x3,
    3 => Float32x4,
    4 => Uint32x4
];

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &MODEL_ATTRIBUTES,
        }
    }
}

impl Vertex for SkinnedVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<SkinnedVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &SKINNED_ATTRIBUTES,
        }
    }
}

/// Byte offsets of each attribute inside one vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: u64,
    pub position: u64,
    pub tex_coords: u64,
    pub normal: u64,
    pub bone_weights: Option<u64>,
    pub bone_ids: Option<u64>,
}

impl VertexLayout {
    pub const STATIC: Self = Self {
        stride: mem::size_of::<ModelVertex>() as u64,
        position: mem::offset_of!(ModelVertex, position) as u64,
        tex_coords: mem::offset_of!(ModelVertex, tex_coords) as u64,
        normal: mem::offset_of!(ModelVertex, normal) as u64,
        bone_weights: None,
        bone_ids: None,
    };

    pub const SKINNED: Self = Self {
        stride: mem::size_of::<SkinnedVertex>() as u64,
        position: mem::offset_of!(SkinnedVertex, position) as u64,
        tex_coords: mem::offset_of!(SkinnedVertex, tex_coords) as u64,
        normal: mem::offset_of!(SkinnedVertex, normal) as u64,
        bone_weights: Some(mem::offset_of!(SkinnedVertex, bone_weights) as u64),
        bone_ids: Some(mem::offset_of!(SkinnedVertex, bone_ids) as u64),
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Static,
    Animated,
}

/// How a mesh is drawn: through its index buffer when it has one,
/// otherwise as a plain triangle list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCall {
    Indexed(u32),
    NonIndexed(u32),
}

impl DrawCall {
    pub fn new(num_indices: Option<u32>, num_triangles: u32) -> Self {
        match num_indices {
            Some(n) => DrawCall::Indexed(n),
            None => DrawCall::NonIndexed(num_triangles * 3),
        }
    }

    pub fn count(&self) -> u32 {
        match *self {
            DrawCall::Indexed(n) | DrawCall::NonIndexed(n) => n,
        }
    }
}

#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub kind: MeshKind,
    pub layout: VertexLayout,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: Option<wgpu::Buffer>,
    pub num_vertices: u32,
    pub num_triangles: u32,
}

impl Mesh {
    pub fn new_static(
        device: &wgpu::Device,
        name: &str,
        vertices: &[ModelVertex],
        indices: Option<&[u32]>,
    ) -> Self {
        Self::upload(
            device,
            name,
            MeshKind::Static,
            VertexLayout::STATIC,
            bytemuck::cast_slice(vertices),
            vertices.len(),
            indices,
        )
    }

    pub fn new_animated(
        device: &wgpu::Device,
        name: &str,
        vertices: &[SkinnedVertex],
        indices: Option<&[u32]>,
    ) -> Self {
        Self::upload(
            device,
            name,
            MeshKind::Animated,
            VertexLayout::SKINNED,
            bytemuck::cast_slice(vertices),
            vertices.len(),
            indices,
        )
    }

    fn upload(
        device: &wgpu::Device,
        name: &str,
        kind: MeshKind,
        layout: VertexLayout,
        contents: &[u8],
        num_vertices: usize,
        indices: Option<&[u32]>,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = indices.map(|indices| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Index Buffer", name)),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });
        let num_triangles = match indices {
            Some(indices) => indices.len() / 3,
            None => num_vertices / 3,
        } as u32;

        Self {
            name: name.to_string(),
            kind,
            layout,
            vertex_buffer,
            index_buffer,
            num_vertices: num_vertices as u32,
            num_triangles,
        }
    }

    pub fn num_indices(&self) -> Option<u32> {
        self.index_buffer.as_ref().map(|_| self.num_triangles * 3)
    }

    pub fn draw_call(&self) -> DrawCall {
        DrawCall::new(self.num_indices(), self.num_triangles)
    }

    /// Binds the buffers and issues the draw for a single instance.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        match (self.draw_call(), &self.index_buffer) {
            (DrawCall::Indexed(n), Some(index_buffer)) => {
                render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..n, 0, 0..1);
            }
            (call, _) => render_pass.draw(0..call.count(), 0..1),
        }
    }
}
