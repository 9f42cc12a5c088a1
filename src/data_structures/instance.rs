//! Per-frame submissions and their GPU representations.
//!
//! [`MeshInstance`] and [`DebugInstance`] live in the frame accumulator
//! from the submission call until the next `begin_frame`. The `*Raw` types
//! are what the uniform arenas hold.

use cgmath::{Matrix, Matrix4, SquareMatrix, Vector3};

use crate::data_structures::{material::MaterialHandle, mesh::MeshHandle};

/// Size of the bone palette bound for skinned draws.
pub const MAX_BONES: usize = 64;

/// One mesh drawn with one material at one transform.
///
/// `bones` is only present for animated submissions and holds at most
/// [`MAX_BONES`] matrices.
#[derive(Debug, Clone)]
pub struct MeshInstance<M = MeshHandle, T = MaterialHandle> {
    pub mesh: M,
    pub material: T,
    pub transform: Matrix4<f32>,
    pub bones: Option<Vec<Matrix4<f32>>>,
}

impl<M, T> MeshInstance<M, T> {
    pub fn is_animated(&self) -> bool {
        self.bones.is_some()
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw::from_transform(&self.transform)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `model`, so non-uniform scale keeps normals perpendicular.
    pub normal: [[f32; 4]; 4],
}

impl InstanceRaw {
    pub fn from_transform(transform: &Matrix4<f32>) -> Self {
        let normal = transform
            .invert()
            .map(|inv| inv.transpose())
            .unwrap_or_else(Matrix4::identity);
        Self {
            model: (*transform).into(),
            normal: normal.into(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BonePalette {
    pub matrices: [[[f32; 4]; 4]; MAX_BONES],
}

impl BonePalette {
    pub fn identity() -> Self {
        Self {
            matrices: [Matrix4::<f32>::identity().into(); MAX_BONES],
        }
    }

    /// Slots past `bones.len()` stay identity.
    pub fn from_bones(bones: &[Matrix4<f32>]) -> Self {
        let mut palette = Self::identity();
        for (slot, bone) in palette.matrices.iter_mut().zip(bones) {
            *slot = (*bone).into();
        }
        palette
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugShape {
    Cube,
    Sphere,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugInstance {
    pub shape: DebugShape,
    pub transform: Matrix4<f32>,
    pub color: Vector3<f32>,
}

impl DebugInstance {
    pub fn to_raw(&self) -> DebugRaw {
        DebugRaw {
            model: self.transform.into(),
            color: self.color.extend(1.0).into(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DebugRaw {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}
