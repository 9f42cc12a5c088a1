//! Shadow map bookkeeping and light-space matrices.
//!
//! The perspective map and the cube map are each a single shared target.
//! Every shadowed light goes through `acquire` (its shadow pass renders),
//! `consume` (its accumulation draw samples) and `release` before the next
//! light of the same technique may render. [`ShadowSlot`] makes that
//! discipline checkable instead of relying on call order alone.

use cgmath::{Deg, EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, Vector3};

use crate::{
    camera::OPENGL_TO_WGPU_MATRIX,
    config::ShadowSettings,
    data_structures::light::{normalize_or_down, LightId, PointLight, SpotLight},
    error::ShadowSlotError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadowTechnique {
    None,
    /// One 2D depth map rendered with a perspective projection.
    Perspective,
    /// Six faces storing linear distance to the light.
    Cube,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Free,
    HeldBy(LightId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowSlot {
    state: SlotState,
}

impl Default for ShadowSlot {
    fn default() -> Self {
        Self {
            state: SlotState::Free,
        }
    }
}

impl ShadowSlot {
    pub fn state(&self) -> SlotState {
        self.state
    }

    /// Claims the slot for `light` before its shadow pass writes the map.
    pub fn acquire(&mut self, light: LightId) -> Result<(), ShadowSlotError> {
        match self.state {
            SlotState::Free => {
                self.state = SlotState::HeldBy(light);
                Ok(())
            }
            SlotState::HeldBy(holder) if holder == light => Ok(()),
            SlotState::HeldBy(holder) => Err(ShadowSlotError::Busy {
                holder,
                requester: light,
            }),
        }
    }

    /// Checks that the map about to be sampled was rendered for `light`.
    pub fn consume(&self, light: LightId) -> Result<(), ShadowSlotError> {
        match self.state {
            SlotState::HeldBy(holder) if holder == light => Ok(()),
            SlotState::HeldBy(holder) => Err(ShadowSlotError::Stale {
                holder,
                requester: light,
            }),
            SlotState::Free => Err(ShadowSlotError::NotHeld { requester: light }),
        }
    }

    pub fn release(&mut self, light: LightId) -> Result<(), ShadowSlotError> {
        self.consume(light)?;
        self.state = SlotState::Free;
        Ok(())
    }
}

/// One slot per shared shadow target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShadowSlots {
    pub perspective: ShadowSlot,
    pub cube: ShadowSlot,
}

impl ShadowSlots {
    /// `None` for techniques without a target.
    pub fn slot_mut(&mut self, technique: ShadowTechnique) -> Option<&mut ShadowSlot> {
        match technique {
            ShadowTechnique::None => None,
            ShadowTechnique::Perspective => Some(&mut self.perspective),
            ShadowTechnique::Cube => Some(&mut self.cube),
        }
    }

    pub fn all_free(&self) -> bool {
        self.perspective.state() == SlotState::Free && self.cube.state() == SlotState::Free
    }
}

/// Look direction and up vector of each cube face, in layer order
/// +X, -X, +Y, -Y, +Z, -Z.
pub const CUBE_FACES: [([f32; 3], [f32; 3]); 6] = [
    ([1.0, 0.0, 0.0], [0.0, -1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, -1.0, 0.0]),
    ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
    ([0.0, -1.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, 0.0, 1.0], [0.0, -1.0, 0.0]),
    ([0.0, 0.0, -1.0], [0.0, -1.0, 0.0]),
];

/// Layer holding `dir` (light to point): the face of its major axis.
pub fn cube_face_index(dir: Vector3<f32>) -> usize {
    let a = Vector3::new(dir.x.abs(), dir.y.abs(), dir.z.abs());
    if a.x >= a.y && a.x >= a.z {
        if dir.x > 0.0 { 0 } else { 1 }
    } else if a.y >= a.z {
        if dir.y > 0.0 { 2 } else { 3 }
    } else if dir.z > 0.0 {
        4
    } else {
        5
    }
}

pub fn cube_view_projs(light: &PointLight, settings: &ShadowSettings) -> [Matrix4<f32>; 6] {
    let proj =
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(Deg(90.0), 1.0, settings.near, settings.far);
    let eye = Point3::from_vec(light.position);
    CUBE_FACES.map(|(dir, up)| {
        let view = Matrix4::look_at_rh(eye, eye + Vector3::from(dir), Vector3::from(up));
        proj * view
    })
}

/// `perspective(2 * outer, 1, near, far) * look_at(position, position + direction)`.
pub fn spot_view_proj(light: &SpotLight, settings: &ShadowSettings) -> Matrix4<f32> {
    let fovy = Rad((2.0 * light.outer.0).clamp(
        Rad::from(Deg(1.0)).0,
        Rad::from(Deg(179.0)).0,
    ));
    let proj = OPENGL_TO_WGPU_MATRIX * cgmath::perspective(fovy, 1.0, settings.near, settings.far);
    let dir = normalize_or_down(light.direction);
    let up = if dir.dot(Vector3::unit_y()).abs() > 0.99 {
        Vector3::unit_z()
    } else {
        Vector3::unit_y()
    };
    let eye = Point3::from_vec(light.position);
    proj * Matrix4::look_at_rh(eye, eye + dir, up)
}

/// Per-face camera for the shadow passes.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FaceUniform {
    pub view_proj: [[f32; 4]; 4],
    /// xyz = light position
    pub light: [f32; 4],
}

/// What the lighting pass needs to sample a light's shadow map.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowUniform {
    /// Spot lights use entry 0, point lights one per cube face.
    pub view_proj: [[[f32; 4]; 4]; 6],
    /// x = bias, y = texel size, z = pcf
    pub params: [f32; 4],
}

impl ShadowUniform {
    pub fn unshadowed() -> Self {
        bytemuck::Zeroable::zeroed()
    }

    pub fn spot(view_proj: Matrix4<f32>, settings: &ShadowSettings) -> Self {
        let mut uniform = Self::unshadowed();
        uniform.view_proj[0] = view_proj.into();
        uniform.params = [
            settings.depth_bias,
            1.0 / settings.spot_resolution.max(1) as f32,
            if settings.pcf { 1.0 } else { 0.0 },
            0.0,
        ];
        uniform
    }

    pub fn cube(faces: &[Matrix4<f32>; 6], settings: &ShadowSettings) -> Self {
        let mut uniform = Self::unshadowed();
        for (slot, face) in uniform.view_proj.iter_mut().zip(faces) {
            *slot = (*face).into();
        }
        uniform.params = [
            settings.distance_bias,
            1.0 / settings.cube_resolution.max(1) as f32,
            0.0,
            0.0,
        ];
        uniform
    }
}
