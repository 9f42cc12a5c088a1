//! Light submissions, per-type dispatch and the light uniform.

use cgmath::{InnerSpace, Rad, Vector3};

use crate::shadow::ShadowTechnique;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vector3<f32>,
    pub color: Vector3<f32>,
    pub brightness: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Direction the light travels in.
    pub direction: Vector3<f32>,
    pub color: Vector3<f32>,
    pub brightness: f32,
}

/// `inner` and `outer` are half-angles measured from `direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub position: Vector3<f32>,
    pub direction: Vector3<f32>,
    pub inner: Rad<f32>,
    pub outer: Rad<f32>,
    pub color: Vector3<f32>,
    pub brightness: f32,
}

impl SpotLight {
    /// `(cos inner, cos outer)`, with inner kept strictly inside outer so
    /// the falloff never divides by zero.
    pub fn cone_cosines(&self) -> (f32, f32) {
        let cos_outer = self.outer.0.cos();
        (self.inner.0.cos().max(cos_outer + 1e-4), cos_outer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Point(PointLight),
    Directional(DirectionalLight),
    Spot(SpotLight),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LightKind {
    Point,
    Directional,
    Spot,
}

/// A light's position inside its per-kind accumulator list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightId {
    pub kind: LightKind,
    pub index: usize,
}

impl LightId {
    pub fn new(kind: LightKind, index: usize) -> Self {
        Self { kind, index }
    }
}

/// How one kind of light is shadowed and shaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightStrategy {
    pub kind: LightKind,
    pub shadow: ShadowTechnique,
    /// Fragment entry point in `lighting.wgsl`.
    pub entry_point: &'static str,
}

pub const LIGHT_STRATEGIES: [LightStrategy; 3] = [
    LightStrategy {
        kind: LightKind::Point,
        shadow: ShadowTechnique::Cube,
        entry_point: "fs_point",
    },
    LightStrategy {
        kind: LightKind::Directional,
        shadow: ShadowTechnique::None,
        entry_point: "fs_directional",
    },
    LightStrategy {
        kind: LightKind::Spot,
        shadow: ShadowTechnique::Perspective,
        entry_point: "fs_spot",
    },
];

impl LightKind {
    pub fn strategy(self) -> &'static LightStrategy {
        match self {
            LightKind::Point => &LIGHT_STRATEGIES[0],
            LightKind::Directional => &LIGHT_STRATEGIES[1],
            LightKind::Spot => &LIGHT_STRATEGIES[2],
        }
    }

    pub fn shadow(self) -> ShadowTechnique {
        self.strategy().shadow
    }
}

impl Light {
    pub fn kind(&self) -> LightKind {
        match self {
            Light::Point(_) => LightKind::Point,
            Light::Directional(_) => LightKind::Directional,
            Light::Spot(_) => LightKind::Spot,
        }
    }

    pub fn to_uniform(&self) -> LightUniform {
        match self {
            Light::Point(l) => LightUniform {
                position: l.position.extend(1.0).into(),
                direction: [0.0; 4],
                color: l.color.extend(l.brightness).into(),
                cone: [0.0; 4],
            },
            Light::Directional(l) => LightUniform {
                position: [0.0; 4],
                direction: normalize_or_down(l.direction).extend(0.0).into(),
                color: l.color.extend(l.brightness).into(),
                cone: [0.0; 4],
            },
            Light::Spot(l) => {
                let (cos_inner, cos_outer) = l.cone_cosines();
                LightUniform {
                    position: l.position.extend(1.0).into(),
                    direction: normalize_or_down(l.direction).extend(0.0).into(),
                    color: l.color.extend(l.brightness).into(),
                    cone: [cos_inner, cos_outer, 0.0, 0.0],
                }
            }
        }
    }
}

impl From<PointLight> for Light {
    fn from(light: PointLight) -> Self {
        Light::Point(light)
    }
}

impl From<DirectionalLight> for Light {
    fn from(light: DirectionalLight) -> Self {
        Light::Directional(light)
    }
}

impl From<SpotLight> for Light {
    fn from(light: SpotLight) -> Self {
        Light::Spot(light)
    }
}

pub(crate) fn normalize_or_down(v: Vector3<f32>) -> Vector3<f32> {
    if v.magnitude2() > f32::EPSILON {
        v.normalize()
    } else {
        -Vector3::unit_y()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub position: [f32; 4],
    pub direction: [f32; 4],
    /// rgb = color, a = brightness
    pub color: [f32; 4],
    /// x = cos(inner), y = cos(outer)
    pub cone: [f32; 4],
}
