//! CPU mirror of the lighting model in `lighting.wgsl` and `composite.wgsl`.
//!
//! Used to predict pixel values and to reason about blending properties
//! without a device. Keep in sync with the shaders.

use cgmath::{ElementWise, InnerSpace, Vector3};

use crate::{
    config::FrameParams,
    data_structures::light::{normalize_or_down, Light},
};

/// A decoded G-buffer texel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub albedo: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub position: Vector3<f32>,
    pub metallic: f32,
    pub roughness: f32,
}

impl Surface {
    /// What an empty material produces.
    pub fn default_material(position: Vector3<f32>, normal: Vector3<f32>) -> Self {
        Self {
            albedo: Vector3::new(1.0, 1.0, 1.0),
            normal: normal.normalize(),
            position,
            metallic: 0.0,
            roughness: 1.0,
        }
    }
}

pub fn attenuation(distance: f32) -> f32 {
    1.0 / (1.0 + distance * distance)
}

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub fn spot_cone(cos_angle: f32, cos_inner: f32, cos_outer: f32) -> f32 {
    smoothstep(cos_outer, cos_inner, cos_angle)
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Response of `surface` to unit radiance arriving from direction `l`.
pub fn brdf(surface: &Surface, l: Vector3<f32>, eye: Vector3<f32>) -> Vector3<f32> {
    let n_dot_l = surface.normal.dot(l).max(0.0);
    let v = (eye - surface.position).normalize();
    let h = (l + v).normalize();
    let shininess = mix(256.0, 2.0, surface.roughness);
    let f0 = surface.albedo * surface.metallic
        + Vector3::new(0.04, 0.04, 0.04) * (1.0 - surface.metallic);
    let specular = f0
        * surface.normal.dot(h).max(0.0).powf(shininess)
        * (1.0 - surface.roughness);
    let diffuse = surface.albedo * (1.0 - surface.metallic);
    (diffuse + specular) * n_dot_l
}

/// Unshadowed contribution of one light.
pub fn contribution(light: &Light, surface: &Surface, eye: Vector3<f32>) -> Vector3<f32> {
    match light {
        Light::Directional(l) => {
            let dir = -normalize_or_down(l.direction);
            brdf(surface, dir, eye).mul_element_wise(l.color) * l.brightness
        }
        Light::Point(l) => {
            let to_light = l.position - surface.position;
            let distance = to_light.magnitude();
            let dir = to_light / distance.max(1e-4);
            brdf(surface, dir, eye).mul_element_wise(l.color) * l.brightness * attenuation(distance)
        }
        Light::Spot(l) => {
            let to_light = l.position - surface.position;
            let distance = to_light.magnitude();
            let dir = to_light / distance.max(1e-4);
            let (cos_inner, cos_outer) = l.cone_cosines();
            let cone = spot_cone(
                (-dir).dot(normalize_or_down(l.direction)),
                cos_inner,
                cos_outer,
            );
            brdf(surface, dir, eye).mul_element_wise(l.color)
                * l.brightness
                * attenuation(distance)
                * cone
        }
    }
}

pub fn ambient(global_illumination: Vector3<f32>, albedo: Vector3<f32>) -> Vector3<f32> {
    global_illumination.mul_element_wise(albedo)
}

/// `pow(max(hdr * exposure, 0), 1 / gamma)`.
pub fn tone_map(hdr: Vector3<f32>, params: &FrameParams) -> Vector3<f32> {
    let map = |c: f32| (c * params.exposure).max(0.0).powf(1.0 / params.gamma);
    Vector3::new(map(hdr.x), map(hdr.y), map(hdr.z))
}

/// HDR value of one pixel: ambient plus every light, summed.
pub fn accumulate(
    lights: &[Light],
    surface: &Surface,
    eye: Vector3<f32>,
    params: &FrameParams,
) -> Vector3<f32> {
    lights
        .iter()
        .map(|light| contribution(light, surface, eye))
        .fold(ambient(params.global_illumination, surface.albedo), |acc, c| acc + c)
}

/// Quantisation applied by a `Rgba8Unorm` target.
pub fn to_unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
