use cgmath::{Deg, InnerSpace, Vector3};
use umbra::{
    config::FrameParams,
    data_structures::light::{DirectionalLight, Light, PointLight, SpotLight},
    shading::{self, Surface},
};

use crate::common::test_utils::{approx, approx_vec};

mod common;

fn white() -> Vector3<f32> {
    Vector3::new(1.0, 1.0, 1.0)
}

fn floor() -> Surface {
    Surface::default_material(Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0))
}

fn eye() -> Vector3<f32> {
    Vector3::new(0.0, 0.0, 5.0)
}

fn point_at(x: f32, brightness: f32) -> Light {
    PointLight {
        position: Vector3::new(x, 0.0, 2.0),
        color: white(),
        brightness,
    }
    .into()
}

#[test]
fn attenuation_is_inverse_quadratic() {
    assert_eq!(shading::attenuation(0.0), 1.0);
    assert!(approx(shading::attenuation(1.0), 0.5, 1e-6));
    assert!(approx(shading::attenuation(3.0), 0.1, 1e-6));
}

#[test]
fn tone_map_applies_exposure_then_gamma() {
    let params = FrameParams::default();
    let mapped = shading::tone_map(Vector3::new(0.1, 0.1, 0.1), &params);
    assert!(approx(mapped.x, 0.1f32.powf(1.0 / 2.2), 1e-6));
    assert_eq!(shading::to_unorm8(mapped.x), 90);

    let linear = FrameParams {
        gamma: 1.0,
        exposure: 2.0,
        ..FrameParams::default()
    };
    let mapped = shading::tone_map(Vector3::new(0.25, -1.0, 0.75), &linear);
    assert!(approx_vec(mapped, Vector3::new(0.5, 0.0, 1.5), 1e-6));
    assert_eq!(shading::to_unorm8(mapped.z), 255);
}

#[test]
fn empty_frame_is_ambient_only() {
    let params = FrameParams::default();
    let hdr = shading::accumulate(&[], &floor(), eye(), &params);
    assert!(approx_vec(hdr, params.global_illumination, 1e-6));
}

#[test]
fn accumulation_is_order_independent() {
    let params = FrameParams::default();
    let a = point_at(-1.0, 3.0);
    let b = point_at(1.5, 0.5);
    let c: Light = DirectionalLight {
        direction: Vector3::new(0.3, 0.0, -1.0),
        color: Vector3::new(1.0, 0.5, 0.25),
        brightness: 0.7,
    }
    .into();
    let forward = shading::accumulate(&[a, b, c], &floor(), eye(), &params);
    let backward = shading::accumulate(&[c, b, a], &floor(), eye(), &params);
    assert!(approx_vec(forward, backward, 1e-5));
}

#[test]
fn adding_a_light_never_darkens() {
    let params = FrameParams::default();
    let one = shading::accumulate(&[point_at(0.0, 1.0)], &floor(), eye(), &params);
    let two = shading::accumulate(
        &[point_at(0.0, 1.0), point_at(2.0, 1.0)],
        &floor(),
        eye(),
        &params,
    );
    assert!(two.x >= one.x && two.y >= one.y && two.z >= one.z);
}

#[test]
fn exposure_brightens_monotonically() {
    let hdr = Vector3::new(0.2, 0.4, 0.8);
    let mut last = 0.0;
    for exposure in [0.5, 1.0, 2.0, 4.0] {
        let params = FrameParams {
            exposure,
            ..FrameParams::default()
        };
        let mapped = shading::tone_map(hdr, &params);
        assert!(mapped.x > last);
        last = mapped.x;
    }
}

#[test]
fn lights_behind_the_surface_contribute_nothing() {
    let below: Light = PointLight {
        position: Vector3::new(0.0, 0.0, -2.0),
        color: white(),
        brightness: 10.0,
    }
    .into();
    assert_eq!(
        shading::contribution(&below, &floor(), eye()),
        Vector3::new(0.0, 0.0, 0.0)
    );
}

#[test]
fn overhead_point_light_on_rough_white_surface() {
    let light = point_at(0.0, 5.0);
    let lit = shading::contribution(&light, &floor(), eye());
    // Diffuse only: roughness 1 removes the specular lobe.
    assert!(approx_vec(lit, white() * 5.0 * shading::attenuation(2.0), 1e-5));
}

#[test]
fn spot_cone_falls_off_between_inner_and_outer() {
    let (cos_inner, cos_outer) = (Deg(20.0f32).0.to_radians().cos(), Deg(30.0f32).0.to_radians().cos());
    assert_eq!(shading::spot_cone(1.0, cos_inner, cos_outer), 1.0);
    assert_eq!(shading::spot_cone(Deg(40.0f32).0.to_radians().cos(), cos_inner, cos_outer), 0.0);
    let edge = shading::spot_cone(Deg(25.0f32).0.to_radians().cos(), cos_inner, cos_outer);
    assert!(edge > 0.0 && edge < 1.0);
}

#[test]
fn spot_outside_the_cone_is_dark() {
    let spot: Light = SpotLight {
        position: Vector3::new(0.0, 0.0, 2.0),
        direction: Vector3::new(0.0, 0.0, -1.0),
        inner: Deg(10.0).into(),
        outer: Deg(15.0).into(),
        color: white(),
        brightness: 10.0,
    }
    .into();
    let centre = shading::contribution(&spot, &floor(), eye());
    let mut off_axis = floor();
    off_axis.position = Vector3::new(3.0, 0.0, 0.0);
    let outside = shading::contribution(&spot, &off_axis, eye());
    assert!(centre.x > 0.0);
    assert_eq!(outside, Vector3::new(0.0, 0.0, 0.0));
}

#[test]
fn degenerate_spot_cone_stays_finite() {
    let spot = SpotLight {
        position: Vector3::new(0.0, 0.0, 2.0),
        direction: Vector3::new(0.0, 0.0, -1.0),
        inner: Deg(20.0).into(),
        outer: Deg(20.0).into(),
        color: white(),
        brightness: 1.0,
    };
    let (cos_inner, cos_outer) = spot.cone_cosines();
    assert!(cos_inner > cos_outer);
    let lit = shading::contribution(&spot.into(), &floor(), eye());
    assert!(lit.magnitude().is_finite());
}

#[test]
fn metallic_surfaces_have_no_diffuse() {
    let mut metal = floor();
    metal.metallic = 1.0;
    metal.roughness = 1.0;
    let lit = shading::contribution(&point_at(0.0, 5.0), &metal, eye());
    assert_eq!(lit, Vector3::new(0.0, 0.0, 0.0));
}
