#[cfg(feature = "integration-tests")]
use cgmath::{Deg, Matrix4, Point3, Rad, Vector3};
#[cfg(feature = "integration-tests")]
use umbra::{
    data_structures::{
        light::{DirectionalLight, PointLight, SpotLight},
        material::{Material, MaterialSlot},
        mesh::{Mesh, SkinnedVertex},
        texture::Texture,
    },
    frame::{FrameState, PassCommand},
    renderer::Renderer,
    resources::primitives,
    shading::{self, Surface},
    FrameParams,
};

#[cfg(feature = "integration-tests")]
use crate::common::test_utils::{intensity_at, mean_intensity, test_config};

#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
const WIDTH: u32 = 800;
#[cfg(feature = "integration-tests")]
const HEIGHT: u32 = 600;

#[cfg(feature = "integration-tests")]
fn white() -> Vector3<f32> {
    Vector3::new(1.0, 1.0, 1.0)
}

/// Pixel column of world point `(x, 0, 0)` seen from the default camera.
#[cfg(feature = "integration-tests")]
fn column_of(x: f32) -> u32 {
    let half_width = 5.0 * Rad::from(Deg(22.5f32)).0.tan() * WIDTH as f32 / HEIGHT as f32;
    ((x / half_width + 1.0) * 0.5 * WIDTH as f32) as u32
}

/// Linear output, no ambient, and a 6x6 receiver plane at z = 0.
#[cfg(feature = "integration-tests")]
fn begin_lit_scene(renderer: &mut Renderer) {
    renderer.set_gamma(1.0);
    renderer.set_global_illumination(Vector3::new(0.0, 0.0, 0.0));
    renderer.begin_frame();
    let material = std::sync::Arc::new(Material::new("plain"));
    let plane = renderer.plane();
    assert!(renderer.add_static_mesh(plane, material, Matrix4::from_scale(6.0)));
}

#[test]
#[cfg(feature = "integration-tests")]
fn init_produces_a_closed_renderer() {
    with_renderer!(test_config(WIDTH, HEIGHT), |renderer| {
        assert_eq!(renderer.frame_state(), FrameState::Closed);
        assert_eq!(renderer.output().size(), [WIDTH, HEIGHT]);
        assert!(renderer.last_plan().is_none());
        assert!(!renderer.end_frame());
    });
}

#[test]
#[cfg(feature = "integration-tests")]
fn empty_frame_is_tone_mapped_ambient() {
    with_renderer!(test_config(WIDTH, HEIGHT), |renderer| {
        renderer.begin_frame();
        assert!(renderer.end_frame());
        let image = renderer.read_output_blocking().unwrap();

        let expected = shading::tone_map(Vector3::new(0.1, 0.1, 0.1), &FrameParams::default());
        let expected = shading::to_unorm8(expected.x) as i32;
        for pixel in image.pixels() {
            for channel in &pixel.0[..3] {
                assert!((*channel as i32 - expected).abs() <= 2, "{:?}", pixel);
            }
            assert_eq!(pixel.0[3], 255);
        }
        let plan = renderer.last_plan().unwrap();
        assert_eq!(plan.commands.first(), Some(&PassCommand::Geometry));
        assert_eq!(plan.lights().count(), 0);
    });
}

#[test]
#[cfg(feature = "integration-tests")]
fn point_light_matches_the_reference_model() {
    with_renderer!(test_config(WIDTH, HEIGHT), |renderer| {
        begin_lit_scene(&mut renderer);
        let light = PointLight {
            position: Vector3::new(0.0, 0.0, 2.0),
            color: white(),
            brightness: 2.0,
        };
        renderer.add_point_light(light);
        renderer.end_frame();
        let image = renderer.read_output_blocking().unwrap();

        let surface = Surface::default_material(Vector3::new(0.0, 0.0, 0.0), Vector3::unit_z());
        let predicted = shading::contribution(&light.into(), &surface, Vector3::new(0.0, 0.0, 5.0));
        let predicted = shading::to_unorm8(predicted.x) as f32;
        let centre = intensity_at(&image, WIDTH / 2, HEIGHT / 2);
        assert!((centre - predicted).abs() <= 3.0, "{} vs {}", centre, predicted);
        assert!(intensity_at(&image, 2, 2) < centre);
    });
}

#[test]
#[cfg(feature = "integration-tests")]
fn directional_light_is_uniform() {
    with_renderer!(test_config(WIDTH, HEIGHT), |renderer| {
        begin_lit_scene(&mut renderer);
        renderer.add_directional_light(DirectionalLight {
            direction: Vector3::new(0.0, 0.0, -1.0),
            color: white(),
            brightness: 0.5,
        });
        renderer.end_frame();
        let image = renderer.read_output_blocking().unwrap();
        for (x, y) in [(WIDTH / 2, HEIGHT / 2), (3, 3), (WIDTH - 3, HEIGHT - 3)] {
            let value = intensity_at(&image, x, y);
            assert!((value - 128.0).abs() <= 1.5, "{} at {},{}", value, x, y);
        }
    });
}

#[test]
#[cfg(feature = "integration-tests")]
fn spot_light_stays_inside_its_cone() {
    with_renderer!(test_config(WIDTH, HEIGHT), |renderer| {
        begin_lit_scene(&mut renderer);
        renderer.add_spot_light(SpotLight {
            position: Vector3::new(0.0, 0.0, 3.0),
            direction: Vector3::new(0.0, 0.0, -1.0),
            inner: Deg(10.0).into(),
            outer: Deg(20.0).into(),
            color: white(),
            brightness: 5.0,
        });
        renderer.end_frame();
        let image = renderer.read_output_blocking().unwrap();
        assert!(intensity_at(&image, WIDTH / 2, HEIGHT / 2) > 50.0);
        assert_eq!(intensity_at(&image, 5, 5), 0.0);
    });
}

#[test]
#[cfg(feature = "integration-tests")]
fn light_submission_order_does_not_matter() {
    with_renderer!(test_config(WIDTH, HEIGHT), |renderer| {
        let a = PointLight {
            position: Vector3::new(-1.0, 0.5, 1.5),
            color: Vector3::new(1.0, 0.2, 0.2),
            brightness: 2.0,
        };
        let b = PointLight {
            position: Vector3::new(1.5, -0.5, 2.0),
            color: Vector3::new(0.2, 0.2, 1.0),
            brightness: 3.0,
        };
        let mut images = Vec::new();
        for lights in [[a, b], [b, a]] {
            begin_lit_scene(&mut renderer);
            for light in lights {
                renderer.add_point_light(light);
            }
            renderer.end_frame();
            images.push(renderer.read_output_blocking().unwrap());
        }
        for (p, q) in images[0].pixels().zip(images[1].pixels()) {
            for c in 0..3 {
                assert!((p.0[c] as i32 - q.0[c] as i32).abs() <= 1);
            }
        }
    });
}

#[test]
#[cfg(feature = "integration-tests")]
fn exposure_brightens_the_image() {
    with_renderer!(test_config(WIDTH, HEIGHT), |renderer| {
        let mut means = Vec::new();
        for exposure in [0.5, 1.0, 2.0] {
            renderer.set_exposure(exposure);
            begin_lit_scene(&mut renderer);
            renderer.add_point_light(PointLight {
                position: Vector3::new(0.0, 0.0, 2.0),
                color: white(),
                brightness: 1.0,
            });
            renderer.end_frame();
            means.push(mean_intensity(&renderer.read_output_blocking().unwrap()));
        }
        assert!(means[0] < means[1] && means[1] < means[2], "{:?}", means);
    });
}

#[test]
#[cfg(feature = "integration-tests")]
fn shadow_maps_are_reused_per_light() {
    with_renderer!(test_config(WIDTH, HEIGHT), |renderer| {
        let left = PointLight {
            position: Vector3::new(-3.0, 0.0, 2.0),
            color: white(),
            brightness: 4.0,
        };
        let right = PointLight {
            position: Vector3::new(3.0, 0.0, 2.0),
            ..left
        };
        let occluder = Matrix4::from_translation(Vector3::new(-1.5, 0.0, 1.0))
            * Matrix4::from_scale(0.5);

        let mut images = Vec::new();
        for with_occluder in [false, true] {
            begin_lit_scene(&mut renderer);
            if with_occluder {
                let material = std::sync::Arc::new(Material::new("occluder"));
                let cube = renderer.cube();
                renderer.add_static_mesh(cube, material, occluder);
            }
            renderer.add_point_light(left);
            renderer.add_point_light(right);
            renderer.end_frame();
            images.push(renderer.read_output_blocking().unwrap());
        }
        let (open, blocked) = (&images[0], &images[1]);
        let y = HEIGHT / 2;

        // The left light's occluder shadows the origin; only the right light remains.
        let centre = column_of(0.0);
        let surface = Surface::default_material(Vector3::new(0.0, 0.0, 0.0), Vector3::unit_z());
        let eye = Vector3::new(0.0, 0.0, 5.0);
        let right_only = shading::to_unorm8(shading::contribution(&right.into(), &surface, eye).x);
        assert!(intensity_at(blocked, centre, y) < intensity_at(open, centre, y) - 20.0);
        assert!((intensity_at(blocked, centre, y) - right_only as f32).abs() <= 4.0);

        // Outside the shadow both lights still reach the plane.
        let clear = column_of(2.5);
        assert!((intensity_at(blocked, clear, y) - intensity_at(open, clear, y)).abs() <= 2.0);

        let plan = renderer.last_plan().unwrap();
        let shadows = plan
            .commands
            .iter()
            .filter(|c| matches!(c, PassCommand::Shadow(_)))
            .count();
        assert_eq!(shadows, 2);
        assert!(plan.validate().is_ok());
    });
}

/// Spot light at `from`, aimed at `target` on the receiver plane.
#[cfg(feature = "integration-tests")]
fn spot_aimed_at(from: Vector3<f32>, target: Vector3<f32>, brightness: f32) -> SpotLight {
    SpotLight {
        position: from,
        direction: target - from,
        inner: Deg(25.0).into(),
        outer: Deg(35.0).into(),
        color: white(),
        brightness,
    }
}

#[cfg(feature = "integration-tests")]
fn add_occluder(renderer: &mut Renderer, centre: Vector3<f32>) {
    let material = std::sync::Arc::new(Material::new("occluder"));
    let cube = renderer.cube();
    assert!(renderer.add_static_mesh(
        cube,
        material,
        Matrix4::from_translation(centre) * Matrix4::from_scale(0.5),
    ));
}

#[test]
#[cfg(feature = "integration-tests")]
fn spot_light_casts_shadows() {
    with_renderer!(test_config(WIDTH, HEIGHT), |renderer| {
        let spot = spot_aimed_at(Vector3::new(-3.0, 0.0, 2.0), Vector3::new(0.0, 0.0, 0.0), 10.0);

        let mut images = Vec::new();
        for with_occluder in [false, true] {
            begin_lit_scene(&mut renderer);
            if with_occluder {
                add_occluder(&mut renderer, Vector3::new(-1.5, 0.0, 1.0));
            }
            renderer.add_spot_light(spot);
            renderer.end_frame();
            images.push(renderer.read_output_blocking().unwrap());
        }
        let (open, blocked) = (&images[0], &images[1]);
        let y = HEIGHT / 2;

        let centre = column_of(0.0);
        let surface = Surface::default_material(Vector3::new(0.0, 0.0, 0.0), Vector3::unit_z());
        let eye = Vector3::new(0.0, 0.0, 5.0);
        let lit = shading::to_unorm8(shading::contribution(&spot.into(), &surface, eye).x);
        assert!((intensity_at(open, centre, y) - lit as f32).abs() <= 3.0);
        assert!(intensity_at(blocked, centre, y) <= 3.0, "{}", intensity_at(blocked, centre, y));

        // The lit side of the cone is unaffected by the occluder.
        let clear = column_of(1.5);
        assert!(intensity_at(open, clear, y) > 20.0);
        assert!((intensity_at(blocked, clear, y) - intensity_at(open, clear, y)).abs() <= 2.0);

        let plan = renderer.last_plan().unwrap();
        assert!(plan.commands.contains(&PassCommand::Shadow(plan.lights().next().unwrap())));
        assert!(plan.validate().is_ok());
    });
}

#[test]
#[cfg(feature = "integration-tests")]
fn point_and_spot_shadows_stay_with_their_light() {
    with_renderer!(test_config(WIDTH, HEIGHT), |renderer| {
        let point = PointLight {
            position: Vector3::new(-3.0, 0.0, 2.0),
            color: white(),
            brightness: 10.0,
        };
        let spot = spot_aimed_at(Vector3::new(3.0, 0.0, 2.0), Vector3::new(0.0, 0.0, 0.0), 6.0);
        // Blocks the point light at the origin.
        let point_blocker = Vector3::new(-1.5, 0.0, 1.0);
        // Blocks the spot light at x = 1.5.
        let spot_blocker = Vector3::new(2.25, 0.0, 1.0);

        let mut render = |with_point: bool, with_spot: bool| {
            begin_lit_scene(&mut renderer);
            add_occluder(&mut renderer, point_blocker);
            add_occluder(&mut renderer, spot_blocker);
            if with_point {
                renderer.add_point_light(point);
            }
            if with_spot {
                renderer.add_spot_light(spot);
            }
            renderer.end_frame();
            renderer.read_output_blocking().unwrap()
        };
        let point_only = render(true, false);
        let spot_only = render(false, true);
        let both = render(true, true);
        let y = HEIGHT / 2;
        let (origin, spot_shadowed) = (column_of(0.0), column_of(1.5));

        assert!(intensity_at(&point_only, origin, y) <= 3.0);
        assert!(intensity_at(&spot_only, origin, y) > 20.0);
        assert!(intensity_at(&spot_only, spot_shadowed, y) <= 3.0);
        assert!(intensity_at(&point_only, spot_shadowed, y) > 20.0);

        // Each light keeps its own shadows when both share a frame.
        for x in [origin, spot_shadowed] {
            let sum = intensity_at(&point_only, x, y) + intensity_at(&spot_only, x, y);
            let combined = intensity_at(&both, x, y);
            assert!((combined - sum).abs() <= 3.0, "{} vs {} at column {}", combined, sum, x);
        }

        let plan = renderer.last_plan().unwrap();
        let shadows = plan
            .commands
            .iter()
            .filter(|c| matches!(c, PassCommand::Shadow(_)))
            .count();
        assert_eq!(shadows, 2);
        assert!(plan.validate().is_ok());
    });
}

#[test]
#[cfg(feature = "integration-tests")]
fn distant_point_light_adds_to_the_ambient_baseline() {
    with_renderer!(test_config(WIDTH, HEIGHT), |renderer| {
        let mut images = Vec::new();
        for with_light in [false, true] {
            renderer.begin_frame();
            let quad = renderer.plane();
            let material = std::sync::Arc::new(Material::new("defaults only"));
            assert!(renderer.add_static_mesh(quad, material, Matrix4::from_scale(1.0)));
            if with_light {
                renderer.add_point_light(PointLight {
                    position: Vector3::new(0.0, 0.0, 5.0),
                    color: white(),
                    brightness: 1.0,
                });
            }
            assert!(renderer.end_frame());
            images.push(renderer.read_output_blocking().unwrap());
        }
        let (baseline, lit) = (&images[0], &images[1]);
        let (x, y) = (WIDTH / 2, HEIGHT / 2);

        let ambient = shading::tone_map(Vector3::new(0.1, 0.1, 0.1), &FrameParams::default());
        let ambient = shading::to_unorm8(ambient.x) as f32;
        assert!((intensity_at(baseline, x, y) - ambient).abs() <= 2.0);
        assert!(
            intensity_at(lit, x, y) > intensity_at(baseline, x, y),
            "{} <= {}",
            intensity_at(lit, x, y),
            intensity_at(baseline, x, y)
        );
    });
}

#[test]
#[cfg(feature = "integration-tests")]
fn skinned_mesh_follows_its_bones() {
    with_renderer!(test_config(WIDTH, HEIGHT), |renderer| {
        let geometry = primitives::plane(1.0);
        let vertices: Vec<SkinnedVertex> =
            geometry.vertices.iter().copied().map(SkinnedVertex::from).collect();
        let skinned = std::sync::Arc::new(Mesh::new_animated(
            &renderer.context().device,
            "skinned plane",
            &vertices,
            Some(&geometry.indices),
        ));
        let material = std::sync::Arc::new(Material::new("plain"));
        let shift = Matrix4::from_translation(Vector3::new(1.0, 0.0, 0.0));

        let mut images = Vec::new();
        for animated in [true, false] {
            renderer.set_gamma(1.0);
            renderer.begin_frame();
            if animated {
                renderer.add_animated_mesh(
                    skinned.clone(),
                    material.clone(),
                    Matrix4::from_scale(1.0),
                    &[shift],
                );
            } else {
                let plane = renderer.plane();
                renderer.add_static_mesh(plane, material.clone(), shift);
            }
            renderer.add_directional_light(DirectionalLight {
                direction: Vector3::new(0.0, 0.0, -1.0),
                color: white(),
                brightness: 0.5,
            });
            renderer.end_frame();
            images.push(renderer.read_output_blocking().unwrap());
        }
        // Skinning and the instance transform round differently along the edges.
        let differing = images[0]
            .pixels()
            .zip(images[1].pixels())
            .filter(|(p, q)| p != q)
            .count();
        assert!(differing < (WIDTH * HEIGHT / 200) as usize, "{} pixels differ", differing);
        let lit = intensity_at(&images[0], column_of(1.0), HEIGHT / 2);
        let unlit = intensity_at(&images[0], column_of(-1.0), HEIGHT / 2);
        assert!(lit > unlit, "{} <= {}", lit, unlit);
    });
}

#[test]
#[cfg(feature = "integration-tests")]
fn albedo_texture_replaces_the_default() {
    with_renderer!(test_config(WIDTH, HEIGHT), |renderer| {
        let red = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            2,
            2,
            image::Rgba([255, 0, 0, 255]),
        ));
        let ctx = renderer.context();
        let albedo = Texture::from_image(&ctx.device, &ctx.queue, &red, Some("red"), false);
        let material = std::sync::Arc::new(
            Material::new("red").with(MaterialSlot::Albedo, std::sync::Arc::new(albedo)),
        );

        renderer.set_gamma(1.0);
        renderer.set_global_illumination(Vector3::new(0.0, 0.0, 0.0));
        renderer.begin_frame();
        let plane = renderer.plane();
        renderer.add_static_mesh(plane, material, Matrix4::from_scale(6.0));
        renderer.add_directional_light(DirectionalLight {
            direction: Vector3::new(0.0, 0.0, -1.0),
            color: white(),
            brightness: 1.0,
        });
        renderer.end_frame();
        let image = renderer.read_output_blocking().unwrap();
        let centre = image.get_pixel(WIDTH / 2, HEIGHT / 2).0;
        assert!(centre[0] >= 250, "{:?}", centre);
        assert!(centre[1] <= 2 && centre[2] <= 2, "{:?}", centre);
    });
}

#[test]
#[cfg(feature = "integration-tests")]
fn debug_shapes_draw_over_the_composite() {
    with_renderer!(test_config(WIDTH, HEIGHT), |renderer| {
        renderer.begin_frame();
        renderer.add_debug_cube(Matrix4::from_scale(2.0), Vector3::new(1.0, 0.0, 0.0));
        renderer.add_debug_sphere(
            Matrix4::from_translation(Vector3::new(1.5, 0.0, 0.0)),
            Vector3::new(0.0, 1.0, 0.0),
        );
        renderer.end_frame();
        let image = renderer.read_output_blocking().unwrap();
        let red = image.pixels().filter(|p| p.0 == [255, 0, 0, 255]).count();
        let green = image.pixels().filter(|p| p.0 == [0, 255, 0, 255]).count();
        assert!(red > 0 && green > 0);
    });
}

#[test]
#[cfg(feature = "integration-tests")]
fn view_changes_apply_between_frames_only() {
    with_renderer!(test_config(WIDTH, HEIGHT), |renderer| {
        renderer.begin_frame();
        assert!(!renderer.set_view_position(Point3::new(0.0, 0.0, 10.0), Rad(0.0), Rad(0.0)));
        renderer.end_frame();
        assert!(renderer.set_view_position(Point3::new(0.0, 0.0, 10.0), Rad(0.0), Rad(0.0)));
        assert_eq!(renderer.state().camera().position, Point3::new(0.0, 0.0, 10.0));
    });
}
