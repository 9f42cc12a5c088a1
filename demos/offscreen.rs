//! Renders a small lit scene without a window and writes it to `offscreen.png`.

use std::sync::Arc;

use cgmath::{Deg, Matrix4, Point3, Rad, Vector3};
use umbra::{
    init_logging, Context, DirectionalLight, Material, PointLight, Renderer, RendererConfig,
    SpotLight,
};

fn main() -> anyhow::Result<()> {
    init_logging();
    let ctx = Context::new_headless_blocking()?;
    let mut renderer = Renderer::init_blocking(ctx, RendererConfig::default())?;

    renderer.set_view_position(Point3::new(0.0, 2.0, 7.0), Rad(0.0), Deg(15.0).into());
    renderer.set_exposure(1.2);

    let floor = Arc::new(Material::new("floor"));
    let props = Arc::new(Material::new("props"));
    let ground = Matrix4::from_angle_x(Deg(-90.0)) * Matrix4::from_scale(12.0);

    renderer.begin_frame();
    renderer.add_static_mesh(renderer.plane(), floor, ground);
    for (i, x) in [-2.0f32, 0.0, 2.0].into_iter().enumerate() {
        let mesh = if i % 2 == 0 { renderer.cube() } else { renderer.sphere() };
        let transform = Matrix4::from_translation(Vector3::new(x, 0.5, 0.0));
        renderer.add_static_mesh(mesh, props.clone(), transform);
    }
    renderer.add_point_light(PointLight {
        position: Vector3::new(-1.0, 2.5, 1.5),
        color: Vector3::new(1.0, 0.8, 0.6),
        brightness: 6.0,
    });
    renderer.add_spot_light(SpotLight {
        position: Vector3::new(2.0, 4.0, 2.0),
        direction: Vector3::new(-0.3, -1.0, -0.3),
        inner: Deg(15.0).into(),
        outer: Deg(25.0).into(),
        color: Vector3::new(0.6, 0.7, 1.0),
        brightness: 8.0,
    });
    renderer.add_directional_light(DirectionalLight {
        direction: Vector3::new(0.4, -1.0, -0.2),
        color: Vector3::new(1.0, 1.0, 1.0),
        brightness: 0.3,
    });
    renderer.add_debug_sphere(
        Matrix4::from_translation(Vector3::new(-1.0, 2.5, 1.5)) * Matrix4::from_scale(0.2),
        Vector3::new(1.0, 1.0, 0.0),
    );
    renderer.end_frame();

    let image = renderer.read_output_blocking()?;
    image.save("offscreen.png")?;
    log::info!("wrote offscreen.png");
    Ok(())
}
