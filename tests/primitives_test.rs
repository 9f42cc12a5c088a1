use std::collections::BTreeSet;

use cgmath::{InnerSpace, Vector3};
use umbra::resources::primitives::{self, Geometry, SPHERE_COLUMNS, SPHERE_RADIUS, SPHERE_ROWS};

fn triangle_normals(geometry: &Geometry) -> Vec<(Vector3<f32>, Vector3<f32>)> {
    geometry
        .indices
        .chunks_exact(3)
        .map(|tri| {
            let p = |i: u32| Vector3::from(geometry.vertices[i as usize].position);
            let (a, b, c) = (p(tri[0]), p(tri[1]), p(tri[2]));
            ((b - a).cross(c - a), (a + b + c) / 3.0)
        })
        .collect()
}

#[test]
fn cube_has_flat_faces() {
    let cube = primitives::cube();
    assert_eq!(cube.vertices.len(), 24);
    assert_eq!(cube.indices.len(), 36);
    assert_eq!(cube.num_triangles(), 12);
    for v in &cube.vertices {
        assert!(v.position.iter().all(|c| c.abs() <= 0.5 + 1e-6));
        let n = Vector3::from(v.normal);
        let p = Vector3::from(v.position);
        assert!((p.dot(n) - 0.5).abs() < 1e-6);
    }
}

#[test]
fn cube_winds_counter_clockwise_outward() {
    for (normal, centroid) in triangle_normals(&primitives::cube()) {
        assert!(normal.dot(centroid) > 0.0);
    }
}

#[test]
fn sphere_winds_counter_clockwise_outward() {
    let sphere = primitives::sphere();
    let normals = triangle_normals(&sphere);
    assert_eq!(normals.len(), (SPHERE_ROWS * SPHERE_COLUMNS * 2) as usize);
    for (normal, centroid) in normals {
        // Triangles touching a pole collapse to zero area.
        assert!(normal.dot(centroid) >= -1e-6);
    }
}

#[test]
fn sphere_vertices_sit_on_the_radius() {
    let sphere = primitives::sphere();
    assert_eq!(
        sphere.vertices.len(),
        ((SPHERE_ROWS + 1) * (SPHERE_COLUMNS + 1)) as usize
    );
    for v in &sphere.vertices {
        let p = Vector3::from(v.position);
        assert!((p.magnitude() - SPHERE_RADIUS).abs() < 1e-5);
    }
    assert!(sphere.indices.iter().all(|&i| (i as usize) < sphere.vertices.len()));
}

#[test]
fn plane_faces_positive_z() {
    let plane = primitives::plane(4.0);
    assert_eq!(plane.num_triangles(), 2);
    for v in &plane.vertices {
        assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        assert_eq!(v.position[2], 0.0);
        assert_eq!(v.position[0].abs(), 2.0);
    }
    for (normal, _) in triangle_normals(&plane) {
        assert!(normal.z > 0.0);
    }
}

#[test]
fn screen_quad_covers_clip_space() {
    let quad = primitives::screen_quad();
    let xs: BTreeSet<i32> = quad.vertices.iter().map(|v| v.position[0] as i32).collect();
    let ys: BTreeSet<i32> = quad.vertices.iter().map(|v| v.position[1] as i32).collect();
    assert_eq!(xs, BTreeSet::from([-1, 1]));
    assert_eq!(ys, BTreeSet::from([-1, 1]));
}

#[test]
fn wireframe_lists_each_edge_once() {
    // Two triangles sharing the 0-2 diagonal.
    let lines = primitives::wire_indices(&[0, 1, 2, 0, 2, 3]);
    assert_eq!(lines, vec![0, 1, 0, 2, 0, 3, 1, 2, 2, 3]);

    let cube = primitives::cube();
    let wire = primitives::wire_indices(&cube.indices);
    // Faces share no vertices: four sides and a diagonal each.
    assert_eq!(wire.len() / 2, 30);
}

#[test]
fn wireframe_skips_degenerate_edges() {
    assert!(primitives::wire_indices(&[4, 4, 4]).is_empty());
    assert_eq!(primitives::wire_indices(&[0, 0, 1]), vec![0, 1]);
}
