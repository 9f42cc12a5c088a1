//! Procedural meshes: plane, cube and UV sphere.
//!
//! All winding is counter-clockwise seen from outside, matching the
//! back-face culling of the geometry pass.

use std::collections::BTreeSet;

use cgmath::{InnerSpace, Vector3};

use crate::data_structures::mesh::ModelVertex;

pub const SPHERE_ROWS: u32 = 12;
pub const SPHERE_COLUMNS: u32 = 18;
pub const SPHERE_RADIUS: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Square in the xy plane facing +z, `size` units along each edge.
pub fn plane(size: f32) -> Geometry {
    let h = size * 0.5;
    let vertex = |x: f32, y: f32, u: f32, v: f32| ModelVertex {
        position: [x, y, 0.0],
        tex_coords: [u, v],
        normal: [0.0, 0.0, 1.0],
    };
    Geometry {
        vertices: vec![
            vertex(-h, -h, 0.0, 1.0),
            vertex(h, -h, 1.0, 1.0),
            vertex(h, h, 1.0, 0.0),
            vertex(-h, h, 0.0, 0.0),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

/// Covers all of clip space when drawn without a transform.
pub fn screen_quad() -> Geometry {
    plane(2.0)
}

/// Unit cube centred on the origin with flat per-face normals.
pub fn cube() -> Geometry {
    // (normal, u, v) with u x v = normal
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];
    const CORNERS: [(f32, f32); 4] = [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in FACES {
        let (n, u, v) = (Vector3::from(normal), Vector3::from(u), Vector3::from(v));
        let base = vertices.len() as u32;
        for (a, b) in CORNERS {
            let p = n * 0.5 + u * a + v * b;
            vertices.push(ModelVertex {
                position: p.into(),
                tex_coords: [a + 0.5, 0.5 - b],
                normal,
            });
        }
        indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    Geometry { vertices, indices }
}

pub fn sphere() -> Geometry {
    uv_sphere(SPHERE_ROWS, SPHERE_COLUMNS, SPHERE_RADIUS)
}

pub fn uv_sphere(rows: u32, columns: u32, radius: f32) -> Geometry {
    let rows = rows.max(2);
    let columns = columns.max(3);
    let mut vertices = Vec::with_capacity(((rows + 1) * (columns + 1)) as usize);
    for r in 0..=rows {
        let phi = std::f32::consts::PI * r as f32 / rows as f32;
        for c in 0..=columns {
            let theta = std::f32::consts::TAU * c as f32 / columns as f32;
            let n = Vector3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
            let n = if n.magnitude2() > 0.0 { n.normalize() } else { n };
            vertices.push(ModelVertex {
                position: (n * radius).into(),
                tex_coords: [c as f32 / columns as f32, r as f32 / rows as f32],
                normal: n.into(),
            });
        }
    }

    let mut indices = Vec::with_capacity((rows * columns * 6) as usize);
    for r in 0..rows {
        for c in 0..columns {
            let a = r * (columns + 1) + c;
            let b = a + columns + 1;
            indices.extend([a, a + 1, b, a + 1, b + 1, b]);
        }
    }
    Geometry { vertices, indices }
}

/// Each distinct triangle edge once, as line-list indices.
pub fn wire_indices(triangles: &[u32]) -> Vec<u32> {
    let mut edges = BTreeSet::new();
    for tri in triangles.chunks_exact(3) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            if a != b {
                edges.insert((a.min(b), a.max(b)));
            }
        }
    }
    edges.into_iter().flat_map(|(a, b)| [a, b]).collect()
}
