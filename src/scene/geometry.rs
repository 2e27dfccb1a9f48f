//! Procedural CPU-side geometry for the scene meshes.
//!
//! Everything here is plain vertex/index data so it can be unit-tested
//! without a GPU; uploading happens in the scene builder.

use crate::data_structures::model::{LineVertex, ModelVertex};

/// A unit cube centered on the origin, 24 vertices so each face gets flat
/// normals and its own UVs.
pub fn cube() -> (Vec<ModelVertex>, Vec<u32>) {
    // (normal, tangent-u, tangent-v) per face.
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (n, u, v) in faces {
        let base = vertices.len() as u32;
        for (du, dv, uv) in [
            (-0.5, -0.5, [0.0, 1.0]),
            (0.5, -0.5, [1.0, 1.0]),
            (0.5, 0.5, [1.0, 0.0]),
            (-0.5, 0.5, [0.0, 0.0]),
        ] {
            vertices.push(ModelVertex {
                position: [
                    n[0] * 0.5 + u[0] * du + v[0] * dv,
                    n[1] * 0.5 + u[1] * du + v[1] * dv,
                    n[2] * 0.5 + u[2] * du + v[2] * dv,
                ],
                tex_coords: uv,
                normal: n,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    (vertices, indices)
}

/// A UV sphere of the given radius. `segments` is the longitudinal count,
/// `rings` the latitudinal one.
pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> (Vec<ModelVertex>, Vec<u32>) {
    let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let phi = v * std::f32::consts::PI;
        for seg in 0..=segments {
            let u = seg as f32 / segments as f32;
            let theta = u * std::f32::consts::TAU;
            let normal = [phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin()];
            vertices.push(ModelVertex {
                position: [normal[0] * radius, normal[1] * radius, normal[2] * radius],
                tex_coords: [u, v],
                normal,
            });
        }
    }

    let stride = segments + 1;
    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);
    for ring in 0..rings {
        for seg in 0..segments {
            let a = ring * stride + seg;
            let b = a + stride;
            // Counter-clockwise when seen from outside the sphere.
            indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }
    }
    (vertices, indices)
}

/// The blue two-segment polyline: (-10,0,0) -> (0,10,0) -> (10,0,0).
pub fn accent_line() -> Vec<LineVertex> {
    const BLUE: [f32; 3] = [0.0, 0.0, 1.0];
    let points = [
        [-10.0, 0.0, 0.0],
        [0.0, 10.0, 0.0],
        [0.0, 10.0, 0.0],
        [10.0, 0.0, 0.0],
    ];
    points
        .into_iter()
        .map(|position| LineVertex {
            position,
            color: BLUE,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    #[test]
    fn cube_has_24_vertices_and_12_triangles() {
        let (vertices, indices) = cube();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        for v in &vertices {
            for c in v.position {
                assert!(c.abs() <= 0.5 + 1e-6);
            }
        }
    }

    #[test]
    fn sphere_vertices_sit_on_the_radius() {
        let (vertices, indices) = uv_sphere(2.0, 16, 8);
        assert!(!indices.is_empty());
        for v in &vertices {
            let r = (v.position[0].powi(2) + v.position[1].powi(2) + v.position[2].powi(2)).sqrt();
            assert!((r - 2.0).abs() < 1e-4);
        }
        for i in &indices {
            assert!((*i as usize) < vertices.len());
        }
    }

    #[test]
    fn sphere_triangles_face_outward() {
        let (vertices, indices) = uv_sphere(1.0, 16, 8);
        for tri in indices.chunks(3) {
            let v0 = cgmath::Vector3::from(vertices[tri[0] as usize].position);
            let v1 = cgmath::Vector3::from(vertices[tri[1] as usize].position);
            let v2 = cgmath::Vector3::from(vertices[tri[2] as usize].position);
            let normal = (v1 - v0).cross(v2 - v0);
            // Pole quads collapse to zero-area triangles; skip those.
            if normal.magnitude() < 1e-6 {
                continue;
            }
            let centroid = (v0 + v1 + v2) / 3.0;
            assert!(
                normal.dot(centroid) > 0.0,
                "inward-facing triangle {tri:?}"
            );
        }
    }

    #[test]
    fn cube_triangles_face_outward() {
        let (vertices, indices) = cube();
        for tri in indices.chunks(3) {
            let v0 = cgmath::Vector3::from(vertices[tri[0] as usize].position);
            let v1 = cgmath::Vector3::from(vertices[tri[1] as usize].position);
            let v2 = cgmath::Vector3::from(vertices[tri[2] as usize].position);
            let normal = (v1 - v0).cross(v2 - v0);
            let centroid = (v0 + v1 + v2) / 3.0;
            assert!(normal.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn accent_line_spans_the_expected_points() {
        let line = accent_line();
        assert_eq!(line.len(), 4);
        assert_eq!(line[0].position, [-10.0, 0.0, 0.0]);
        assert_eq!(line[1].position, [0.0, 10.0, 0.0]);
        assert_eq!(line[3].position, [10.0, 0.0, 0.0]);
        for v in &line {
            assert_eq!(v.color, [0.0, 0.0, 1.0]);
        }
    }
}
