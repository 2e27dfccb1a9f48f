//! Flare light placement and the screen-space lens flare math.
//!
//! Five point lights carry flares: four sit on the vertices of a regular
//! tetrahedron scaled by a placement factor, the fifth lands uniformly at
//! random inside the speck field cube. Each flare renders as a run of
//! translucent sprites spaced along the line from the light's projected
//! position through the screen center, fading out near the viewport edge.

use cgmath::{Matrix4, Point3, Vector2};

use super::rng::SceneRng;

/// Opacity bands for the four sprite elements of one flare, inner to outer.
pub const FLARE_OPACITY_RANGES: [(f32, f32); 4] = [
    (0.03, 0.07),
    (0.15, 0.25),
    (0.09, 0.11),
    (0.32, 0.38),
];

/// Fractions along the light-to-center line where the four elements sit.
/// 0 is on the light, 1 is the screen center.
pub const FLARE_ELEMENT_OFFSETS: [f32; 4] = [0.0, 0.35, 0.65, 1.0];

/// Relative sizes for the four elements; the head sprite dominates.
pub const FLARE_ELEMENT_SIZES: [f32; 4] = [700.0, 60.0, 70.0, 120.0];

/// Vertices of a regular tetrahedron with circumradius sqrt(3)*m.
pub fn tetrahedron_points(m: f32) -> [Point3<f32>; 4] {
    [
        Point3::new(m, m, m),
        Point3::new(m, -m, -m),
        Point3::new(-m, m, -m),
        Point3::new(-m, -m, m),
    ]
}

/// The five flare light positions: four tetrahedron vertices plus one
/// uniform draw inside the cube of the given side length.
pub fn flare_light_positions(m: f32, cube_side: f32, rng: &mut SceneRng) -> [Point3<f32>; 5] {
    let half = cube_side / 2.0;
    let tetra = tetrahedron_points(m);
    [
        tetra[0],
        tetra[1],
        tetra[2],
        tetra[3],
        Point3::new(
            rng.range(-half, half),
            rng.range(-half, half),
            rng.range(-half, half),
        ),
    ]
}

/// Draw one opacity per element from its band.
pub fn flare_opacities(rng: &mut SceneRng) -> [f32; 4] {
    let mut out = [0.0; 4];
    for (slot, (lo, hi)) in out.iter_mut().zip(FLARE_OPACITY_RANGES) {
        *slot = rng.range(lo, hi);
    }
    out
}

/// HSL to linear-ish RGB, h in [0,1) wrapping, s and l in [0,1].
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    let h = h.rem_euclid(1.0);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h * 6.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    [r + m, g + m, b + m]
}

/// A flare sprite ready for instancing: clip-space center, pixel size,
/// color with opacity folded into alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlareElement {
    pub clip_pos: Vector2<f32>,
    pub size_px: f32,
    pub color: [f32; 3],
    pub opacity: f32,
}

/// Project a world point with the camera's view-projection. Returns `None`
/// when the point is behind the near plane, which drops the whole flare.
pub fn project_to_clip(world: Point3<f32>, view_proj: &Matrix4<f32>) -> Option<Vector2<f32>> {
    let clip = view_proj * world.to_homogeneous();
    if clip.w <= 0.0 {
        return None;
    }
    Some(Vector2::new(clip.x / clip.w, clip.y / clip.w))
}

/// Fade factor for a flare head at the given clip position: full strength
/// at center, zero once the light leaves the viewport.
pub fn edge_fade(clip_pos: Vector2<f32>) -> f32 {
    let d = clip_pos.x.abs().max(clip_pos.y.abs());
    (1.0 - (d - 0.8).max(0.0) / 0.2).clamp(0.0, 1.0)
}

/// Lay out the sprite run for one light. Elements march from the light's
/// screen position toward the center; everything scales by the edge fade.
pub fn layout_flare(
    light_world: Point3<f32>,
    color: [f32; 3],
    opacities: [f32; 4],
    view_proj: &Matrix4<f32>,
    out: &mut Vec<FlareElement>,
) {
    let Some(anchor) = project_to_clip(light_world, view_proj) else {
        return;
    };
    let fade = edge_fade(anchor);
    if fade <= 0.0 {
        return;
    }
    // The run walks the vector from the light toward screen center (0,0).
    for i in 0..4 {
        let t = FLARE_ELEMENT_OFFSETS[i];
        let clip_pos = anchor * (1.0 - t);
        out.push(FlareElement {
            clip_pos,
            size_px: FLARE_ELEMENT_SIZES[i] * fade,
            color,
            opacity: opacities[i] * fade,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, EuclideanSpace, MetricSpace, Vector3};

    #[test]
    fn tetrahedron_is_regular() {
        let pts = tetrahedron_points(1000.0);
        let expected = 1000.0 * 2.0 * 2.0_f32.sqrt();
        for i in 0..4 {
            for j in (i + 1)..4 {
                let d = pts[i].distance(pts[j]);
                assert!(
                    (d - expected).abs() < 1e-1,
                    "edge {i}-{j} has length {d}, expected {expected}"
                );
            }
        }
        // Centroid at the origin.
        let centroid = pts
            .iter()
            .fold(Vector3::new(0.0, 0.0, 0.0), |acc, p| acc + p.to_vec())
            / 4.0;
        assert!(centroid.x.abs() < 1e-3);
        assert!(centroid.y.abs() < 1e-3);
        assert!(centroid.z.abs() < 1e-3);
    }

    #[test]
    fn opacities_stay_inside_their_bands() {
        let mut rng = SceneRng::seeded(11);
        for _ in 0..200 {
            let ops = flare_opacities(&mut rng);
            for (value, (lo, hi)) in ops.iter().zip(FLARE_OPACITY_RANGES) {
                assert!(
                    (lo..hi).contains(value),
                    "opacity {value} escaped [{lo}, {hi})"
                );
            }
        }
    }

    #[test]
    fn fifth_light_lands_inside_the_cube() {
        let mut rng = SceneRng::seeded(3);
        for _ in 0..50 {
            let positions = flare_light_positions(1000.0, 4000.0, &mut rng);
            let p = positions[4];
            assert!(p.x.abs() <= 2000.0 && p.y.abs() <= 2000.0 && p.z.abs() <= 2000.0);
        }
    }

    #[test]
    fn hsl_primaries_convert_exactly() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), [1.0, 0.0, 0.0]);
        let g = hsl_to_rgb(1.0 / 3.0, 1.0, 0.5);
        assert!(g[0].abs() < 1e-5 && (g[1] - 1.0).abs() < 1e-5 && g[2].abs() < 1e-5);
        let white = hsl_to_rgb(0.7, 0.4, 1.0);
        for c in white {
            assert!((c - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn lights_behind_the_camera_produce_no_elements() {
        // Identity view-proj: camera at origin looking down -Z with w = z
        // kept positive only for points in front.
        let view_proj = Matrix4::from(cgmath::perspective(Deg(80.0), 1.0, 1.0, 500.0));
        let mut out = Vec::new();
        layout_flare(
            Point3::new(0.0, 0.0, 50.0),
            [1.0, 1.0, 1.0],
            [0.05, 0.2, 0.1, 0.35],
            &view_proj,
            &mut out,
        );
        assert!(out.is_empty());

        layout_flare(
            Point3::new(0.0, 0.0, -50.0),
            [1.0, 1.0, 1.0],
            [0.05, 0.2, 0.1, 0.35],
            &view_proj,
            &mut out,
        );
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn edge_fade_kills_offscreen_lights() {
        assert_eq!(edge_fade(Vector2::new(0.0, 0.0)), 1.0);
        assert_eq!(edge_fade(Vector2::new(1.5, 0.0)), 0.0);
        let partial = edge_fade(Vector2::new(0.9, 0.0));
        assert!(partial > 0.0 && partial < 1.0);
    }
}
