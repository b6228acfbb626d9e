//! # Shapes
//!
//! CPU-side geometry for the four static meshes. Each generator returns plain
//! vertex and index vectors; [`GeometryCache`](super::mesh::GeometryCache)
//! uploads them once.
//!
//! | Mesh         | Vertex         | Vertices | Indices | Extent        |
//! |--------------|----------------|----------|---------|---------------|
//! | cube         | MeshVertex     | 24       | 36      | side 1        |
//! | floor        | MeshVertex     | 4        | 6       | 20×20 at y=0  |
//! | light marker | PositionVertex | 8        | 36      | side 1        |
//! | skybox       | PositionVertex | 8        | 36      | ±1            |
//!
//! The lit cube needs 24 vertices because a corner shared by three faces
//! carries a different normal on each. The position-only cubes have no
//! normals, so 8 shared corners suffice.
//!
//! All triangles wind counter-clockwise seen from outside. The skybox is seen
//! from inside, which is fine because no pipeline culls back faces.

use super::vertex::{MeshVertex, PositionVertex};

/// Half-extent of the floor quad in world units.
pub const FLOOR_HALF_EXTENT: f32 = 10.0;
/// How many times the floor texture repeats across the quad.
pub const FLOOR_UV_REPEAT: f32 = 10.0;

/// Unit cube centered at the origin with per-face normals and 0..1 UVs.
pub(crate) fn cube() -> (Vec<MeshVertex>, Vec<u32>) {
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    // (normal, u axis, v axis); u × v = normal keeps the winding CCW.
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];
    let corners = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];
    let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];
    let h = 0.5_f32;

    for (normal, u_dir, v_dir) in &faces {
        let base = vertices.len() as u32;
        for (corner, uv) in corners.iter().zip(uvs) {
            let position = std::array::from_fn(|axis| {
                normal[axis] * h + u_dir[axis] * corner[0] * h + v_dir[axis] * corner[1] * h
            });
            vertices.push(MeshVertex {
                position,
                normal: *normal,
                uv,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    (vertices, indices)
}

/// The floor: a 20×20 quad on y=0 facing +Y, UVs running 0..10 so the
/// texture tiles ten times per side.
pub(crate) fn floor() -> (Vec<MeshVertex>, Vec<u32>) {
    let e = FLOOR_HALF_EXTENT;
    let r = FLOOR_UV_REPEAT;
    let corners = [
        ([-e, 0.0, e], [0.0, 0.0]),
        ([e, 0.0, e], [r, 0.0]),
        ([e, 0.0, -e], [r, r]),
        ([-e, 0.0, -e], [0.0, r]),
    ];
    let vertices = corners
        .into_iter()
        .map(|(position, uv)| MeshVertex {
            position,
            normal: [0.0, 1.0, 0.0],
            uv,
        })
        .collect();
    let indices = vec![0, 1, 2, 0, 2, 3];
    (vertices, indices)
}

/// Position-only cube spanning `[-half, half]` on every axis.
fn position_cube(half: f32) -> (Vec<PositionVertex>, Vec<u32>) {
    // Corner bit 0 → x, bit 1 → y, bit 2 → z.
    let vertices = (0..8)
        .map(|bits: u32| PositionVertex {
            position: std::array::from_fn(|axis| {
                if bits & (1 << axis) != 0 { half } else { -half }
            }),
        })
        .collect();

    #[rustfmt::skip]
    let indices = vec![
        1, 3, 7, 1, 7, 5, // +X
        0, 4, 6, 0, 6, 2, // -X
        2, 6, 7, 2, 7, 3, // +Y
        0, 1, 5, 0, 5, 4, // -Y
        4, 5, 7, 4, 7, 6, // +Z
        0, 2, 3, 0, 3, 1, // -Z
    ];
    (vertices, indices)
}

/// Unit cube for the light markers; the marker model matrix scales it down.
pub(crate) fn light_marker() -> (Vec<PositionVertex>, Vec<u32>) {
    position_cube(0.5)
}

/// ±1 cube the skybox is drawn on. Its positions double as cubemap lookup
/// directions.
pub(crate) fn skybox() -> (Vec<PositionVertex>, Vec<u32>) {
    position_cube(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn triangle_normal(p: [[f32; 3]; 3]) -> Vec3 {
        let [a, b, c] = p.map(Vec3::from);
        (b - a).cross(c - a)
    }

    #[test]
    fn cube_has_correct_counts() {
        let (verts, idxs) = cube();
        assert_eq!(verts.len(), 24, "cube should have 24 vertices (4 per face)");
        assert_eq!(idxs.len(), 36, "cube should have 36 indices (6 per face)");
    }

    #[test]
    fn cube_faces_wind_outward() {
        let (verts, idxs) = cube();
        for tri in idxs.chunks(3) {
            let p = [0, 1, 2].map(|k| verts[tri[k] as usize].position);
            let geometric = triangle_normal(p);
            let declared = Vec3::from(verts[tri[0] as usize].normal);
            assert!(geometric.dot(declared) > 0.0, "triangle {tri:?} winds inward");
        }
    }

    #[test]
    fn cube_spans_unit_side_and_uv_range() {
        let (verts, _) = cube();
        for v in &verts {
            assert!(v.position.iter().all(|c| c.abs() == 0.5), "corner {:?}", v.position);
            assert!(v.uv.iter().all(|c| (0.0..=1.0).contains(c)));
        }
    }

    #[test]
    fn floor_is_twenty_units_with_tiled_uvs() {
        let (verts, idxs) = floor();
        assert_eq!((verts.len(), idxs.len()), (4, 6));
        for v in &verts {
            assert_eq!(v.normal, [0.0, 1.0, 0.0]);
            assert_eq!(v.position[1], 0.0);
            assert_eq!(v.position[0].abs(), 10.0);
            assert_eq!(v.position[2].abs(), 10.0);
        }
        let max_uv = verts.iter().flat_map(|v| v.uv).fold(0.0_f32, f32::max);
        assert_eq!(max_uv, 10.0);
    }

    #[test]
    fn floor_faces_up() {
        let (verts, idxs) = floor();
        for tri in idxs.chunks(3) {
            let p = [0, 1, 2].map(|k| verts[tri[k] as usize].position);
            assert!(triangle_normal(p).y > 0.0);
        }
    }

    #[test]
    fn position_cubes_cover_all_faces_outward() {
        for (half, (verts, idxs)) in [(0.5, light_marker()), (1.0, skybox())] {
            assert_eq!((verts.len(), idxs.len()), (8, 36));
            for tri in idxs.chunks(3) {
                let p = [0, 1, 2].map(|k| verts[tri[k] as usize].position);
                let centroid = (Vec3::from(p[0]) + Vec3::from(p[1]) + Vec3::from(p[2])) / 3.0;
                assert!(triangle_normal(p).dot(centroid) > 0.0, "triangle {tri:?} winds inward");
            }
            assert!(verts.iter().all(|v| v.position.iter().all(|c| c.abs() == half)));
        }
    }
}
