//! Procedural test meshes.

use glam::Vec3;
use sightline_core::Mesh;

/// Corner order is `x + 2y + 4z`, each bit selecting the max side.
const BOX_FACES: [[u32; 4]; 6] = [
    [0, 2, 3, 1], // -Z
    [4, 5, 7, 6], // +Z
    [0, 4, 6, 2], // -X
    [1, 3, 7, 5], // +X
    [0, 1, 5, 4], // -Y
    [2, 6, 7, 3], // +Y
];

fn box_corners(half_extents: Vec3) -> [Vec3; 8] {
    let mut corners = [Vec3::ZERO; 8];
    for (i, corner) in corners.iter_mut().enumerate() {
        *corner = Vec3::new(
            if i & 1 == 0 { -half_extents.x } else { half_extents.x },
            if i & 2 == 0 { -half_extents.y } else { half_extents.y },
            if i & 4 == 0 { -half_extents.z } else { half_extents.z },
        );
    }
    corners
}

/// Creates a box centered at the origin with 8 shared vertices and 12
/// triangles.
pub fn box_mesh(half_extents: Vec3) -> Mesh {
    let triangles = BOX_FACES
        .iter()
        .flat_map(|[a, b, c, d]| [[*a, *b, *c], [*a, *c, *d]])
        .collect();
    Mesh::new(box_corners(half_extents).to_vec(), triangles)
}

/// Creates a unit cube (side 1) centered at the origin.
pub fn unit_cube() -> Mesh {
    box_mesh(Vec3::splat(0.5))
}

/// Creates a unit cube where every face owns its 4 vertices (24 in total),
/// the layout produced by per-face normals or UV seams.
pub fn split_vertex_cube() -> Mesh {
    let corners = box_corners(Vec3::splat(0.5));
    let mut vertices = Vec::with_capacity(24);
    let mut triangles = Vec::with_capacity(12);
    for face in &BOX_FACES {
        #[allow(clippy::cast_possible_truncation)]
        let base = vertices.len() as u32;
        vertices.extend(face.iter().map(|&i| corners[i as usize]));
        triangles.push([base, base + 1, base + 2]);
        triangles.push([base, base + 2, base + 3]);
    }
    Mesh::new(vertices, triangles)
}

/// Creates a single quad in the XY plane, two triangles sharing a diagonal.
pub fn quad(half_width: f32, half_height: f32) -> Mesh {
    Mesh::new(
        vec![
            Vec3::new(-half_width, -half_height, 0.0),
            Vec3::new(half_width, -half_height, 0.0),
            Vec3::new(half_width, half_height, 0.0),
            Vec3::new(-half_width, half_height, 0.0),
        ],
        vec![[0, 1, 2], [0, 2, 3]],
    )
}
