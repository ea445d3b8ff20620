//! Raw triangle meshes supplied by the scene.

use glam::Vec3;

use crate::bounds::Aabb;

/// An indexed triangle mesh in object-local space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
}

impl Mesh {
    /// Creates a mesh from vertex positions and triangle index triples.
    ///
    /// Triangles referencing out-of-range vertices are dropped with a warning.
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        let count = vertices.len();
        let before = triangles.len();
        let triangles: Vec<[u32; 3]> = triangles
            .into_iter()
            .filter(|tri| tri.iter().all(|&i| (i as usize) < count))
            .collect();
        if triangles.len() != before {
            log::warn!(
                "dropped {} triangles with out-of-range indices",
                before - triangles.len()
            );
        }
        Self {
            vertices,
            triangles,
        }
    }

    /// Creates a mesh from a flat triangle index list (three indices per triangle).
    ///
    /// A trailing partial triangle is ignored.
    pub fn from_flat_indices(vertices: Vec<Vec3>, indices: &[u32]) -> Self {
        let triangles = indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        Self::new(vertices, triangles)
    }

    /// Returns the vertex positions.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Returns the triangle index triples.
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Returns the number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Returns true if the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Returns the local-space bounding box, if there are any vertices.
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices.iter().copied())
    }
}
