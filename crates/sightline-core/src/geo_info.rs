//! Cached per-object geometry and bounds used for visibility testing.

use std::fmt;
use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::bounds::Aabb;
use crate::edge::Edge;
use crate::mesh::Mesh;

/// Opaque handle to a scene object owned by the scene collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(pub u64);

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

/// Cached geometry for one candidate object.
///
/// Edges and welded vertices are filled lazily by the geometry extractor and
/// only when edge or vertex targeting needs them. A GeoInfo without a mesh
/// stays empty and is still a valid object-level candidate.
#[derive(Debug, Clone)]
pub struct GeoInfo {
    handle: ObjectHandle,
    tag: Option<String>,
    transform: Mat4,
    mesh: Option<Arc<Mesh>>,
    local_bounds: Option<Aabb>,
    bounds: Aabb,

    edges: Vec<Edge>,
    vertices: Vec<Vec3>,
    dirty: bool,
    revision: u64,

    visible: bool,
}

impl GeoInfo {
    /// Creates a GeoInfo for an object; its geometry starts dirty.
    pub fn new(
        handle: ObjectHandle,
        transform: Mat4,
        mesh: Option<Arc<Mesh>>,
        tag: Option<String>,
    ) -> Self {
        let local_bounds = mesh.as_deref().and_then(Mesh::bounds);
        let mut info = Self {
            handle,
            tag,
            transform,
            mesh,
            local_bounds,
            bounds: Aabb::from_point(Vec3::ZERO),
            edges: Vec::new(),
            vertices: Vec::new(),
            dirty: true,
            revision: 0,
            visible: false,
        };
        info.update_bounds();
        info
    }

    /// Returns the object handle.
    pub fn handle(&self) -> ObjectHandle {
        self.handle
    }

    /// Returns the object's tag, if any.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Returns the world transform captured at the last sync.
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// Returns the object's world position (transform translation).
    pub fn position(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }

    /// Updates the world transform and bounds.
    ///
    /// Cached edges are left as they are; they refresh on the next
    /// extraction.
    pub fn set_transform(&mut self, transform: Mat4) {
        if self.transform != transform {
            self.transform = transform;
            self.update_bounds();
        }
    }

    /// Returns the mesh reference, if the object has geometry.
    pub fn mesh(&self) -> Option<&Arc<Mesh>> {
        self.mesh.as_ref()
    }

    /// Returns the world-space bounding box.
    ///
    /// Objects without a mesh are bounded by their position.
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Returns the cached edges (empty until extracted).
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns the cached edges for flag updates.
    pub fn edges_mut(&mut self) -> &mut [Edge] {
        &mut self.edges
    }

    /// Returns the welded world-space vertices (empty until extracted).
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Returns whether extraction has to run before edges can be used.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Drops cached geometry and marks it for re-extraction.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
        self.edges.clear();
        self.vertices.clear();
    }

    /// Stores freshly extracted geometry and bumps the revision.
    pub fn set_geometry(&mut self, edges: Vec<Edge>, vertices: Vec<Vec3>) {
        self.edges = edges;
        self.vertices = vertices;
        self.dirty = false;
        self.revision += 1;
    }

    /// Returns a counter that changes every time geometry is stored.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns whether the object passed the last bounds test.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Sets the object-level visibility flag.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Iterates over edges that passed the last edge test.
    pub fn visible_edges(&self) -> impl Iterator<Item = (usize, &Edge)> {
        self.edges.iter().enumerate().filter(|(_, e)| e.visible)
    }

    /// Clears all visibility flags (object and edges).
    pub fn clear_visibility(&mut self) {
        self.visible = false;
        for edge in &mut self.edges {
            edge.visible = false;
        }
    }

    fn update_bounds(&mut self) {
        self.bounds = match self.local_bounds {
            Some(local) => local.transformed(self.transform),
            None => Aabb::from_point(self.position()),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri_mesh() -> Arc<Mesh> {
        Arc::new(Mesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![[0, 1, 2]],
        ))
    }

    #[test]
    fn test_new_starts_dirty_and_hidden() {
        let info = GeoInfo::new(ObjectHandle(1), Mat4::IDENTITY, Some(tri_mesh()), None);
        assert!(info.is_dirty());
        assert!(!info.is_visible());
        assert!(info.edges().is_empty());
        assert_eq!(info.revision(), 0);
    }

    #[test]
    fn test_bounds_follow_transform() {
        let mut info = GeoInfo::new(ObjectHandle(1), Mat4::IDENTITY, Some(tri_mesh()), None);
        info.set_transform(Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0)));
        assert!((info.bounds().min.z - 10.0).abs() < 1e-6);
        assert_eq!(info.position(), Vec3::new(0.0, 0.0, 10.0));
    }

    #[test]
    fn test_missing_mesh_bounds_are_position() {
        let transform = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let info = GeoInfo::new(ObjectHandle(4), transform, None, Some("enemy".into()));
        assert_eq!(info.bounds().min, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(info.bounds().max, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(info.tag(), Some("enemy"));
    }

    #[test]
    fn test_set_geometry_and_mark_dirty() {
        let mut info = GeoInfo::new(ObjectHandle(1), Mat4::IDENTITY, Some(tri_mesh()), None);
        info.set_geometry(vec![Edge::new(Vec3::ZERO, Vec3::X, 0, 1)], vec![Vec3::ZERO, Vec3::X]);
        assert!(!info.is_dirty());
        assert_eq!(info.revision(), 1);

        info.edges_mut()[0].visible = true;
        assert_eq!(info.visible_edges().count(), 1);

        info.mark_dirty();
        assert!(info.is_dirty());
        assert!(info.edges().is_empty());
        assert_eq!(info.revision(), 1);
    }
}
