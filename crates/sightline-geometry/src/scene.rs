//! The scene collaborator: enumerates objects, reports counts and serves
//! transforms.

use std::sync::Arc;

use glam::Mat4;
use sightline_core::{Mesh, MeshSource, ObjectHandle};

/// A snapshot of one scene object as seen by the tracker.
///
/// Meshes are shared, so cloning a `SceneObject` is cheap.
#[derive(Debug, Clone)]
pub struct SceneObject {
    /// Stable handle for the object.
    pub handle: ObjectHandle,
    /// World transform.
    pub transform: Mat4,
    /// Mesh used for rendering.
    pub visual_mesh: Option<Arc<Mesh>>,
    /// Mesh used for collision; often coarser than the visual one.
    pub collision_mesh: Option<Arc<Mesh>>,
    /// Optional tag used for filtering.
    pub tag: Option<String>,
}

impl SceneObject {
    /// Creates an object without geometry or tag.
    pub fn new(handle: ObjectHandle, transform: Mat4) -> Self {
        Self {
            handle,
            transform,
            visual_mesh: None,
            collision_mesh: None,
            tag: None,
        }
    }

    /// Sets the visual mesh.
    #[must_use]
    pub fn with_visual_mesh(mut self, mesh: impl Into<Arc<Mesh>>) -> Self {
        self.visual_mesh = Some(mesh.into());
        self
    }

    /// Sets the collision mesh.
    #[must_use]
    pub fn with_collision_mesh(mut self, mesh: impl Into<Arc<Mesh>>) -> Self {
        self.collision_mesh = Some(mesh.into());
        self
    }

    /// Sets the tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Returns the mesh selected by `source`.
    pub fn mesh(&self, source: MeshSource) -> Option<&Arc<Mesh>> {
        match source {
            MeshSource::Visual => self.visual_mesh.as_ref(),
            MeshSource::Collision => self.collision_mesh.as_ref(),
        }
    }

    /// Returns whether the object passes `tag_filter` (`None` passes all).
    pub fn matches_tag(&self, tag_filter: Option<&str>) -> bool {
        match tag_filter {
            Some(filter) => self.tag.as_deref() == Some(filter),
            None => true,
        }
    }
}

/// Read access to the host scene.
///
/// The tracker calls [`object_count`](Self::object_count) every frame as a
/// cheap change signal and [`objects`](Self::objects) only when it has to
/// rebuild.
pub trait SceneEnumerator {
    /// Returns the number of objects matching `tag_filter`.
    fn object_count(&self, tag_filter: Option<&str>) -> usize;

    /// Returns the objects matching `tag_filter`, in a stable order.
    fn objects(&self, tag_filter: Option<&str>) -> Vec<SceneObject>;

    /// Returns the current world transform of `handle`, or `None` if the
    /// object no longer exists.
    fn transform(&self, handle: ObjectHandle) -> Option<Mat4>;
}

/// A simple scene held in memory, used by tests and the demo.
#[derive(Debug, Default)]
pub struct InMemoryScene {
    objects: Vec<SceneObject>,
    next_handle: u64,
}

impl InMemoryScene {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object and returns its handle.
    pub fn spawn(&mut self, transform: Mat4, visual_mesh: Option<Arc<Mesh>>, tag: Option<&str>) -> ObjectHandle {
        let handle = ObjectHandle(self.next_handle);
        self.next_handle += 1;
        self.objects.push(SceneObject {
            handle,
            transform,
            visual_mesh,
            collision_mesh: None,
            tag: tag.map(str::to_owned),
        });
        handle
    }

    /// Adds a fully built object, replacing its handle with a fresh one.
    pub fn insert(&mut self, mut object: SceneObject) -> ObjectHandle {
        object.handle = ObjectHandle(self.next_handle);
        self.next_handle += 1;
        let handle = object.handle;
        self.objects.push(object);
        handle
    }

    /// Removes an object. Returns `false` if it was not present.
    pub fn despawn(&mut self, handle: ObjectHandle) -> bool {
        let before = self.objects.len();
        self.objects.retain(|o| o.handle != handle);
        self.objects.len() != before
    }

    /// Moves an object. Returns `false` if it was not present.
    pub fn set_transform(&mut self, handle: ObjectHandle, transform: Mat4) -> bool {
        match self.get_mut(handle) {
            Some(object) => {
                object.transform = transform;
                true
            }
            None => false,
        }
    }

    /// Replaces an object's visual mesh without changing the object count.
    pub fn set_visual_mesh(&mut self, handle: ObjectHandle, mesh: Option<Arc<Mesh>>) -> bool {
        match self.get_mut(handle) {
            Some(object) => {
                object.visual_mesh = mesh;
                true
            }
            None => false,
        }
    }

    /// Gets an object by handle.
    pub fn get(&self, handle: ObjectHandle) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.handle == handle)
    }

    /// Gets a mutable object by handle.
    pub fn get_mut(&mut self, handle: ObjectHandle) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.handle == handle)
    }

    /// Returns the number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if the scene has no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl SceneEnumerator for InMemoryScene {
    fn object_count(&self, tag_filter: Option<&str>) -> usize {
        self.objects.iter().filter(|o| o.matches_tag(tag_filter)).count()
    }

    fn objects(&self, tag_filter: Option<&str>) -> Vec<SceneObject> {
        self.objects
            .iter()
            .filter(|o| o.matches_tag(tag_filter))
            .cloned()
            .collect()
    }

    fn transform(&self, handle: ObjectHandle) -> Option<Mat4> {
        self.get(handle).map(|o| o.transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::unit_cube;

    #[test]
    fn test_spawn_and_filter() {
        let mut scene = InMemoryScene::new();
        let a = scene.spawn(Mat4::IDENTITY, Some(Arc::new(unit_cube())), Some("enemy"));
        let b = scene.spawn(Mat4::IDENTITY, None, None);
        assert_ne!(a, b);
        assert_eq!(scene.object_count(None), 2);
        assert_eq!(scene.object_count(Some("enemy")), 1);
        assert_eq!(scene.objects(Some("enemy"))[0].handle, a);
        assert_eq!(scene.object_count(Some("ally")), 0);
    }

    #[test]
    fn test_despawn_and_transform() {
        let mut scene = InMemoryScene::new();
        let a = scene.spawn(Mat4::IDENTITY, None, None);
        let moved = Mat4::from_translation(glam::Vec3::X);
        assert!(scene.set_transform(a, moved));
        assert_eq!(scene.transform(a), Some(moved));
        assert!(scene.despawn(a));
        assert!(!scene.despawn(a));
        assert_eq!(scene.transform(a), None);
        assert!(scene.is_empty());
    }

    #[test]
    fn test_mesh_source_selection() {
        let object = SceneObject::new(ObjectHandle(0), Mat4::IDENTITY)
            .with_visual_mesh(unit_cube())
            .with_tag("prop");
        assert!(object.mesh(MeshSource::Visual).is_some());
        assert!(object.mesh(MeshSource::Collision).is_none());
        assert!(object.matches_tag(Some("prop")));
        assert!(!object.matches_tag(Some("enemy")));
    }
}
