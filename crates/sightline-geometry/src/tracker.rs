//! Candidate tracking with count-based change detection.

use std::collections::HashMap;
use std::sync::Arc;

use sightline_core::{GeoInfo, Mesh, MeshSource, ObjectHandle};

use crate::extract::GeometryExtractor;
use crate::scene::SceneEnumerator;

/// Maintains the candidate [`GeoInfo`] list mirrored from the scene.
///
/// The candidate list is rebuilt when the number of matching objects
/// changes, when the tag filter or mesh source changes, or after
/// [`invalidate`](Self::invalidate). Swapping one object for another in the
/// same frame keeps the count and goes unnoticed until one of those happens.
/// A rescan keeps the cached geometry of objects whose mesh and tag did not
/// change; only new or changed objects start dirty.
#[derive(Debug, Default)]
pub struct SceneObjectTracker {
    candidates: Vec<GeoInfo>,
    index: HashMap<ObjectHandle, usize>,
    tag_filter: Option<String>,
    mesh_source: MeshSource,
    last_count: Option<usize>,
    force_rescan: bool,
    scan_generation: u64,
    extractor: GeometryExtractor,
}

impl SceneObjectTracker {
    /// Creates an empty tracker that scans on its first refresh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a custom extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: GeometryExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Returns the active tag filter.
    pub fn tag_filter(&self) -> Option<&str> {
        self.tag_filter.as_deref()
    }

    /// Changes the tag filter; a change forces a rescan.
    pub fn set_tag_filter(&mut self, tag_filter: Option<String>) {
        if self.tag_filter != tag_filter {
            self.tag_filter = tag_filter;
            self.force_rescan = true;
        }
    }

    /// Returns the mesh source.
    pub fn mesh_source(&self) -> MeshSource {
        self.mesh_source
    }

    /// Changes the mesh source; a change forces a rescan.
    pub fn set_mesh_source(&mut self, mesh_source: MeshSource) {
        if self.mesh_source != mesh_source {
            self.mesh_source = mesh_source;
            self.force_rescan = true;
        }
    }

    /// Forces a rescan on the next refresh.
    pub fn invalidate(&mut self) {
        self.force_rescan = true;
    }

    /// Returns a counter bumped on every rescan.
    pub fn scan_generation(&self) -> u64 {
        self.scan_generation
    }

    /// Compares the scene's object count to the last one seen and rebuilds
    /// the candidate list if needed.
    ///
    /// Returns `true` if a rescan happened.
    pub fn refresh(&mut self, scene: &dyn SceneEnumerator) -> bool {
        let count = scene.object_count(self.tag_filter.as_deref());
        if !self.force_rescan && self.last_count == Some(count) {
            return false;
        }
        self.rescan(scene);
        self.last_count = Some(count);
        true
    }

    fn rescan(&mut self, scene: &dyn SceneEnumerator) {
        let objects = scene.objects(self.tag_filter.as_deref());
        let source = self.mesh_source;
        let mut previous: HashMap<ObjectHandle, GeoInfo> = self
            .candidates
            .drain(..)
            .map(|info| (info.handle(), info))
            .collect();
        let mut kept = 0;
        self.candidates = objects
            .into_iter()
            .map(|o| {
                let mesh = o.mesh(source).cloned();
                match previous.remove(&o.handle) {
                    Some(mut info)
                        if same_mesh(info.mesh(), mesh.as_ref()) && info.tag() == o.tag.as_deref() =>
                    {
                        if info.transform() != o.transform {
                            info.set_transform(o.transform);
                            info.mark_dirty();
                        }
                        kept += 1;
                        info
                    }
                    _ => GeoInfo::new(o.handle, o.transform, mesh, o.tag),
                }
            })
            .collect();
        self.index = self
            .candidates
            .iter()
            .enumerate()
            .map(|(i, info)| (info.handle(), i))
            .collect();
        self.force_rescan = false;
        self.scan_generation += 1;
        log::debug!(
            "rescanned scene: {} candidates, {} kept their cache (generation {})",
            self.candidates.len(),
            kept,
            self.scan_generation
        );
    }

    /// Copies current transforms from the scene into the candidates.
    ///
    /// Objects the scene no longer knows keep their last transform. Cached
    /// edges of moved objects are marked dirty when `geometry_needed` is set.
    pub fn sync_transforms(&mut self, scene: &dyn SceneEnumerator, geometry_needed: bool) {
        for info in &mut self.candidates {
            let Some(transform) = scene.transform(info.handle()) else {
                continue;
            };
            if transform != info.transform() {
                info.set_transform(transform);
                if geometry_needed {
                    info.mark_dirty();
                }
            }
        }
    }

    /// Extracts geometry for every dirty candidate. Returns how many were
    /// extracted.
    pub fn extract_dirty(&mut self) -> usize {
        let mut extracted = 0;
        for info in self.candidates.iter_mut().filter(|i| i.is_dirty()) {
            self.extractor.extract_into(info);
            extracted += 1;
        }
        if extracted > 0 {
            log::trace!("extracted geometry for {extracted} candidates");
        }
        extracted
    }

    /// Marks every candidate's geometry dirty.
    pub fn mark_all_dirty(&mut self) {
        for info in &mut self.candidates {
            info.mark_dirty();
        }
    }

    /// Returns the candidates.
    pub fn candidates(&self) -> &[GeoInfo] {
        &self.candidates
    }

    /// Returns the candidates for flag updates.
    pub fn candidates_mut(&mut self) -> &mut [GeoInfo] {
        &mut self.candidates
    }

    /// Gets a candidate by handle.
    pub fn get(&self, handle: ObjectHandle) -> Option<&GeoInfo> {
        self.index.get(&handle).map(|&i| &self.candidates[i])
    }

    /// Returns the number of candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Returns true if there are no candidates.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Drops all candidates; the next refresh rescans.
    pub fn clear(&mut self) {
        self.candidates.clear();
        self.index.clear();
        self.last_count = None;
        self.force_rescan = true;
    }
}

fn same_mesh(a: Option<&Arc<Mesh>>, b: Option<&Arc<Mesh>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}
