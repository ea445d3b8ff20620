//! Frustum classification of candidate objects and their edges.

use rayon::prelude::*;
use sightline_core::{Frustum, GeoInfo};

/// Classifies candidates and edges against a frustum.
///
/// Object classification is sequential. Edge classification can run as a
/// fork/join batch partitioned by object: each worker owns whole GeoInfos
/// and writes only their edge flags, while the frustum is shared read-only.
#[derive(Debug, Clone, Copy)]
pub struct FrustumClassifier<'a> {
    frustum: &'a Frustum,
}

impl<'a> FrustumClassifier<'a> {
    /// Creates a classifier for one frame's frustum.
    pub fn new(frustum: &'a Frustum) -> Self {
        Self { frustum }
    }

    /// Returns the frustum.
    pub fn frustum(&self) -> &Frustum {
        self.frustum
    }

    /// Sets each candidate's visibility from its world bounds.
    ///
    /// Returns the number of visible candidates.
    pub fn classify_objects(&self, candidates: &mut [GeoInfo]) -> usize {
        let mut visible = 0;
        for info in candidates.iter_mut() {
            let inside = self.frustum.contains_bounds(info.bounds());
            info.set_visible(inside);
            visible += usize::from(inside);
        }
        visible
    }

    /// Sets edge flags on every candidate, one object at a time.
    ///
    /// Edges of hidden candidates are cleared without testing.
    pub fn classify_edges(&self, candidates: &mut [GeoInfo]) -> usize {
        candidates
            .iter_mut()
            .map(|info| classify_object_edges(self.frustum, info))
            .sum()
    }

    /// Same as [`classify_edges`](Self::classify_edges), fanned out over the
    /// rayon pool with one task per object. Returns once every worker has
    /// finished.
    pub fn classify_edges_parallel(&self, candidates: &mut [GeoInfo]) -> usize {
        let frustum = self.frustum;
        candidates
            .par_iter_mut()
            .map(|info| classify_object_edges(frustum, info))
            .sum()
    }
}

fn classify_object_edges(frustum: &Frustum, info: &mut GeoInfo) -> usize {
    let object_visible = info.is_visible();
    let mut visible = 0;
    for edge in info.edges_mut() {
        edge.visible = object_visible && frustum.contains_edge(edge);
        visible += usize::from(edge.visible);
    }
    visible
}
