//! Target resolution: projecting visible candidates onto the sight-line.

use sightline_core::{
    rank_targets, Frustum, GeoInfo, GeometryGranularity, Ray, Target, TargetElement,
};

/// Ranks visible candidates by their distance to the viewer's ray.
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetResolver {
    granularity: GeometryGranularity,
    max_targets: Option<usize>,
}

impl TargetResolver {
    /// Creates a resolver for the given granularity.
    pub fn new(granularity: GeometryGranularity) -> Self {
        Self {
            granularity,
            max_targets: None,
        }
    }

    /// Limits the ranked output.
    #[must_use]
    pub fn with_max_targets(mut self, max_targets: Option<usize>) -> Self {
        self.max_targets = max_targets;
        self
    }

    /// Returns the granularity.
    pub fn granularity(&self) -> GeometryGranularity {
        self.granularity
    }

    /// Collects candidate points from already-classified GeoInfos.
    ///
    /// Hidden objects contribute nothing. Enumeration order is candidate
    /// order, then edge or vertex order, which fixes the tie-break.
    pub fn collect(&self, frustum: &Frustum, ray: &Ray, candidates: &[GeoInfo]) -> Vec<Target> {
        let mut targets = Vec::new();
        for info in candidates.iter().filter(|i| i.is_visible()) {
            let handle = info.handle();
            match self.granularity {
                GeometryGranularity::Objects => {
                    targets.push(Target::project(ray, info.position(), handle, TargetElement::Object));
                }
                GeometryGranularity::Edges => {
                    targets.extend(info.visible_edges().map(|(i, edge)| {
                        Target::project(ray, edge.midpoint(), handle, TargetElement::Edge(element_index(i)))
                    }));
                }
                GeometryGranularity::Vertices => {
                    targets.extend(
                        info.vertices()
                            .iter()
                            .enumerate()
                            .filter(|(_, v)| frustum.contains(**v))
                            .map(|(i, v)| {
                                Target::project(ray, *v, handle, TargetElement::Vertex(element_index(i)))
                            }),
                    );
                }
            }
        }
        targets
    }

    /// Collects and ranks targets. An empty result means nothing is in view.
    pub fn resolve(&self, frustum: &Frustum, ray: &Ray, candidates: &[GeoInfo]) -> Vec<Target> {
        let mut targets = self.collect(frustum, ray, candidates);
        rank_targets(&mut targets, self.max_targets);
        targets
    }
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn element_index(i: usize) -> u32 {
    i as u32
}
