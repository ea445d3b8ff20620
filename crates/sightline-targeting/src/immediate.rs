//! The immediate per-object backend.

use sightline_core::{
    BackendKind, FrameContext, FrameOutput, SeenGeometry, TargetingBackend,
};

use crate::classify::FrustumClassifier;
use crate::resolve::TargetResolver;

/// Runs classification and resolution directly over the tracked GeoInfos.
///
/// Object bookkeeping is single-threaded. Edge flags are computed in a
/// fork/join batch when `parallel_edges` is set; the batch is joined before
/// the frame's output is built.
#[derive(Debug, Default)]
pub struct ObjectBackend {
    frames: u64,
}

impl ObjectBackend {
    /// Creates the backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of frames this backend has run.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl TargetingBackend for ObjectBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Object
    }

    fn run_frame(&mut self, ctx: &mut FrameContext<'_>) -> FrameOutput {
        self.frames += 1;
        let config = ctx.config;
        let with_geometry = config.granularity.needs_geometry();

        let classifier = FrustumClassifier::new(ctx.frustum);
        let visible_objects = classifier.classify_objects(ctx.candidates);
        let visible_edges = if !with_geometry {
            0
        } else if config.parallel_edges {
            classifier.classify_edges_parallel(ctx.candidates)
        } else {
            classifier.classify_edges(ctx.candidates)
        };

        let candidates: &[_] = ctx.candidates;
        let seen_objects = candidates
            .iter()
            .filter(|i| i.is_visible())
            .map(|i| i.handle())
            .collect();
        let seen_geometry = candidates
            .iter()
            .filter(|i| i.is_visible() && i.mesh().is_some())
            .map(|i| SeenGeometry {
                object: i.handle(),
                entity: None,
                bounds: *i.bounds(),
                edges: if with_geometry { i.edges().to_vec() } else { Vec::new() },
            })
            .collect();

        let targets = TargetResolver::new(config.granularity)
            .with_max_targets(config.max_targets)
            .resolve(ctx.frustum, &ctx.ray, candidates);

        log::trace!(
            "object backend frame {}: {} visible objects, {} visible edges, {} targets",
            ctx.frame,
            visible_objects,
            visible_edges,
            targets.len()
        );

        FrameOutput {
            seen_objects,
            seen_geometry,
            targets,
        }
    }

    fn teardown(&mut self) {
        log::debug!("object backend torn down after {} frames", self.frames);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::{Mat4, Vec3};
    use sightline_core::{
        Frustum, GeoInfo, GeometryGranularity, ObjectHandle, TargetingConfiguration, Viewer,
    };
    use sightline_geometry::primitives::unit_cube;

    use super::*;

    fn frame<'a>(
        frustum: &'a Frustum,
        viewer: &Viewer,
        config: &'a TargetingConfiguration,
        candidates: &'a mut [GeoInfo],
    ) -> FrameContext<'a> {
        FrameContext {
            frame: 1,
            frustum,
            ray: viewer.ray(),
            config,
            candidates,
            scan_generation: 1,
        }
    }

    #[test]
    fn test_object_granularity_publishes_seen_objects() {
        let viewer = Viewer::default();
        let frustum = Frustum::from_viewer(&viewer);
        let config = TargetingConfiguration::default();
        let mut candidates = vec![
            GeoInfo::new(ObjectHandle(0), Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0)), None, None),
            GeoInfo::new(
                ObjectHandle(1),
                Mat4::from_translation(Vec3::new(0.5, 0.0, 8.0)),
                Some(Arc::new(unit_cube())),
                None,
            ),
            GeoInfo::new(ObjectHandle(2), Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)), None, None),
        ];
        let mut backend = ObjectBackend::new();
        let output = backend.run_frame(&mut frame(&frustum, &viewer, &config, &mut candidates));

        assert_eq!(output.seen_objects, vec![ObjectHandle(0), ObjectHandle(1)]);
        assert_eq!(output.seen_geometry.len(), 1);
        assert!(output.seen_geometry[0].edges.is_empty());
        assert_eq!(output.closest_target().object, Some(ObjectHandle(0)));
        assert_eq!(backend.frames(), 1);
    }

    #[test]
    fn test_nothing_in_view_gives_empty_target() {
        let viewer = Viewer::default();
        let frustum = Frustum::from_viewer(&viewer);
        let config = TargetingConfiguration::default().with_granularity(GeometryGranularity::Edges);
        let mut candidates = vec![GeoInfo::new(
            ObjectHandle(0),
            Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)),
            Some(Arc::new(unit_cube())),
            None,
        )];
        let output = ObjectBackend::new().run_frame(&mut frame(&frustum, &viewer, &config, &mut candidates));
        assert!(output.targets.is_empty());
        assert!(output.closest_target().is_empty());
    }
}
