//! The per-viewer pipeline coordinator.
//!
//! One [`PipelineCoordinator`] per viewer owns the candidate tracker, the
//! backend registry and the published results. Each [`update`] runs the
//! frame in a fixed order: frustum, tracker refresh, geometry extraction,
//! classification and resolution in every active backend, then publish.
//!
//! [`update`]: PipelineCoordinator::update

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::Vec3;
use sightline_core::{
    BackendKind, BackendRegistry, BackendSelection, ConfigChanges, FrameContext, FrameOutput,
    Frustum, ObjectHandle, Result, SeenGeometry, Target, TargetingBackend, TargetingConfiguration,
    TargetingOptions, Viewer,
};
use sightline_geometry::{SceneEnumerator, SceneObjectTracker};
use sightline_targeting::{EntityBackend, ObjectBackend};

use crate::publish::{FrameResults, ResultsSlot};
use crate::state::BackendState;

/// Drives visibility and targeting for one viewer.
pub struct PipelineCoordinator {
    viewer: Viewer,
    config: TargetingConfiguration,
    tracker: SceneObjectTracker,
    registry: BackendRegistry,
    frustum: Frustum,
    frame: u64,
    results: ResultsSlot,
}

impl PipelineCoordinator {
    /// Creates a coordinator with the default configuration (object backend,
    /// object granularity).
    pub fn new(viewer: Viewer) -> Result<Self> {
        Self::with_configuration(viewer, TargetingConfiguration::default())
    }

    /// Creates a coordinator and brings up the backends `config` asks for.
    pub fn with_configuration(viewer: Viewer, config: TargetingConfiguration) -> Result<Self> {
        viewer.validate()?;
        let mut tracker = SceneObjectTracker::new();
        tracker.set_tag_filter(config.tag_filter.clone());
        tracker.set_mesh_source(config.mesh_source);

        let mut coordinator = Self {
            viewer,
            frustum: Frustum::from_viewer(&viewer),
            config,
            tracker,
            registry: BackendRegistry::new(),
            frame: 0,
            results: ResultsSlot::new(),
        };
        coordinator.transition()?;
        Ok(coordinator)
    }

    /// Returns the viewer.
    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    /// Replaces the viewer. Takes effect on the next update.
    pub fn set_viewer(&mut self, viewer: Viewer) -> Result<()> {
        viewer.validate()?;
        self.viewer = viewer;
        Ok(())
    }

    /// Moves and turns the viewer, keeping its lens.
    pub fn set_pose(&mut self, position: Vec3, forward: Vec3, up: Vec3) -> Result<()> {
        let viewer = Viewer {
            position,
            forward: forward.normalize_or_zero(),
            up: up.normalize_or_zero(),
            ..self.viewer
        };
        self.set_viewer(viewer)
    }

    /// Changes the vertical field of view in degrees.
    pub fn set_field_of_view(&mut self, degrees: f32) -> Result<()> {
        self.set_viewer(self.viewer.with_field_of_view(degrees))
    }

    /// Returns the frustum computed by the last update.
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Returns the configuration.
    pub fn configuration(&self) -> &TargetingConfiguration {
        &self.config
    }

    /// Returns the candidate tracker.
    pub fn tracker(&self) -> &SceneObjectTracker {
        &self.tracker
    }

    /// Returns the backend state derived from the registry.
    pub fn state(&self) -> BackendState {
        BackendState::from_flags(
            self.registry.contains(BackendKind::Object),
            self.registry.contains(BackendKind::Entity),
        )
    }

    /// Applies a partial configuration update.
    ///
    /// Absent fields keep their values. Backend changes are carried out
    /// before this returns. On a rejected update nothing changes; if a
    /// backend cannot be brought up, the configuration is left describing
    /// the backends that are actually running.
    pub fn configure(&mut self, options: &TargetingOptions) -> Result<ConfigChanges> {
        if let Err(e) = options.validate() {
            log::warn!("rejected targeting options: {e}");
            return Err(e);
        }
        if let Some(fov) = options.field_of_view {
            self.set_field_of_view(fov)?;
        }

        let changes = options.apply_to(&mut self.config);
        if changes.tag_filter {
            self.tracker.set_tag_filter(self.config.tag_filter.clone());
        }
        if changes.mesh_source {
            self.tracker.set_mesh_source(self.config.mesh_source);
        }
        if changes.granularity {
            self.tracker.mark_all_dirty();
        }
        self.transition()?;
        Ok(changes)
    }

    /// Parses JSON options and applies them.
    pub fn configure_json(&mut self, json: &str) -> Result<ConfigChanges> {
        let options = TargetingOptions::from_json(json)?;
        self.configure(&options)
    }

    /// Turns one backend on or off, keeping the other as it is.
    ///
    /// Enabling a running backend or disabling a stopped one does nothing.
    pub fn set_backend_enabled(&mut self, kind: BackendKind, enabled: bool) -> Result<()> {
        let state = self.state();
        if state.is_active(kind) == enabled {
            log::debug!("{kind} backend already {}", if enabled { "enabled" } else { "disabled" });
            return Ok(());
        }
        let (object, entity) = match kind {
            BackendKind::Object => (enabled, state.is_active(BackendKind::Entity)),
            BackendKind::Entity => (state.is_active(BackendKind::Object), enabled),
        };
        self.config.backend = BackendState::from_flags(object, entity).selection();
        self.config.enabled = true;
        self.transition()
    }

    /// Forces a rescan of the scene on the next update.
    pub fn invalidate(&mut self) {
        self.tracker.invalidate();
    }

    /// Brings the registry in line with the configuration.
    fn transition(&mut self) -> Result<()> {
        let from = self.state();
        let to = BackendState::target(self.config.enabled, self.config.backend);
        if from == to {
            return Ok(());
        }

        for kind in BackendKind::ALL {
            if !to.is_active(kind) && self.registry.unregister(kind) {
                log::info!("{kind} backend disabled");
            }
        }
        for kind in BackendKind::ALL {
            if to.is_active(kind) && !self.registry.contains(kind) {
                match self.instantiate(kind) {
                    Ok(backend) => {
                        self.registry.register(backend);
                        log::info!("{kind} backend enabled");
                    }
                    Err(e) => {
                        log::warn!("could not enable {kind} backend: {e}");
                        self.config.backend = self.state().selection();
                        self.republish();
                        return Err(e);
                    }
                }
            }
        }

        self.republish();
        log::info!("backend state: {from} -> {}", self.state());
        Ok(())
    }

    /// Re-publishes the last results restricted to backends still running.
    fn republish(&self) {
        let previous = self.results.load();
        let outputs = BackendKind::ALL
            .into_iter()
            .filter(|&kind| self.registry.contains(kind))
            .filter_map(|kind| previous.output(kind).cloned().map(|output| (kind, output)))
            .collect();
        self.results
            .publish(FrameResults::new(previous.frame, self.state(), outputs));
    }

    fn instantiate(&self, kind: BackendKind) -> Result<Box<dyn TargetingBackend>> {
        Ok(match kind {
            BackendKind::Object => Box::new(ObjectBackend::new()),
            BackendKind::Entity => Box::new(EntityBackend::new(&self.config.batch)?),
        })
    }

    /// Runs one frame against `scene` and publishes its results.
    ///
    /// All backend work is finished before the results are swapped in.
    pub fn update(&mut self, scene: &dyn SceneEnumerator) -> Arc<FrameResults> {
        self.frame += 1;
        self.frustum = Frustum::from_viewer(&self.viewer);

        let state = self.state();
        if state == BackendState::Disabled {
            return self.results.publish(FrameResults::empty(self.frame, state));
        }

        let with_geometry = self.config.granularity.needs_geometry();
        self.tracker.refresh(scene);
        self.tracker.sync_transforms(scene, with_geometry);
        if with_geometry {
            self.tracker.extract_dirty();
        }

        let ray = self.viewer.ray();
        let scan_generation = self.tracker.scan_generation();
        let mut outputs = BTreeMap::new();
        for backend in self.registry.iter_mut() {
            let mut ctx = FrameContext {
                frame: self.frame,
                frustum: &self.frustum,
                ray,
                config: &self.config,
                candidates: self.tracker.candidates_mut(),
                scan_generation,
            };
            outputs.insert(backend.kind(), backend.run_frame(&mut ctx));
        }

        self.results
            .publish(FrameResults::new(self.frame, state, outputs))
    }

    /// Returns the latest published results.
    pub fn snapshot(&self) -> Arc<FrameResults> {
        self.results.load()
    }

    /// Returns a shared handle readers on other threads can poll.
    pub fn results_handle(&self) -> ResultsSlot {
        self.results.clone()
    }

    /// Objects inside the frustum in the last frame.
    pub fn seen_objects(&self) -> Vec<ObjectHandle> {
        self.snapshot().seen_objects().to_vec()
    }

    /// Geometry-bearing objects inside the frustum in the last frame.
    pub fn seen_geometry(&self) -> Vec<SeenGeometry> {
        self.snapshot().seen_geometry().to_vec()
    }

    /// Ranked targets from the last frame, closest first.
    pub fn closest_targets(&self) -> Vec<Target> {
        self.snapshot().closest_targets().to_vec()
    }

    /// The closest target from the last frame, or [`Target::EMPTY`].
    pub fn closest_target(&self) -> Target {
        self.snapshot().closest_target()
    }

    /// One backend's own output from the last frame.
    pub fn results_for(&self, kind: BackendKind) -> Option<FrameOutput> {
        self.snapshot().output(kind).cloned()
    }

    /// Returns the configured backend selection.
    pub fn backend_selection(&self) -> BackendSelection {
        self.config.backend
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Mat4;
    use sightline_core::GeometryGranularity;
    use sightline_geometry::primitives::unit_cube;
    use sightline_geometry::InMemoryScene;

    use super::*;

    fn scene() -> InMemoryScene {
        let mut scene = InMemoryScene::new();
        let cube = Arc::new(unit_cube());
        for x in [-2.0, 0.0, 2.0] {
            scene.spawn(
                Mat4::from_translation(Vec3::new(x, 0.0, 6.0)),
                Some(Arc::clone(&cube)),
                None,
            );
        }
        scene
    }

    #[test]
    fn test_default_state_is_object_backend() {
        let coordinator = PipelineCoordinator::new(Viewer::default()).unwrap();
        assert_eq!(coordinator.state(), BackendState::ObjectBackendActive);
        assert!(coordinator.closest_target().is_empty());
    }

    #[test]
    fn test_update_publishes_closest_target() {
        let scene = scene();
        let mut coordinator = PipelineCoordinator::new(Viewer::default()).unwrap();
        let results = coordinator.update(&scene);
        assert_eq!(results.frame, 1);
        assert_eq!(results.seen_objects().len(), 3);
        assert_eq!(coordinator.closest_target().object, Some(ObjectHandle(1)));
    }

    #[test]
    fn test_configure_switches_backends() {
        let mut coordinator = PipelineCoordinator::new(Viewer::default()).unwrap();
        coordinator
            .configure(&TargetingOptions {
                backend: Some(BackendSelection::Both),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(coordinator.state(), BackendState::BothActive);

        coordinator
            .configure(&TargetingOptions {
                enabled: Some(false),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(coordinator.state(), BackendState::Disabled);
        assert_eq!(coordinator.backend_selection(), BackendSelection::Both);
    }

    #[test]
    fn test_rejected_options_change_nothing() {
        let mut coordinator = PipelineCoordinator::new(Viewer::default()).unwrap();
        let result = coordinator.configure(&TargetingOptions {
            field_of_view: Some(190.0),
            geometry_granularity: Some(GeometryGranularity::Edges),
            ..Default::default()
        });
        assert!(result.is_err());
        assert_eq!(coordinator.configuration().granularity, GeometryGranularity::Objects);
        assert_eq!(coordinator.viewer().field_of_view_degrees, 60.0);
    }

    #[test]
    fn test_field_of_view_option_updates_viewer() {
        let mut coordinator = PipelineCoordinator::new(Viewer::default()).unwrap();
        coordinator.configure_json(r#"{"fieldOfView": 25.0}"#).unwrap();
        assert_eq!(coordinator.viewer().field_of_view_degrees, 25.0);
    }

    #[test]
    fn test_invalid_viewer_rejected() {
        let mut coordinator = PipelineCoordinator::new(Viewer::default()).unwrap();
        assert!(coordinator.set_pose(Vec3::ZERO, Vec3::Y, Vec3::Y).is_err());
        assert_eq!(coordinator.viewer().forward, Vec3::Z);
    }
}
