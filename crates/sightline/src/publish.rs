//! Published per-frame results.
//!
//! The coordinator builds a complete [`FrameResults`] off to the side and
//! swaps it in only when the frame is done, so readers always see either the
//! previous frame or the new one, never a mix.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use sightline_core::{BackendKind, FrameOutput, ObjectHandle, SeenGeometry, Target};

use crate::state::BackendState;

/// Everything the pipeline produced for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameResults {
    /// Frame counter the results belong to.
    pub frame: u64,
    /// Backend state during the frame.
    pub state: BackendState,
    outputs: BTreeMap<BackendKind, FrameOutput>,
}

impl FrameResults {
    /// Creates results with no backend output.
    pub fn empty(frame: u64, state: BackendState) -> Self {
        Self {
            frame,
            state,
            outputs: BTreeMap::new(),
        }
    }

    /// Creates results from per-backend outputs.
    pub fn new(frame: u64, state: BackendState, outputs: BTreeMap<BackendKind, FrameOutput>) -> Self {
        Self {
            frame,
            state,
            outputs,
        }
    }

    /// Returns the output of one backend.
    pub fn output(&self, kind: BackendKind) -> Option<&FrameOutput> {
        self.outputs.get(&kind)
    }

    /// Returns the backend whose output is reported: the first active
    /// backend, in registry order, that already has output.
    ///
    /// A backend enabled since the last frame has no output yet, so the
    /// other active backend keeps reporting until the next update.
    pub fn primary_kind(&self) -> Option<BackendKind> {
        BackendKind::ALL
            .into_iter()
            .find(|&kind| self.state.is_active(kind) && self.outputs.contains_key(&kind))
    }

    /// Returns the primary output.
    pub fn primary(&self) -> Option<&FrameOutput> {
        self.primary_kind().and_then(|kind| self.outputs.get(&kind))
    }

    /// Objects inside the frustum.
    pub fn seen_objects(&self) -> &[ObjectHandle] {
        self.primary().map(|o| o.seen_objects.as_slice()).unwrap_or_default()
    }

    /// Geometry-bearing objects inside the frustum.
    pub fn seen_geometry(&self) -> &[SeenGeometry] {
        self.primary().map(|o| o.seen_geometry.as_slice()).unwrap_or_default()
    }

    /// Ranked targets, closest first. Empty when nothing is in view or no
    /// backend runs.
    pub fn closest_targets(&self) -> &[Target] {
        self.primary().map(|o| o.targets.as_slice()).unwrap_or_default()
    }

    /// The closest target, or [`Target::EMPTY`].
    pub fn closest_target(&self) -> Target {
        self.closest_targets().first().copied().unwrap_or(Target::EMPTY)
    }
}

/// Shared slot holding the latest published results.
///
/// Cloning the slot shares it; readers on other threads call
/// [`load`](Self::load) and keep the returned `Arc` as long as they like.
#[derive(Debug, Clone, Default)]
pub struct ResultsSlot {
    current: Arc<RwLock<Arc<FrameResults>>>,
}

impl ResultsSlot {
    /// Creates a slot holding empty results.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the latest published results.
    pub fn load(&self) -> Arc<FrameResults> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replaces the published results and returns them.
    pub fn publish(&self, results: FrameResults) -> Arc<FrameResults> {
        let results = Arc::new(results);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&results);
        results
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use sightline_core::{Ray, TargetElement};

    use super::*;

    fn output_with_target(id: u64) -> FrameOutput {
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        FrameOutput {
            seen_objects: vec![ObjectHandle(id)],
            seen_geometry: Vec::new(),
            targets: vec![Target::project(
                &ray,
                Vec3::new(0.0, 0.0, 5.0),
                ObjectHandle(id),
                TargetElement::Object,
            )],
        }
    }

    #[test]
    fn test_empty_results() {
        let results = FrameResults::empty(3, BackendState::Disabled);
        assert!(results.seen_objects().is_empty());
        assert!(results.closest_targets().is_empty());
        assert!(results.closest_target().is_empty());
    }

    #[test]
    fn test_primary_output_selection() {
        let mut outputs = BTreeMap::new();
        outputs.insert(BackendKind::Object, output_with_target(1));
        outputs.insert(BackendKind::Entity, output_with_target(2));
        let both = FrameResults::new(1, BackendState::BothActive, outputs.clone());
        assert_eq!(both.closest_target().object, Some(ObjectHandle(1)));
        assert_eq!(
            both.output(BackendKind::Entity).unwrap().seen_objects,
            vec![ObjectHandle(2)]
        );

        outputs.remove(&BackendKind::Object);
        let entity = FrameResults::new(2, BackendState::EntityBackendActive, outputs);
        assert_eq!(entity.seen_objects(), &[ObjectHandle(2)]);
    }

    #[test]
    fn test_newly_enabled_backend_without_output_is_skipped() {
        let mut outputs = BTreeMap::new();
        outputs.insert(BackendKind::Entity, output_with_target(2));
        let results = FrameResults::new(4, BackendState::BothActive, outputs);
        assert_eq!(results.primary_kind(), Some(BackendKind::Entity));
        assert_eq!(results.closest_target().object, Some(ObjectHandle(2)));
        assert_eq!(results.seen_objects(), &[ObjectHandle(2)]);
    }

    #[test]
    fn test_readers_keep_previous_snapshot() {
        let slot = ResultsSlot::new();
        let reader = slot.clone();
        slot.publish(FrameResults::empty(1, BackendState::Disabled));
        let held = reader.load();
        slot.publish(FrameResults::empty(2, BackendState::Disabled));
        assert_eq!(held.frame, 1);
        assert_eq!(reader.load().frame, 2);
    }
}
