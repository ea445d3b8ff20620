//! sightline: frustum visibility and closest-target resolution for a moving
//! viewer.
//!
//! Every frame the pipeline derives a six-plane frustum from the viewer,
//! finds which scene objects (and optionally which of their edges or
//! vertices) lie inside it, and ranks what remains by distance to the
//! viewer's central sight-line.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use sightline::*;
//!
//! fn main() -> Result<()> {
//!     let mut scene = InMemoryScene::new();
//!     let cube = Arc::new(primitives::unit_cube());
//!     for x in [-2.0, 0.0, 2.0] {
//!         scene.spawn(Mat4::from_translation(Vec3::new(x, 0.0, 6.0)), Some(Arc::clone(&cube)), None);
//!     }
//!
//!     let mut coordinator = PipelineCoordinator::new(Viewer::default())?;
//!     coordinator.configure_json(r#"{"geometryGranularity": "edges", "backend": "both"}"#)?;
//!     let results = coordinator.update(&scene);
//!
//!     let closest = results.closest_target();
//!     assert!(closest.distance_to_ray < 0.1);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`PipelineCoordinator`] owns one viewer's pipeline and its
//!   [`BackendState`]
//! - [`SceneObjectTracker`] mirrors scene objects into cached
//!   [`GeoInfo`] candidates using a cheap count-based change signal
//! - [`ObjectBackend`] and [`EntityBackend`] are the two interchangeable
//!   execution strategies behind the [`TargetingBackend`] trait
//! - [`FrameResults`] are published whole, after every backend finished

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

mod coordinator;
mod publish;
mod state;

pub use coordinator::PipelineCoordinator;
pub use publish::{FrameResults, ResultsSlot};
pub use state::BackendState;

// Re-export core types
pub use sightline_core::{
    error::{Result, SightlineError},
    rank_targets, Aabb, BackendKind, BackendRegistry, BackendSelection, BatchSettings,
    ConfigChanges, Edge, EntityId, FrameContext, FrameOutput, Frustum, FrustumSide, GeoInfo,
    GeometryGranularity, Mat4, Mesh, MeshSource, ObjectHandle, Plane, Quat, Ray, SeenGeometry,
    Target, TargetElement, TargetingBackend, TargetingConfiguration, TargetingOptions, Vec3,
    Viewer, EDGE_TOLERANCE,
};

// Re-export geometry types
pub use sightline_geometry::{
    primitives, ExtractedGeometry, GeometryExtractor, InMemoryScene, SceneEnumerator,
    SceneObject, SceneObjectTracker,
};

// Re-export backends
pub use sightline_targeting::{
    EntityBackend, EntityStore, FrustumClassifier, ObjectBackend, TargetResolver,
};
