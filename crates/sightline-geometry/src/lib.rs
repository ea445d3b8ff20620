//! Geometry side of sightline.
//!
//! - [`GeometryExtractor`] turns triangle meshes into deduplicated world-space
//!   edge lists, welding vertices that lie within the edge tolerance
//! - [`SceneEnumerator`] is the read-only view of the host scene, with
//!   [`InMemoryScene`] as a ready-made implementation
//! - [`SceneObjectTracker`] mirrors scene objects into cached
//!   [`GeoInfo`](sightline_core::GeoInfo) candidates

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod extract;
pub mod primitives;
pub mod scene;
pub mod tracker;

pub use extract::{ExtractedGeometry, GeometryExtractor};
pub use scene::{InMemoryScene, SceneEnumerator, SceneObject};
pub use tracker::SceneObjectTracker;
