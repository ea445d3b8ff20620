//! Core data model for sightline.
//!
//! This crate provides the types shared by every part of the targeting pipeline:
//! - [`Frustum`] derivation and point/box/edge containment tests
//! - [`Edge`], [`Mesh`] and the cached per-object [`GeoInfo`]
//! - [`Target`] ray projection and ranking
//! - [`TargetingConfiguration`] and the partial [`TargetingOptions`] update
//! - The [`TargetingBackend`] strategy trait and the keyed [`BackendRegistry`]

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Geometry code compares exact float sentinels on purpose
#![allow(clippy::float_cmp)]

pub mod backend;
pub mod bounds;
pub mod edge;
pub mod entity;
pub mod error;
pub mod frustum;
pub mod geo_info;
pub mod mesh;
pub mod options;
pub mod plane;
pub mod registry;
pub mod target;
pub mod viewer;

pub use backend::{BackendKind, FrameContext, FrameOutput, SeenGeometry, TargetingBackend};
pub use bounds::Aabb;
pub use edge::{points_match, Edge, EDGE_TOLERANCE};
pub use entity::EntityId;
pub use error::{Result, SightlineError};
pub use frustum::{Frustum, FrustumSide};
pub use geo_info::{GeoInfo, ObjectHandle};
pub use mesh::Mesh;
pub use options::{
    BackendSelection, BatchSettings, ConfigChanges, GeometryGranularity, MeshSource,
    TargetingConfiguration, TargetingOptions,
};
pub use plane::Plane;
pub use registry::BackendRegistry;
pub use target::{rank_targets, Ray, Target, TargetElement, RAY_EPSILON};
pub use viewer::Viewer;

// Re-export glam types for convenience
pub use glam::{Mat4, Quat, Vec3};
