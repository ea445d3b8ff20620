//! The targeting backend strategy trait and the per-frame data it exchanges.
//!
//! A [`TargetingBackend`] runs the visibility/targeting contract over the
//! current candidate set once per frame. The two implementations differ only
//! in execution strategy; for the same scene state they must produce
//! numerically equivalent targets.

use std::fmt;

use crate::bounds::Aabb;
use crate::edge::Edge;
use crate::entity::EntityId;
use crate::frustum::Frustum;
use crate::geo_info::{GeoInfo, ObjectHandle};
use crate::options::TargetingConfiguration;
use crate::target::{Ray, Target};

/// The kind of a backend; at most one instance of each kind is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BackendKind {
    /// Immediate per-object backend.
    Object,
    /// Batched data-oriented backend.
    Entity,
}

impl BackendKind {
    /// Both kinds in registry order.
    pub const ALL: [BackendKind; 2] = [BackendKind::Object, BackendKind::Entity];

    /// Returns a display name.
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Object => "object",
            BackendKind::Entity => "entity",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inputs for one backend frame.
///
/// Plane data is shared read-only; the candidate list belongs to the
/// coordinator and is lent out mutably for the object backend's edge flags.
pub struct FrameContext<'a> {
    /// Monotonic frame counter.
    pub frame: u64,
    /// The frustum for this frame.
    pub frustum: &'a Frustum,
    /// The viewer's central sight-line.
    pub ray: Ray,
    /// Current configuration.
    pub config: &'a TargetingConfiguration,
    /// The tracked candidate objects.
    pub candidates: &'a mut [GeoInfo],
    /// Bumped by the tracker every time it rebuilds the candidate list.
    pub scan_generation: u64,
}

/// A geometry-bearing object seen this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SeenGeometry {
    /// The source object.
    pub object: ObjectHandle,
    /// The entity mirroring the object, for the data-oriented backend.
    pub entity: Option<EntityId>,
    /// World-space bounds.
    pub bounds: Aabb,
    /// Edges with per-edge visibility flags; empty unless edge or vertex
    /// targeting is active.
    pub edges: Vec<Edge>,
}

impl SeenGeometry {
    /// Returns the number of edges flagged visible.
    pub fn visible_edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.visible).count()
    }
}

/// Everything a backend publishes for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutput {
    /// Objects whose bounds overlap the frustum.
    pub seen_objects: Vec<ObjectHandle>,
    /// Geometry of the seen objects.
    pub seen_geometry: Vec<SeenGeometry>,
    /// Ranked targets, ascending by distance to the ray.
    pub targets: Vec<Target>,
}

impl FrameOutput {
    /// Returns the closest target, or the empty sentinel.
    pub fn closest_target(&self) -> Target {
        self.targets.first().copied().unwrap_or(Target::EMPTY)
    }
}

/// A strategy that runs visibility and targeting for one frame.
pub trait TargetingBackend: Send {
    /// Returns the backend kind.
    fn kind(&self) -> BackendKind;

    /// Returns whether this is the data-oriented backend.
    fn is_entity_backend(&self) -> bool {
        self.kind() == BackendKind::Entity
    }

    /// Classifies candidates against the frustum and ranks targets.
    ///
    /// All work completes before this returns.
    fn run_frame(&mut self, ctx: &mut FrameContext<'_>) -> FrameOutput;

    /// Releases backend resources. Called once when the backend is disabled.
    fn teardown(&mut self) {}
}
