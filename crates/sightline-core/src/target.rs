//! Targets: candidates ranked by their distance to the viewer's sight-line.

use std::cmp::Ordering;

use glam::Vec3;

use crate::entity::EntityId;
use crate::geo_info::ObjectHandle;

/// Squared direction length below which a ray is treated as degenerate.
pub const RAY_EPSILON: f32 = 1e-6;

/// A ray with an origin and direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Cast origin.
    pub origin: Vec3,
    /// Direction; does not need to be normalized.
    pub direction: Vec3,
}

impl Ray {
    /// Creates a ray.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Returns whether the direction is too short to project onto.
    pub fn is_degenerate(&self) -> bool {
        self.direction.dot(self.direction) < RAY_EPSILON
    }

    /// Projects a world point onto the ray's line, returning the world-space
    /// foot point.
    ///
    /// A degenerate ray projects everything onto its origin.
    pub fn project_point(&self, point: Vec3) -> Vec3 {
        let local = point - self.origin;
        let dd = self.direction.dot(self.direction);
        let projected = if dd < RAY_EPSILON {
            Vec3::ZERO
        } else {
            (local.dot(self.direction) / dd) * self.direction
        };
        projected + self.origin
    }
}

/// Which part of an object a target refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TargetElement {
    /// The object itself (its world position).
    #[default]
    Object,
    /// An edge of the object, by index into its edge list.
    Edge(u32),
    /// A welded vertex of the object, by index into its vertex list.
    Vertex(u32),
}

/// A candidate for "what the viewer is pointing at".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    /// Candidate world position.
    pub position: Vec3,
    /// Foot of the perpendicular from `position` onto the ray.
    pub projected: Vec3,
    /// Distance from the candidate to the ray line; never negative.
    pub distance_to_ray: f32,
    /// Distance from the ray origin to `projected`.
    pub distance_to_origin: f32,
    /// Source object, absent only on the empty sentinel.
    pub object: Option<ObjectHandle>,
    /// Entity that produced the target, for the data-oriented backend.
    pub entity: Option<EntityId>,
    /// Element of the source object.
    pub element: TargetElement,
    /// Whether the candidate passed the frustum test.
    pub visible: bool,
}

impl Target {
    /// The "no real target" sentinel.
    pub const EMPTY: Target = Target {
        position: Vec3::ZERO,
        projected: Vec3::ZERO,
        distance_to_ray: 0.0,
        distance_to_origin: 0.0,
        object: None,
        entity: None,
        element: TargetElement::Object,
        visible: false,
    };

    /// Projects a candidate onto the ray and computes both distances.
    pub fn project(ray: &Ray, position: Vec3, object: ObjectHandle, element: TargetElement) -> Self {
        let projected = ray.project_point(position);
        Self {
            position,
            projected,
            distance_to_ray: position.distance(projected),
            distance_to_origin: ray.origin.distance(projected),
            object: Some(object),
            entity: None,
            element,
            visible: true,
        }
    }

    /// Attaches the producing entity.
    #[must_use]
    pub fn with_entity(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Returns whether this is the sentinel: both distances exactly zero.
    pub fn is_empty(&self) -> bool {
        self.distance_to_ray == 0.0 && self.distance_to_origin == 0.0
    }

    /// Orders by ascending distance to the ray.
    pub fn cmp_by_ray_distance(&self, other: &Target) -> Ordering {
        self.distance_to_ray.total_cmp(&other.distance_to_ray)
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Drops hidden and sentinel targets, then sorts by distance to the ray.
///
/// The sort is stable: equal distances keep their enumeration order, so the
/// result is deterministic for identical input ordering. `max` truncates
/// the ranked list.
pub fn rank_targets(targets: &mut Vec<Target>, max: Option<usize>) {
    targets.retain(|t| t.visible && !t.is_empty());
    targets.sort_by(Target::cmp_by_ray_distance);
    if let Some(max) = max {
        targets.truncate(max);
    }
}
