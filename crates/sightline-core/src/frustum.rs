//! View frustum derivation and containment tests.
//!
//! The frustum is always exactly six inward-facing planes. Containment is
//! conservative: points are tested exactly, boxes with the per-plane
//! positive-vertex test, and edges only by their endpoints.

use glam::Vec3;

use crate::bounds::Aabb;
use crate::edge::Edge;
use crate::plane::Plane;
use crate::viewer::Viewer;

/// Identifies one of the six frustum planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrustumSide {
    /// Left side plane.
    Left = 0,
    /// Right side plane.
    Right = 1,
    /// Bottom side plane.
    Bottom = 2,
    /// Top side plane.
    Top = 3,
    /// Near clip plane.
    Near = 4,
    /// Far clip plane.
    Far = 5,
}

impl FrustumSide {
    /// All sides in storage order.
    pub const ALL: [FrustumSide; 6] = [
        FrustumSide::Left,
        FrustumSide::Right,
        FrustumSide::Bottom,
        FrustumSide::Top,
        FrustumSide::Near,
        FrustumSide::Far,
    ];
}

/// The six bounding planes of a viewer's visible volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    planes: [Plane; 6],
}

impl Frustum {
    /// Derives the six planes from a viewer basis and a symmetric lens.
    ///
    /// `forward`, `up` and `right` are expected to be unit length and
    /// mutually orthogonal. The field of view is vertical; the horizontal
    /// half-angle follows from `aspect`. Near and far planes sit at `near`
    /// and `far` along `forward`.
    #[allow(clippy::too_many_arguments)]
    pub fn compute_planes(
        origin: Vec3,
        forward: Vec3,
        up: Vec3,
        right: Vec3,
        field_of_view_degrees: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let half_vertical = field_of_view_degrees.to_radians() * 0.5;
        let half_horizontal = (half_vertical.tan() * aspect).atan();

        let (sin_v, cos_v) = half_vertical.sin_cos();
        let (sin_h, cos_h) = half_horizontal.sin_cos();

        // Side planes pass through the origin and lean inward by the half-angle.
        let left = Plane::from_point_normal(origin, right * cos_h + forward * sin_h);
        let right_plane = Plane::from_point_normal(origin, -right * cos_h + forward * sin_h);
        let bottom = Plane::from_point_normal(origin, up * cos_v + forward * sin_v);
        let top = Plane::from_point_normal(origin, -up * cos_v + forward * sin_v);
        let near_plane = Plane::from_point_normal(origin + forward * near, forward);
        let far_plane = Plane::from_point_normal(origin + forward * far, -forward);

        Self {
            planes: [left, right_plane, bottom, top, near_plane, far_plane],
        }
    }

    /// Derives the frustum for a viewer.
    pub fn from_viewer(viewer: &Viewer) -> Self {
        let (forward, up, right) = viewer.frame();
        Self::compute_planes(
            viewer.position,
            forward,
            up,
            right,
            viewer.field_of_view_degrees,
            viewer.aspect_ratio,
            viewer.near,
            viewer.far,
        )
    }

    /// Creates a frustum from explicit planes in [`FrustumSide`] order.
    pub fn from_planes(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Returns all six planes.
    pub fn planes(&self) -> &[Plane; 6] {
        &self.planes
    }

    /// Returns the plane for one side.
    pub fn plane(&self, side: FrustumSide) -> &Plane {
        &self.planes[side as usize]
    }

    /// Returns whether a point is inside: non-negative distance to every plane.
    pub fn contains(&self, point: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.is_inside(point))
    }

    /// Returns whether a box overlaps the frustum.
    ///
    /// A box is rejected only when it lies entirely on the negative side of
    /// some plane, so boxes near frustum corners may be accepted.
    pub fn contains_bounds(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            let n = plane.normal();
            let positive = Vec3::new(
                if n.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if n.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if n.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            plane.is_inside(positive)
        })
    }

    /// Returns whether both endpoints of an edge are inside.
    ///
    /// This is an approximation, not clipping: an edge that passes through
    /// the frustum with both endpoints outside is reported as not visible.
    pub fn contains_edge(&self, edge: &Edge) -> bool {
        self.contains_segment(edge.start, edge.end)
    }

    /// Endpoint test for a raw segment; see [`Frustum::contains_edge`].
    pub fn contains_segment(&self, start: Vec3, end: Vec3) -> bool {
        self.contains(start) && self.contains(end)
    }
}

impl Default for Frustum {
    fn default() -> Self {
        Self::from_viewer(&Viewer::default())
    }
}
