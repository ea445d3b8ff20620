//! Bounding planes.
//!
//! A plane is stored as a unit normal and a distance scalar so that the
//! signed distance of a point `p` is `dot(normal, p) + distance`. Points with
//! a non-negative signed distance are on the inner side.

use glam::{Vec3, Vec4};

/// An oriented plane in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal, pointing toward the inner side.
    normal: Vec3,
    /// Offset along the normal: `dot(normal, p) + distance == 0` on the plane.
    distance: f32,
}

impl Plane {
    /// Creates a plane from a normal and distance.
    ///
    /// The normal is normalized and the distance scaled by the same factor,
    /// so the plane itself is unchanged. A zero normal yields a plane that
    /// contains every point.
    pub fn new(normal: Vec3, distance: f32) -> Self {
        let length = normal.length();
        if length <= f32::EPSILON {
            return Self {
                normal: Vec3::ZERO,
                distance: 0.0,
            };
        }
        Self {
            normal: normal / length,
            distance: distance / length,
        }
    }

    /// Creates a plane through `point` facing `normal`.
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            distance: -normal.dot(point),
        }
    }

    /// Returns the unit normal.
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Returns the distance scalar.
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Returns the signed distance from a point to the plane.
    ///
    /// Positive values are on the inner (normal) side.
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }

    /// Returns whether a point is on the inner side of the plane or on it.
    pub fn is_inside(&self, point: Vec3) -> bool {
        self.signed_distance(point) >= 0.0
    }

    /// Projects a point onto the plane.
    pub fn project(&self, point: Vec3) -> Vec3 {
        point - self.signed_distance(point) * self.normal
    }

    /// Returns the same plane facing the opposite way.
    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            distance: -self.distance,
        }
    }

    /// Packs the plane as `(nx, ny, nz, d)`.
    pub fn to_vec4(&self) -> Vec4 {
        self.normal.extend(self.distance)
    }
}

impl From<Vec4> for Plane {
    fn from(v: Vec4) -> Self {
        Self::new(v.truncate(), v.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_normalizes() {
        let plane = Plane::new(Vec3::new(0.0, 2.0, 0.0), 4.0);
        assert_eq!(plane.normal(), Vec3::Y);
        assert!((plane.distance() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_signed_distance() {
        let plane = Plane::from_point_normal(Vec3::new(0.0, 1.0, 0.0), Vec3::Y);

        assert!(plane.signed_distance(Vec3::new(0.0, 3.0, 0.0)) > 0.0);
        assert!(plane.signed_distance(Vec3::new(0.0, -1.0, 0.0)) < 0.0);
        assert!(plane.signed_distance(Vec3::new(5.0, 1.0, -2.0)).abs() < 1e-6);
    }

    #[test]
    fn test_is_inside_includes_boundary() {
        let plane = Plane::from_point_normal(Vec3::ZERO, Vec3::X);
        assert!(plane.is_inside(Vec3::ZERO));
        assert!(plane.is_inside(Vec3::X));
        assert!(!plane.is_inside(Vec3::NEG_X));
    }

    #[test]
    fn test_project() {
        let plane = Plane::from_point_normal(Vec3::ZERO, Vec3::Y);
        let projected = plane.project(Vec3::new(1.0, 5.0, 2.0));
        assert!((projected - Vec3::new(1.0, 0.0, 2.0)).length() < 1e-6);
    }

    #[test]
    fn test_flipped() {
        let plane = Plane::from_point_normal(Vec3::new(0.0, 0.0, 2.0), Vec3::Z);
        let flipped = plane.flipped();
        let p = Vec3::new(0.0, 0.0, 5.0);
        assert!((plane.signed_distance(p) + flipped.signed_distance(p)).abs() < 1e-6);
    }

    #[test]
    fn test_zero_normal_contains_everything() {
        let plane = Plane::new(Vec3::ZERO, 3.0);
        assert!(plane.is_inside(Vec3::splat(-100.0)));
    }
}
