//! Viewer state: pose and lens parameters that define the visible volume.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SightlineError};
use crate::target::Ray;

/// Default vertical field of view in degrees.
pub const DEFAULT_FIELD_OF_VIEW: f32 = 60.0;
/// Default near clip distance.
pub const DEFAULT_NEAR: f32 = 0.3;
/// Default far clip distance.
pub const DEFAULT_FAR: f32 = 1000.0;

/// Position, orientation and lens of a viewer.
///
/// The field of view is vertical and symmetric; the horizontal extent
/// follows from the aspect ratio (width / height).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewer {
    /// Viewer position in world space.
    pub position: Vec3,
    /// Look direction.
    pub forward: Vec3,
    /// Up direction.
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub field_of_view_degrees: f32,
    /// Aspect ratio (width / height).
    pub aspect_ratio: f32,
    /// Near clip distance along `forward`.
    pub near: f32,
    /// Far clip distance along `forward`.
    pub far: f32,
}

impl Viewer {
    /// Creates a viewer at `position` looking along `forward`.
    pub fn new(position: Vec3, forward: Vec3, up: Vec3) -> Self {
        Self {
            position,
            forward: forward.normalize_or_zero(),
            up: up.normalize_or_zero(),
            ..Self::default()
        }
    }

    /// Creates a viewer looking at a target point.
    pub fn look_at(position: Vec3, target: Vec3, up: Vec3) -> Self {
        Self::new(position, target - position, up)
    }

    /// Sets the vertical field of view in degrees.
    #[must_use]
    pub fn with_field_of_view(mut self, degrees: f32) -> Self {
        self.field_of_view_degrees = degrees;
        self
    }

    /// Sets the aspect ratio.
    #[must_use]
    pub fn with_aspect_ratio(mut self, aspect_ratio: f32) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    /// Sets the near and far clip distances.
    #[must_use]
    pub fn with_clip_range(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Gets the right direction (forward cross up).
    pub fn right(&self) -> Vec3 {
        self.forward.cross(self.up).normalize_or_zero()
    }

    /// Gets the orthonormal frame as (forward, up, right).
    ///
    /// `up` is re-orthogonalized against `forward`.
    pub fn frame(&self) -> (Vec3, Vec3, Vec3) {
        let forward = self.forward.normalize_or_zero();
        let right = self.right();
        let up = right.cross(forward).normalize_or_zero();
        (forward, up, right)
    }

    /// Returns the central sight-line.
    pub fn ray(&self) -> Ray {
        Ray::new(self.position, self.forward)
    }

    /// Checks lens parameters and basis.
    pub fn validate(&self) -> Result<()> {
        validate_field_of_view(self.field_of_view_degrees)?;
        if !(self.aspect_ratio > 0.0 && self.aspect_ratio.is_finite()) {
            return Err(SightlineError::InvalidAspectRatio(self.aspect_ratio));
        }
        if !(self.near >= 0.0 && self.far > self.near && self.far.is_finite()) {
            return Err(SightlineError::InvalidClipRange {
                near: self.near,
                far: self.far,
            });
        }
        if self.right() == Vec3::ZERO {
            return Err(SightlineError::DegenerateViewerBasis);
        }
        Ok(())
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::Z,
            up: Vec3::Y,
            field_of_view_degrees: DEFAULT_FIELD_OF_VIEW,
            aspect_ratio: 1.0,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }
}

/// Checks that a field of view lies within (0, 180) degrees.
pub fn validate_field_of_view(degrees: f32) -> Result<()> {
    if degrees > 0.0 && degrees < 180.0 {
        Ok(())
    } else {
        Err(SightlineError::InvalidFieldOfView(degrees))
    }
}
