//! Undirected mesh edges used as a finer-than-object visibility unit.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Distance under which two endpoints are considered the same point.
pub const EDGE_TOLERANCE: f32 = 0.1;

/// A world-space edge between two mesh vertices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// First endpoint in world space.
    pub start: Vec3,
    /// Second endpoint in world space.
    pub end: Vec3,
    /// Index of the first endpoint in the source vertex buffer.
    pub start_index: u32,
    /// Index of the second endpoint in the source vertex buffer.
    pub end_index: u32,
    /// Whether the edge passed the last frustum test.
    pub visible: bool,
}

impl Edge {
    /// Creates an edge, initially not visible.
    pub fn new(start: Vec3, end: Vec3, start_index: u32, end_index: u32) -> Self {
        Self {
            start,
            end,
            start_index,
            end_index,
            visible: false,
        }
    }

    /// Returns the midpoint.
    pub fn midpoint(&self) -> Vec3 {
        (self.start + self.end) * 0.5
    }

    /// Returns the length.
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Returns whether two edges are the same undirected edge within
    /// [`EDGE_TOLERANCE`].
    pub fn is_same(&self, other: &Edge) -> bool {
        self.matches_within(other, EDGE_TOLERANCE)
    }

    /// Returns whether the endpoints match within `tolerance` in either order.
    pub fn matches_within(&self, other: &Edge, tolerance: f32) -> bool {
        let same = points_match(self.start, other.start, tolerance)
            && points_match(self.end, other.end, tolerance);
        let swapped = points_match(self.start, other.end, tolerance)
            && points_match(self.end, other.start, tolerance);
        same || swapped
    }
}

/// Returns whether two points lie within `tolerance` of each other.
pub fn points_match(a: Vec3, b: Vec3, tolerance: f32) -> bool {
    a.distance_squared(b) <= tolerance * tolerance
}
