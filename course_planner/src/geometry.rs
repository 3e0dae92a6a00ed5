//! # Geometry primitives
//!
//! Planar points, oriented poses, a straight line with nearest-point
//! projection and end-point queries, and a polyline representing a
//! transition arc with an arc-length measure. All quantities are in world
//! coordinates (metres and radians).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A planar pose: a position and a heading, both in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Position in metres.
    pub position: Point2<f64>,

    /// Heading in radians, measured the same way as `f64::atan2`.
    pub heading_rad: f64,
}

/// A straight drivable line between two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start_point: Point2<f64>,
    pub end_point: Point2<f64>,
}

/// An ordered sequence of planar points, used as the geometry of a
/// [`crate::course::Transition`] arc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Point2<f64>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(position: Point2<f64>, heading_rad: f64) -> Self {
        Self {
            position,
            heading_rad,
        }
    }
}

impl Line {
    pub fn new(start_point: Point2<f64>, end_point: Point2<f64>) -> Self {
        Self {
            start_point,
            end_point,
        }
    }

    pub fn start_point(&self) -> Point2<f64> {
        self.start_point
    }

    pub fn end_point(&self) -> Point2<f64> {
        self.end_point
    }

    /// Vector from `start_point` to `end_point`, the line's declared
    /// direction.
    pub fn direction(&self) -> Vector2<f64> {
        self.end_point - self.start_point
    }

    /// Heading of the line's declared direction.
    pub fn tangent_rad(&self) -> f64 {
        atan2_of(self.direction())
    }

    /// Orthogonal projection of `p` onto the infinite line through
    /// `start_point`/`end_point`, clamped to the segment itself.
    pub fn nearest_point_to(&self, p: Point2<f64>) -> Point2<f64> {
        let dir = self.direction();
        let len_sq = dir.norm_squared();

        if len_sq == 0.0 {
            return self.start_point;
        }

        let t = ((p - self.start_point).dot(&dir) / len_sq).clamp(0.0, 1.0);
        self.start_point + dir * t
    }
}

impl Polyline {
    pub fn new(points: Vec<Point2<f64>>) -> Self {
        assert!(
            !points.is_empty(),
            "a transition path must have at least one point"
        );
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Point2<f64> {
        self.points[index]
    }

    pub fn front(&self) -> Point2<f64> {
        self.points[0]
    }

    pub fn back(&self) -> Point2<f64> {
        self.points[self.points.len() - 1]
    }

    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    /// Euclidean sum of the distances between consecutive points.
    pub fn arc_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| (w[1] - w[0]).norm())
            .sum()
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// `atan2` of a displacement vector, matching the convention used throughout
/// this crate for pose headings.
pub fn atan2_of(v: Vector2<f64>) -> f64 {
    v.y.atan2(v.x)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
