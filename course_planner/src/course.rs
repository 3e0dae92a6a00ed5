//! # Course graph model
//!
//! The immutable network of [`Segment`]s and [`Transition`]s that the
//! planner's search runs over. Building this network from a real course
//! (clustering road-network-like geometry into straight runs joined by
//! curved connectors) is the job of an external `CourseGenerator` and is out
//! of scope here - this module only defines the data the generator produces
//! and the read-only operations the search needs: iteration over segments,
//! each segment's outgoing transitions, and a tolerance-based nearest-segment
//! lookup.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::geometry::{Line, Pose, Polyline};

// ---------------------------------------------------------------------------
// IDS
// ---------------------------------------------------------------------------

/// Stable index of a [`Segment`] within a [`CourseGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub usize);

/// Stable index of a [`Transition`] within a [`CourseGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransitionId(pub usize);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A straight drivable line in the course network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub line: Line,

    /// Transitions departing this segment, i.e. `transition.source == self`.
    pub forward_transitions: Vec<TransitionId>,

    /// Transitions arriving at this segment that may be driven in reverse
    /// back out of it, i.e. `transition.target == self`.
    pub backward_transitions: Vec<TransitionId>,
}

/// A precomputed curved connector between two segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    /// The segment this transition departs.
    pub source: SegmentId,

    /// The segment this transition enters.
    pub target: SegmentId,

    /// Ordered polyline whose endpoints lie on `source` and `target`
    /// respectively.
    pub path: Polyline,

    /// Euclidean length of `path`.
    pub arc_length: f64,
}

/// The immutable segment/transition network. Borrowed for the planner's
/// entire lifetime; never mutated during planning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseGraph {
    segments: Vec<Segment>,
    transitions: Vec<Transition>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CourseGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a segment with no transitions yet and return its id.
    pub fn add_segment(&mut self, line: Line) -> SegmentId {
        let id = SegmentId(self.segments.len());
        self.segments.push(Segment {
            line,
            forward_transitions: Vec::new(),
            backward_transitions: Vec::new(),
        });
        id
    }

    /// Add a transition from `source` to `target`, registering it in
    /// `source`'s forward list and `target`'s backward list.
    pub fn add_transition(
        &mut self,
        source: SegmentId,
        target: SegmentId,
        path: Polyline,
    ) -> TransitionId {
        let arc_length = path.arc_length();
        let id = TransitionId(self.transitions.len());
        self.transitions.push(Transition {
            source,
            target,
            path,
            arc_length,
        });
        self.segments[source.0].forward_transitions.push(id);
        self.segments[target.0].backward_transitions.push(id);
        id
    }

    pub fn segment(&self, id: SegmentId) -> &Segment {
        &self.segments[id.0]
    }

    pub fn transition(&self, id: TransitionId) -> &Transition {
        &self.transitions[id.0]
    }

    /// Iterate over every segment's id, in insertion order.
    pub fn segments(&self) -> impl Iterator<Item = SegmentId> + '_ {
        (0..self.segments.len()).map(SegmentId)
    }

    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    /// Iterate over every transition's id, in insertion order.
    pub fn transitions(&self) -> impl Iterator<Item = TransitionId> + '_ {
        (0..self.transitions.len()).map(TransitionId)
    }

    pub fn num_transitions(&self) -> usize {
        self.transitions.len()
    }

    /// Find the segment whose line is closest to `pose`, subject to both a
    /// maximum perpendicular distance and a maximum angular misalignment
    /// between `pose`'s heading and the segment's tangent (either direction
    /// of travel along the segment is accepted).
    ///
    /// Returns `None` if no segment satisfies both tolerances.
    pub fn find_closest_segment(
        &self,
        pose: Pose,
        angular_tolerance_rad: f64,
        distance_tolerance_m: f64,
    ) -> Option<SegmentId> {
        let mut best: Option<(SegmentId, f64)> = None;

        for id in self.segments() {
            let segment = self.segment(id);
            let nearest = segment.line.nearest_point_to(pose.position);
            let dist = (nearest - pose.position).norm();

            if dist > distance_tolerance_m {
                continue;
            }

            if angular_diff(pose.heading_rad, segment.line.tangent_rad()) > angular_tolerance_rad {
                continue;
            }

            if best.map_or(true, |(_, best_dist)| dist < best_dist) {
                best = Some((id, dist));
            }
        }

        best.map(|(id, _)| id)
    }
}

/// Smallest angle between `a` and `b`, accounting for a line's tangent being
/// ambiguous up to a sign (driving either direction along it is aligned).
fn angular_diff(a: f64, b: f64) -> f64 {
    let wrap = |x: f64| {
        let two_pi = std::f64::consts::TAU;
        ((x % two_pi) + two_pi) % two_pi
    };

    let d = (wrap(a) - wrap(b)).abs();
    let d = d.min(std::f64::consts::TAU - d);
    d.min((std::f64::consts::PI - d).abs())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Point2;
    use std::f64::consts::FRAC_PI_8;

    fn straight(x0: f64, x1: f64) -> Line {
        Line::new(Point2::new(x0, 0.0), Point2::new(x1, 0.0))
    }

    #[test]
    fn add_transition_registers_both_sides() {
        let mut graph = CourseGraph::new();
        let a = graph.add_segment(straight(0.0, 5.0));
        let b = graph.add_segment(straight(6.0, 10.0));
        let t = graph.add_transition(
            a,
            b,
            Polyline::new(vec![Point2::new(5.0, 0.0), Point2::new(6.0, 0.0)]),
        );

        assert_eq!(graph.segment(a).forward_transitions, vec![t]);
        assert_eq!(graph.segment(b).backward_transitions, vec![t]);
        assert!(graph.segment(a).backward_transitions.is_empty());
        assert!(graph.segment(b).forward_transitions.is_empty());
    }

    #[test]
    fn find_closest_segment_respects_tolerances() {
        let mut graph = CourseGraph::new();
        let a = graph.add_segment(straight(0.0, 10.0));

        let aligned = Pose::new(Point2::new(3.0, 0.2), 0.0);
        assert_eq!(
            graph.find_closest_segment(aligned, FRAC_PI_8, 0.5),
            Some(a)
        );

        let too_far = Pose::new(Point2::new(3.0, 2.0), 0.0);
        assert_eq!(graph.find_closest_segment(too_far, FRAC_PI_8, 0.5), None);

        let misaligned = Pose::new(Point2::new(3.0, 0.0), std::f64::consts::FRAC_PI_2);
        assert_eq!(
            graph.find_closest_segment(misaligned, FRAC_PI_8, 0.5),
            None
        );

        // Driving the opposite direction along the segment is still aligned.
        let reversed = Pose::new(Point2::new(3.0, 0.0), std::f64::consts::PI);
        assert_eq!(
            graph.find_closest_segment(reversed, FRAC_PI_8, 0.5),
            Some(a)
        );
    }
}
