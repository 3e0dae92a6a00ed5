//! # Planner entry point
//!
//! [`CoursePlanner`] is the crate's one public operation: given a start and
//! end pose in world coordinates, produce a pose sequence respecting the
//! course network's segments and transitions, bridged at each end by an
//! appendix from the free pose onto its nearest segment.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{error, warn};

use crate::appendix::{resolve_appendix, AnchorRole, AppendixSolver, MapProvider};
use crate::config::PlannerParams;
use crate::course::CourseGraph;
use crate::error::PlannerError;
use crate::geometry::Pose;
use crate::reconstruct::reconstruct;
use crate::search::{SearchReport, SearchState};

/// Tolerances `find_closest_segment` is called with when resolving anchors.
const ANCHOR_ANGULAR_TOLERANCE_RAD: f64 = std::f64::consts::FRAC_PI_8;
const ANCHOR_DISTANCE_TOLERANCE_M: f64 = 0.5;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Owns the parameters and external collaborators a single planner instance
/// needs across repeated `find_path` calls. Holds no per-call mutable state;
/// every call builds and discards its own [`SearchState`].
pub struct CoursePlanner {
    params: PlannerParams,
    map_provider: Box<dyn MapProvider>,
    appendix_solvers: Vec<Box<dyn AppendixSolver>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CoursePlanner {
    pub fn new(
        params: PlannerParams,
        map_provider: Box<dyn MapProvider>,
        appendix_solvers: Vec<Box<dyn AppendixSolver>>,
    ) -> Self {
        Self {
            params,
            map_provider,
            appendix_solvers,
        }
    }

    /// Plan a pose sequence from `start_pose` to `end_pose` over `course`.
    /// An empty return signals failure; the reason is logged at `error!`.
    pub fn find_path(&self, course: &CourseGraph, start_pose: Pose, end_pose: Pose) -> Vec<Pose> {
        let mut report = SearchReport::default();
        self.find_path_with_report(course, start_pose, end_pose, &mut report)
    }

    /// As [`Self::find_path`], but also fills in a [`SearchReport`]
    /// diagnosing the search (nodes expanded, whether the goal was reached).
    pub fn find_path_with_report(
        &self,
        course: &CourseGraph,
        start_pose: Pose,
        end_pose: Pose,
        report: &mut SearchReport,
    ) -> Vec<Pose> {
        match self.try_find_path(course, start_pose, end_pose, report) {
            Ok(poses) => poses,
            Err(err) => {
                error!("course planning failed: {}", err);
                Vec::new()
            }
        }
    }

    fn try_find_path(
        &self,
        course: &CourseGraph,
        start_pose: Pose,
        end_pose: Pose,
        report: &mut SearchReport,
    ) -> Result<Vec<Pose>, PlannerError> {
        let map = self.map_provider.get()?;

        let start_appendix =
            resolve_appendix(&self.appendix_solvers, &map, start_pose, AnchorRole::Start)?;
        let end_appendix =
            resolve_appendix(&self.appendix_solvers, &map, end_pose, AnchorRole::End)?;

        let start_anchor = start_appendix.last().copied().unwrap_or(start_pose);
        let end_anchor = end_appendix.last().copied().unwrap_or(end_pose);

        let start_segment = course
            .find_closest_segment(
                start_anchor,
                ANCHOR_ANGULAR_TOLERANCE_RAD,
                ANCHOR_DISTANCE_TOLERANCE_M,
            )
            .ok_or(PlannerError::NoClosestSegment { role: "start" })?;
        let end_segment = course
            .find_closest_segment(
                end_anchor,
                ANCHOR_ANGULAR_TOLERANCE_RAD,
                ANCHOR_DISTANCE_TOLERANCE_M,
            )
            .ok_or(PlannerError::NoClosestSegment { role: "end" })?;

        let middle = if start_segment == end_segment {
            // Same-segment shortcut: no search needed.
            let tangent = course.segment(start_segment).line.tangent_rad();
            vec![
                Pose::new(start_anchor.position, tangent),
                Pose::new(end_anchor.position, tangent),
            ]
        } else {
            let mut state = SearchState::new(
                course,
                &self.params,
                start_segment,
                end_segment,
                start_anchor.position,
                end_anchor.position,
            );

            match state.run(report) {
                Some(chain) => reconstruct(&state, &chain),
                None => {
                    warn!(
                        "search queue emptied without reaching the end segment; \
                         returning appendices only"
                    );
                    Vec::new()
                }
            }
        };

        let mut path = Vec::with_capacity(start_appendix.len() + middle.len() + end_appendix.len());
        path.extend(start_appendix);
        path.extend(middle);
        path.extend(end_appendix);

        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::appendix::OccupancyGrid;
    use crate::geometry::Line;
    use nalgebra::Point2;

    struct EmptyMap;
    impl MapProvider for EmptyMap {
        fn get(&self) -> Result<OccupancyGrid, PlannerError> {
            Ok(OccupancyGrid::new(
                1,
                1,
                1.0,
                Pose::new(Point2::new(0.0, 0.0), 0.0),
                vec![0],
            ))
        }
    }

    /// An appendix solver for fixture tests where the start/end poses
    /// already lie on the course - the "appendix" is just the pose itself.
    struct Identity;
    impl AppendixSolver for Identity {
        fn solve(&self, _map: &OccupancyGrid, pose: Pose, _role: AnchorRole) -> Option<Vec<Pose>> {
            Some(vec![pose])
        }
    }

    struct Unreachable;
    impl AppendixSolver for Unreachable {
        fn solve(&self, _map: &OccupancyGrid, _pose: Pose, _role: AnchorRole) -> Option<Vec<Pose>> {
            None
        }
    }

    fn identity_planner() -> CoursePlanner {
        CoursePlanner::new(
            PlannerParams::default(),
            Box::new(EmptyMap),
            vec![Box::new(Identity)],
        )
    }

    #[test]
    fn same_segment_trivial_scenario() {
        let mut course = CourseGraph::new();
        course.add_segment(Line::new(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)));

        let planner = identity_planner();
        let start = Pose::new(Point2::new(2.0, 0.0), 0.0);
        let end = Pose::new(Point2::new(7.0, 0.0), 0.0);

        let path = planner.find_path(&course, start, end);

        assert_eq!(path.len(), 2);
        assert_eq!(path[0].position, Point2::new(2.0, 0.0));
        assert_eq!(path[1].position, Point2::new(7.0, 0.0));
    }

    #[test]
    fn unreachable_appendix_returns_empty_path() {
        let course = CourseGraph::new();
        let planner = CoursePlanner::new(
            PlannerParams::default(),
            Box::new(EmptyMap),
            vec![Box::new(Unreachable)],
        );

        let start = Pose::new(Point2::new(0.0, 0.0), 0.0);
        let end = Pose::new(Point2::new(1.0, 0.0), 0.0);

        assert!(planner.find_path(&course, start, end).is_empty());
    }

    #[test]
    fn infeasible_graph_returns_appendix_only() {
        let mut course = CourseGraph::new();
        course.add_segment(Line::new(Point2::new(0.0, 0.0), Point2::new(5.0, 0.0)));
        course.add_segment(Line::new(Point2::new(100.0, 100.0), Point2::new(105.0, 100.0)));

        let planner = identity_planner();
        let start = Pose::new(Point2::new(2.0, 0.0), 0.0);
        let end = Pose::new(Point2::new(103.0, 100.0), 0.0);

        let mut report = SearchReport::default();
        let path = planner.find_path_with_report(&course, start, end, &mut report);

        assert!(!report.reached_goal);
        // No transition chain exists between the two segments, so the
        // middle is empty and the path is just the two appendix poses.
        assert_eq!(path.len(), 2);
    }
}
