//! # Path reconstruction
//!
//! Turns the winning head-to-tail node chain from [`crate::search`] into a
//! concrete pose sequence: arcs sampled from each transition's polyline,
//! joined by straight runs along segments and, where the vehicle's effective
//! direction changes, short pivot stubs.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Point2;

use crate::geometry::{atan2_of, Pose};
use crate::search::{Node, NodeId, SearchState};

/// Effective-segment-length below which a node's straight stretch is
/// considered degenerate and only its arc is emitted.
const EPSILON: f64 = f64::EPSILON;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Reconstruct the middle section of the path (everything between the start
/// and end appendices) from a winning `chain` of node ids.
pub fn reconstruct(state: &SearchState, chain: &[NodeId]) -> Vec<Pose> {
    let mut poses = Vec::new();

    let start_segment_tangent = state.graph.segment(state.start_segment).line.tangent_rad();
    poses.push(Pose::new(state.start_pt, start_segment_tangent));

    if chain.is_empty() {
        let end_segment_tangent = state.graph.segment(state.end_segment).line.tangent_rad();
        poses.push(Pose::new(state.end_pt, end_segment_tangent));
        return poses;
    }

    let mut segment_forward = state.is_start_segment_forward(chain[0]);

    for &u_id in chain {
        let s = state.find_start_point_on_next_segment(u_id);
        let e = state.find_end_point_on_next_segment(u_id);
        let eff_len = (e - s).norm();

        let node = state.node(u_id);
        let t = state.graph.transition(node.transition);

        if eff_len < EPSILON {
            insert_curve_segment(&mut poses, node, t.path.points());
            continue;
        }

        let next_forward = state.is_next_segment_forward(u_id);

        if next_forward == segment_forward {
            if node.curve_forward == next_forward {
                insert_curve_segment(&mut poses, node, t.path.points());
            } else {
                let stub_target = if node.curve_forward {
                    t.path.front()
                } else {
                    t.path.back()
                };
                extend_with_straight_turning_segment(&mut poses, stub_target, state.params.turning_straight_segment());
                insert_curve_segment(&mut poses, node, t.path.points());
                if node.curve_forward {
                    extend_along_target(&mut poses, state, node);
                } else {
                    extend_along_source(&mut poses, state, node);
                }
            }
        } else {
            match (segment_forward, node.curve_forward) {
                (true, true) => {
                    insert_curve_segment(&mut poses, node, t.path.points());
                    extend_along_target(&mut poses, state, node);
                }
                (true, false) => {
                    extend_along_target(&mut poses, state, node);
                    insert_curve_segment(&mut poses, node, t.path.points());
                }
                (false, true) => {
                    extend_along_source(&mut poses, state, node);
                    insert_curve_segment(&mut poses, node, t.path.points());
                }
                (false, false) => {
                    insert_curve_segment(&mut poses, node, t.path.points());
                    extend_along_source(&mut poses, state, node);
                }
            }
        }

        segment_forward = next_forward;
    }

    let end_segment_tangent = state.graph.segment(state.end_segment).line.tangent_rad();
    poses.push(Pose::new(state.end_pt, end_segment_tangent));

    poses
}

/// Sample a transition's polyline into oriented poses, in the direction
/// `node.curve_forward` dictates.
fn insert_curve_segment(poses: &mut Vec<Pose>, node: &Node, path: &[Point2<f64>]) {
    let m = path.len();
    if node.curve_forward {
        for j in 1..m {
            let heading = atan2_of(path[j] - path[j - 1]);
            poses.push(Pose::new(path[j], heading));
        }
    } else {
        for j in (0..m.saturating_sub(1)).rev() {
            let heading = atan2_of(path[j] - path[j + 1]);
            poses.push(Pose::new(path[j], heading));
        }
    }
}

/// Offset from the transition's far end along the target segment's own
/// tangent direction, emitted after an arc that arrives travelling forward.
fn extend_along_target(poses: &mut Vec<Pose>, state: &SearchState, node: &Node) {
    let t = state.graph.transition(node.transition);
    let target_line = &state.graph.segment(t.target).line;
    let heading = target_line.tangent_rad();
    let dir = target_line.direction().normalize();
    let pose_point = t.path.back() + dir * state.params.turning_straight_segment();
    poses.push(Pose::new(pose_point, heading));
}

/// Offset from the transition's near end along the *reversed* source
/// segment's tangent, emitted before an arc that departs travelling
/// backward.
fn extend_along_source(poses: &mut Vec<Pose>, state: &SearchState, node: &Node) {
    let t = state.graph.transition(node.transition);
    let source_line = &state.graph.segment(t.source).line;
    let heading = source_line.tangent_rad() + std::f64::consts::PI;
    let dir = -source_line.direction().normalize();
    let pose_point = t.path.front() + dir * state.params.turning_straight_segment();
    poses.push(Pose::new(pose_point, heading));
}

/// Emit a short pivot stub between the last emitted pose and `target_pt`,
/// offset `stub_len` past `target_pt` along the direction of travel toward
/// it.
fn extend_with_straight_turning_segment(poses: &mut Vec<Pose>, target_pt: Point2<f64>, stub_len: f64) {
    let prev = poses
        .last()
        .expect("at least the first node's pose has already been emitted")
        .position;
    let dir = target_pt - prev;
    let heading = atan2_of(dir);
    let unit = if dir.norm() > 0.0 {
        dir / dir.norm()
    } else {
        dir
    };
    poses.push(Pose::new(target_pt + unit * stub_len, heading));
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::PlannerParams;
    use crate::course::CourseGraph;
    use crate::geometry::{Line, Polyline};
    use crate::search::SearchReport;

    fn straight(x0: f64, y0: f64, x1: f64, y1: f64) -> Line {
        Line::new(Point2::new(x0, y0), Point2::new(x1, y1))
    }

    #[test]
    fn same_segment_emits_just_the_two_anchors() {
        let mut graph = CourseGraph::new();
        let s = graph.add_segment(straight(0.0, 0.0, 10.0, 0.0));
        let params = PlannerParams::default();

        let state = SearchState::new(
            &graph,
            &params,
            s,
            s,
            Point2::new(2.0, 0.0),
            Point2::new(7.0, 0.0),
        );

        let poses = reconstruct(&state, &[]);
        assert_eq!(poses.len(), 2);
        assert_eq!(poses[0].position, Point2::new(2.0, 0.0));
        assert_eq!(poses[1].position, Point2::new(7.0, 0.0));
        assert_eq!(poses[0].heading_rad, 0.0);
        assert_eq!(poses[1].heading_rad, 0.0);
    }

    #[test]
    fn two_segment_forward_reaches_goal() {
        let mut graph = CourseGraph::new();
        let s1 = graph.add_segment(straight(0.0, 0.0, 5.0, 0.0));
        let s2 = graph.add_segment(straight(5.0, 1.0, 10.0, 1.0));
        graph.add_transition(
            s1,
            s2,
            Polyline::new(vec![
                Point2::new(5.0, 0.0),
                Point2::new(5.0, 0.5),
                Point2::new(5.0, 1.0),
            ]),
        );

        let params = PlannerParams::default();
        let mut state = SearchState::new(
            &graph,
            &params,
            s1,
            s2,
            Point2::new(1.0, 0.0),
            Point2::new(9.0, 1.0),
        );

        let mut report = SearchReport::default();
        let chain = state.run(&mut report).expect("a path should be found");
        let poses = reconstruct(&state, &chain);

        assert!(poses.iter().any(|p| p.position == Point2::new(1.0, 0.0)));
        assert!(poses.iter().any(|p| p.position == Point2::new(9.0, 1.0)));
        assert!(poses
            .iter()
            .any(|p| p.position == Point2::new(5.0, 0.5)));
    }
}
