//! # Search core
//!
//! A relaxed Dijkstra search over a node set derived from transitions, with
//! a direction-aware edge cost combining straight-line length along the
//! segment, a backward-motion multiplier, and turning penalties.
//!
//! Dijkstra's usual invariant - a popped node is final - does not hold here,
//! because the cost of travelling along a segment depends on the *effective
//! direction* the vehicle arrived in, which is only known once a particular
//! predecessor is chosen. So nodes are re-opened (re-relaxed and re-pushed)
//! whenever a cheaper predecessor is found, rather than relying on a pop
//! being terminal.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use log::{trace, warn};
use nalgebra::Point2;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::config::PlannerParams;
use crate::course::{CourseGraph, Segment, SegmentId, Transition, TransitionId};

// ---------------------------------------------------------------------------
// IDS
// ---------------------------------------------------------------------------

/// Stable arena index of a [`Node`] within a [`SearchState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The search-space vertex: one directed traversal of a [`Transition`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub transition: TransitionId,

    /// `true` if traversing `transition.path` from first to last (this node
    /// was reached via its source segment's `forward_transitions`), `false`
    /// if last to first (`backward_transitions`).
    pub curve_forward: bool,

    /// The segment the vehicle is on after traversing this node.
    pub next_segment: SegmentId,

    /// Best-known cumulative cost from start to this node.
    pub cost: f64,

    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
}

/// Per-`find_path`-call mutable search state. Owns every [`Node`]; never
/// outlives the call that created it.
pub struct SearchState<'g> {
    pub graph: &'g CourseGraph,
    pub params: &'g PlannerParams,

    pub start_segment: SegmentId,
    pub end_segment: SegmentId,
    pub start_pt: Point2<f64>,
    pub end_pt: Point2<f64>,

    nodes: Vec<Node>,
    index: HashMap<(TransitionId, bool), NodeId>,

    pub min_cost: f64,
}

/// A diagnostic summary of one search, returned alongside the reconstructed
/// middle section by [`crate::planner::CoursePlanner::find_path_with_report`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchReport {
    pub num_nodes: usize,
    pub num_relaxations: usize,
    pub reached_goal: bool,
    pub winning_cost: Option<f64>,
}

/// An entry in the priority queue: ordered first by ascending cost, then by
/// `NodeId` as a stable tie-break so the ordering is a strict total order
/// and the queue cannot silently drop one of two equal-cost nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueueEntry {
    cost: OrderedFloat<f64>,
    id: NodeId,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Flipped so that `BinaryHeap`, a max-heap, behaves as a min-heap.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'g> SearchState<'g> {
    /// Build the node set: every transition is enumerated twice, once as a
    /// forward node and once as a backward node.
    pub fn new(
        graph: &'g CourseGraph,
        params: &'g PlannerParams,
        start_segment: SegmentId,
        end_segment: SegmentId,
        start_pt: Point2<f64>,
        end_pt: Point2<f64>,
    ) -> Self {
        let mut nodes = Vec::with_capacity(graph.num_transitions() * 2);
        let mut index = HashMap::with_capacity(graph.num_transitions() * 2);

        for tid in graph.transitions() {
            let t = graph.transition(tid);

            let fwd_id = NodeId(nodes.len());
            nodes.push(Node {
                transition: tid,
                curve_forward: true,
                next_segment: t.target,
                cost: f64::INFINITY,
                prev: None,
                next: None,
            });
            index.insert((tid, true), fwd_id);

            let bwd_id = NodeId(nodes.len());
            nodes.push(Node {
                transition: tid,
                curve_forward: false,
                next_segment: t.source,
                cost: f64::INFINITY,
                prev: None,
                next: None,
            });
            index.insert((tid, false), bwd_id);
        }

        Self {
            graph,
            params,
            start_segment,
            end_segment,
            start_pt,
            end_pt,
            nodes,
            index,
            min_cost: f64::INFINITY,
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn node_id_for(&self, transition: TransitionId, curve_forward: bool) -> NodeId {
        self.index[&(transition, curve_forward)]
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    // -----------------------------------------------------------------
    // Entry/exit points on segments
    // -----------------------------------------------------------------

    /// Where the vehicle must arrive to enter arc `t`, given that it will be
    /// entered the way `node` enters it.
    pub(crate) fn find_end_point_on_segment(&self, node: &Node, t: &Transition) -> Point2<f64> {
        if node.curve_forward {
            t.path.front()
        } else {
            t.path.back()
        }
    }

    /// Where node `id`'s curve deposits the vehicle - the start of the
    /// following straight stretch on `next_segment`.
    pub(crate) fn find_start_point_on_next_segment(&self, id: NodeId) -> Point2<f64> {
        let node = self.node(id);
        if node.next_segment == self.start_segment {
            return self.start_pt;
        }
        let t = self.graph.transition(node.transition);
        if node.curve_forward {
            t.path.back()
        } else {
            t.path.front()
        }
    }

    /// Where the straight stretch following node `id` ends - either the
    /// goal anchor, the entry point of whatever transition comes next, or
    /// (for a node with no assigned successor) the far end of its segment.
    pub(crate) fn find_end_point_on_next_segment(&self, id: NodeId) -> Point2<f64> {
        let node = self.node(id);
        if node.next_segment == self.end_segment {
            return self.end_pt;
        }
        match node.next {
            Some(next_id) => {
                let next_node = self.node(next_id);
                let t = self.graph.transition(next_node.transition);
                self.find_end_point_on_segment(next_node, t)
            }
            None => {
                let segment = self.graph.segment(node.next_segment);
                if node.curve_forward {
                    segment.line.end_point()
                } else {
                    segment.line.start_point()
                }
            }
        }
    }

    // -----------------------------------------------------------------
    // Directionality helpers
    // -----------------------------------------------------------------

    fn is_segment_forward(segment: &Segment, from: Point2<f64>, to: Point2<f64>) -> bool {
        let delta = to - from;
        if delta.norm() < 0.1 {
            warn!(
                "short displacement ({:.4} m) while testing segment direction; \
                 directionality is ill-defined here",
                delta.norm()
            );
        }
        segment.line.direction().dot(&delta) >= 0.0
    }

    pub(crate) fn is_start_segment_forward(&self, id: NodeId) -> bool {
        let node = self.node(id);
        let t = self.graph.transition(node.transition);
        let entry = self.find_end_point_on_segment(node, t);
        Self::is_segment_forward(self.graph.segment(self.start_segment), self.start_pt, entry)
    }

    pub(crate) fn is_next_segment_forward(&self, id: NodeId) -> bool {
        let node = self.node(id);
        let s = self.find_start_point_on_next_segment(id);
        let e = self.find_end_point_on_next_segment(id);
        Self::is_segment_forward(self.graph.segment(node.next_segment), s, e)
    }

    fn is_previous_segment_forward(&self, id: NodeId) -> bool {
        match self.node(id).prev {
            Some(prev_id) => self.is_next_segment_forward(prev_id),
            None => self.is_start_segment_forward(id),
        }
    }

    // -----------------------------------------------------------------
    // Cost functions
    // -----------------------------------------------------------------

    fn curve_cost(&self, id: NodeId) -> f64 {
        let node = self.node(id);
        let t = self.graph.transition(node.transition);
        if node.curve_forward {
            t.arc_length
        } else {
            self.params.backward_penalty_factor() * t.arc_length
        }
    }

    /// Cost of a straight traversal of `segment` from `s` to `e`, given the
    /// effective direction of the segment traversal that preceded it
    /// (`prev_forward`) and the direction the upcoming curve is entered in
    /// (`curve_forward`).
    fn straight_cost(
        &self,
        segment_id: SegmentId,
        s: Point2<f64>,
        e: Point2<f64>,
        prev_forward: bool,
        curve_forward: bool,
    ) -> f64 {
        let segment = self.graph.segment(segment_id);
        let segment_forward = Self::is_segment_forward(segment, s, e);

        let dist = (e - s).norm();
        let base = if segment_forward {
            dist
        } else {
            self.params.backward_penalty_factor() * dist
        };

        let turn_unit = self.params.turning_straight_segment() + self.params.turning_penalty();
        let turn = if prev_forward != segment_forward {
            turn_unit
        } else if curve_forward != segment_forward {
            2.0 * turn_unit
        } else {
            0.0
        };

        base + turn
    }

    // -----------------------------------------------------------------
    // Initialisation
    // -----------------------------------------------------------------

    /// Seed the priority queue with every transition leaving `start_segment`.
    fn enqueue_starting_nodes(&mut self, heap: &mut BinaryHeap<QueueEntry>) {
        let forward: Vec<TransitionId> =
            self.graph.segment(self.start_segment).forward_transitions.clone();
        let backward: Vec<TransitionId> =
            self.graph.segment(self.start_segment).backward_transitions.clone();

        for tid in forward {
            self.try_seed(heap, tid, true);
        }
        for tid in backward {
            self.try_seed(heap, tid, false);
        }
    }

    fn try_seed(&mut self, heap: &mut BinaryHeap<QueueEntry>, tid: TransitionId, curve_forward: bool) {
        let id = self.node_id_for(tid, curve_forward);
        let t = self.graph.transition(tid);
        let entry = if curve_forward { t.path.front() } else { t.path.back() };
        let prev_forward = self.is_start_segment_forward(id);

        let cost = self.straight_cost(
            self.start_segment,
            self.start_pt,
            entry,
            prev_forward,
            curve_forward,
        );

        if cost < self.node(id).cost {
            self.node_mut(id).cost = cost;
            heap.push(QueueEntry {
                cost: OrderedFloat(cost),
                id,
            });
        }
    }

    // -----------------------------------------------------------------
    // Main loop and candidate finalisation
    // -----------------------------------------------------------------

    /// Run the search to completion. Returns `true` if at least one
    /// candidate reaching `end_segment` was found (`min_cost` is then
    /// finite and the winning chain's nodes have their `next` pointers set).
    pub fn run(&mut self, report: &mut SearchReport) -> Option<Vec<NodeId>> {
        let mut heap = BinaryHeap::new();
        self.enqueue_starting_nodes(&mut heap);

        let mut winning_chain: Option<Vec<NodeId>> = None;

        while let Some(QueueEntry { cost, id }) = heap.pop() {
            // Lazy deletion: this entry may be stale if the node was
            // relaxed again (cheaper) after this entry was pushed.
            if cost.into_inner() > self.node(id).cost {
                continue;
            }

            report.num_nodes += 1;

            if self.node(id).next_segment == self.end_segment {
                if let Some(chain) = self.finalise_candidate(id) {
                    winning_chain = Some(chain);
                    report.reached_goal = true;
                    report.winning_cost = Some(self.min_cost);
                }
                continue;
            }

            self.relax_neighbours(id, &mut heap, report);
        }

        trace!(
            "search finished: {} nodes popped, {} relaxations, reached_goal={}",
            report.num_nodes,
            report.num_relaxations,
            report.reached_goal
        );

        winning_chain
    }

    fn relax_neighbours(&mut self, u_id: NodeId, heap: &mut BinaryHeap<QueueEntry>, report: &mut SearchReport) {
        let next_segment = self.node(u_id).next_segment;
        let forward: Vec<TransitionId> =
            self.graph.segment(next_segment).forward_transitions.clone();
        let backward: Vec<TransitionId> =
            self.graph.segment(next_segment).backward_transitions.clone();

        let s = self.find_start_point_on_next_segment(u_id);
        let prev_forward = self.is_previous_segment_forward(u_id);
        let curve_forward = self.node(u_id).curve_forward;
        let curve_cost = self.curve_cost(u_id);
        let u_cost = self.node(u_id).cost;

        for (tid, is_forward) in forward
            .into_iter()
            .map(|t| (t, true))
            .chain(backward.into_iter().map(|t| (t, false)))
        {
            let v_id = self.node_id_for(tid, is_forward);
            let t = self.graph.transition(tid);
            let e = self.find_end_point_on_segment(self.node(v_id), t);

            let new_cost = u_cost
                + curve_cost
                + self.straight_cost(next_segment, s, e, prev_forward, curve_forward);

            report.num_relaxations += 1;

            if new_cost < self.node(v_id).cost {
                self.node_mut(v_id).prev = Some(u_id);
                self.node_mut(u_id).next = Some(v_id);
                self.node_mut(v_id).cost = new_cost;
                heap.push(QueueEntry {
                    cost: OrderedFloat(new_cost),
                    id: v_id,
                });
            }
        }
    }

    /// Evaluate node `u` (whose `next_segment == end_segment`) as a
    /// terminal candidate. Returns the winning head-to-tail chain if `u`
    /// beats the current best.
    fn finalise_candidate(&mut self, u_id: NodeId) -> Option<Vec<NodeId>> {
        let s = self.find_start_point_on_next_segment(u_id);
        let prev_forward = self.is_previous_segment_forward(u_id);
        let curve_forward = self.node(u_id).curve_forward;

        let final_straight = self.straight_cost(
            self.end_segment,
            s,
            self.end_pt,
            prev_forward,
            curve_forward,
        );

        // `node.cost` itself is left untouched - it is the raw search cost
        // used by relaxation and must stay comparable across repeated
        // finalisation attempts if a cheaper predecessor to `u` is found
        // later. `u`'s own curve still has to be traversed to reach
        // `end_segment`, so its cost is added here rather than baked into
        // `node.cost`, mirroring how `relax_neighbours` adds it when `u` is
        // not the last hop.
        let total = self.node(u_id).cost + self.curve_cost(u_id) + final_straight;

        if total >= self.min_cost {
            return None;
        }
        self.min_cost = total;

        // Walk back via `prev`, rewriting `prev.next = self` along the way
        // so the chain is internally consistent regardless of what each
        // node's `next` held from earlier, unrelated relaxations.
        let mut chain = vec![u_id];
        let mut cur = u_id;
        while let Some(p) = self.node(cur).prev {
            self.node_mut(p).next = Some(cur);
            chain.push(p);
            cur = p;
        }
        chain.reverse();

        Some(chain)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::course::CourseGraph;
    use crate::geometry::{Line, Polyline};

    fn straight(x0: f64, y0: f64, x1: f64, y1: f64) -> Line {
        Line::new(Point2::new(x0, y0), Point2::new(x1, y1))
    }

    /// `a` and `b` joined by a transition whose arc runs `a`'s far end to
    /// `b`'s near end; only used to give `curve_cost` a real `arc_length` to
    /// read, the state's own start/end points are irrelevant to these tests.
    fn two_segment_fixture() -> (CourseGraph, TransitionId, SegmentId, SegmentId) {
        let mut graph = CourseGraph::new();
        let a = graph.add_segment(straight(0.0, 0.0, 5.0, 0.0));
        let b = graph.add_segment(straight(10.0, 0.0, 15.0, 0.0));
        let t = graph.add_transition(
            a,
            b,
            Polyline::new(vec![
                Point2::new(5.0, 0.0),
                Point2::new(7.5, 0.0),
                Point2::new(10.0, 0.0),
            ]),
        );
        (graph, t, a, b)
    }

    #[test]
    fn curve_cost_applies_backward_penalty_only_when_reversed() {
        let (graph, t, a, b) = two_segment_fixture();
        let params = PlannerParams::default();
        let state = SearchState::new(
            &graph,
            &params,
            a,
            b,
            Point2::new(1.0, 0.0),
            Point2::new(11.0, 0.0),
        );

        let forward_id = state.node_id_for(t, true);
        let backward_id = state.node_id_for(t, false);

        // arc_length is 2.5 + 2.5 = 5.0.
        assert_eq!(state.curve_cost(forward_id), 5.0);
        assert_eq!(state.curve_cost(backward_id), 2.5 * 5.0);
    }

    #[test]
    fn straight_cost_adds_a_single_turn_when_only_the_approach_direction_flips() {
        let (graph, _t, a, _b) = two_segment_fixture();
        let params = PlannerParams::default();
        let state = SearchState::new(
            &graph,
            &params,
            a,
            a,
            Point2::new(1.0, 0.0),
            Point2::new(4.0, 0.0),
        );

        // Travelling (1,0) -> (4,0) is forward along `a` (+x). Declaring the
        // approach (`prev_forward`) as backward, with the upcoming curve
        // entered forward (matching this straight run), should cost exactly
        // one turning stub on top of the plain distance.
        let turn_unit = params.turning_straight_segment() + params.turning_penalty();
        let cost = state.straight_cost(a, Point2::new(1.0, 0.0), Point2::new(4.0, 0.0), false, true);

        assert_eq!(cost, 3.0 + turn_unit);
    }

    #[test]
    fn straight_cost_adds_a_double_turn_when_only_the_curve_direction_flips() {
        let (graph, _t, a, _b) = two_segment_fixture();
        let params = PlannerParams::default();
        let state = SearchState::new(
            &graph,
            &params,
            a,
            a,
            Point2::new(1.0, 0.0),
            Point2::new(4.0, 0.0),
        );

        // Same straight run, but now the approach direction matches it and
        // only the upcoming curve's direction disagrees - that is a pivot
        // before *and* after the straight run, so it costs two stubs.
        let turn_unit = params.turning_straight_segment() + params.turning_penalty();
        let cost = state.straight_cost(a, Point2::new(1.0, 0.0), Point2::new(4.0, 0.0), true, false);

        assert_eq!(cost, 3.0 + 2.0 * turn_unit);
    }

    #[test]
    fn straight_cost_adds_nothing_when_direction_is_unbroken() {
        let (graph, _t, a, _b) = two_segment_fixture();
        let params = PlannerParams::default();
        let state = SearchState::new(
            &graph,
            &params,
            a,
            a,
            Point2::new(1.0, 0.0),
            Point2::new(4.0, 0.0),
        );

        let cost = state.straight_cost(a, Point2::new(1.0, 0.0), Point2::new(4.0, 0.0), true, true);
        assert_eq!(cost, 3.0);
    }

    /// A full reversing manoeuvre: both straight legs and the connecting
    /// curve are driven backward, but the direction never flips along the
    /// way, so the only cost beyond plain distance is the backward penalty
    /// on every leg - no turning stubs anywhere.
    #[test]
    fn run_prices_an_unbroken_reversing_path_as_backward_penalty_on_every_leg() {
        let mut graph = CourseGraph::new();
        // Declared directions point the "wrong" way on purpose: the whole
        // manoeuvre drives against both lines' declared directions, with no
        // actual change of direction along the way.
        let s1 = graph.add_segment(straight(5.0, 0.0, 0.0, 0.0));
        let s2 = graph.add_segment(straight(15.0, 0.0, 10.0, 0.0));
        let t = graph.add_transition(
            s2,
            s1,
            Polyline::new(vec![
                Point2::new(10.0, 0.0),
                Point2::new(7.5, 0.0),
                Point2::new(5.0, 0.0),
            ]),
        );

        let params = PlannerParams::default();
        let mut state = SearchState::new(
            &graph,
            &params,
            s1,
            s2,
            Point2::new(1.0, 0.0),
            Point2::new(14.0, 0.0),
        );

        let mut report = SearchReport::default();
        let chain = state.run(&mut report).expect("a path should be found");

        assert_eq!(chain.len(), 1);
        assert!(!state.node(chain[0]).curve_forward);
        assert_eq!(state.node(chain[0]).transition, t);

        // straight(s1) = 2.5 * 4.0, arc(t) = 2.5 * 5.0, straight(s2) = 2.5 * 4.0.
        assert_eq!(report.winning_cost, Some(10.0 + 12.5 + 10.0));
    }
}
