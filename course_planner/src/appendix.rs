//! # Appendix resolution
//!
//! Bridges a free pose (not lying on any course segment) to the nearest
//! segment anchor. The bridging pose sequence - the "appendix" - is produced
//! by an external footprint-aware grid search that this crate only consumes
//! through [`MapProvider`] and [`AppendixSolver`]; building the occupancy
//! grid or running A* over it is out of scope here.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::error::PlannerError;
use crate::geometry::Pose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A coarse occupancy grid, as produced by [`MapProvider::get`]. Each cell is
/// `-1` (unknown) or a probability in `[0, 100]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccupancyGrid {
    pub width: usize,
    pub height: usize,
    pub resolution: f64,
    pub origin: Pose,
    pub cells: Vec<i8>,
}

impl OccupancyGrid {
    pub fn new(width: usize, height: usize, resolution: f64, origin: Pose, cells: Vec<i8>) -> Self {
        assert_eq!(
            cells.len(),
            width * height,
            "occupancy grid cell count must equal width * height"
        );
        Self {
            width,
            height,
            resolution,
            origin,
            cells,
        }
    }

    pub fn cell(&self, x: usize, y: usize) -> i8 {
        self.cells[y * self.width + x]
    }
}

/// Which anchor an appendix is being resolved for, purely for error
/// reporting and solver-side symmetry (the `"end"` appendix is reversed by
/// the caller before use, per the source's convention).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorRole {
    Start,
    End,
}

impl AnchorRole {
    pub fn as_str(self) -> &'static str {
        match self {
            AnchorRole::Start => "start",
            AnchorRole::End => "end",
        }
    }
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Supplies the occupancy grid the appendix solvers search over. Kept
/// separate from the solvers themselves so map retrieval failures are
/// distinguishable from appendix-reachability failures.
pub trait MapProvider {
    fn get(&self) -> Result<OccupancyGrid, PlannerError>;
}

/// One footprint-aware grid-search strategy from a free `pose` to a pose
/// lying on (or very near) a course segment. Implementations return `None`
/// rather than erroring when they cannot reach any segment - the planner
/// tries the next solver in its ordered list before giving up.
pub trait AppendixSolver {
    fn solve(&self, map: &OccupancyGrid, pose: Pose, role: AnchorRole) -> Option<Vec<Pose>>;
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Try each solver in `solvers` in order (forward-only before
/// forward-with-turning, by convention of how the caller orders its list)
/// and return the first non-empty result. The `"end"` role's result is
/// reversed before being handed back, since appendix solvers always search
/// *from* the free pose, but the end appendix must read free-pose-last.
pub fn resolve_appendix(
    solvers: &[Box<dyn AppendixSolver>],
    map: &OccupancyGrid,
    pose: Pose,
    role: AnchorRole,
) -> Result<Vec<Pose>, PlannerError> {
    for solver in solvers {
        if let Some(mut path) = solver.solve(map, pose, role) {
            if path.is_empty() {
                continue;
            }
            if role == AnchorRole::End {
                path.reverse();
            }
            return Ok(path);
        }
    }

    Err(PlannerError::AppendixUnreachable {
        role: role.as_str(),
    })
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
