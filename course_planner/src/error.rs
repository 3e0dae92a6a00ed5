//! # Planner error types
//!
//! One flat enum covering the externally-visible failure modes of
//! [`crate::planner::CoursePlanner::find_path`], in the order they can be
//! hit (map retrieval, appendix resolution, closest-segment lookup). Every
//! variant corresponds to an empty-path return per spec - the caller learns
//! *why* through the log, not through a non-empty error path, so these are
//! logged at `error!` by the planner before it returns `Vec::new()`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("Could not retrieve the occupancy grid from the map provider")]
    MapUnavailable,

    #[error("No appendix solver could reach a segment from the {role} pose")]
    AppendixUnreachable { role: &'static str },

    #[error("No course segment within tolerance of the {role} anchor")]
    NoClosestSegment { role: &'static str },
}
