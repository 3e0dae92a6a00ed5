//! # Course planner library
//!
//! Plans poses connecting a start and end pose, constrained in the middle to
//! a pre-built network of straight [`course::Segment`]s joined by curved
//! [`course::Transition`]s, with free-form maneuvers at each end supplied by
//! an external footprint-aware grid search (the "appendix").
//!
//! The planner itself ([`planner::CoursePlanner`]) never builds the course
//! graph or loads the occupancy grid - those are external collaborators,
//! modelled here as the [`course::CourseGraph`], [`appendix::MapProvider`]
//! and [`appendix::AppendixSolver`] traits (see [`appendix`]). What this
//! crate owns is the cost-minimising graph search over the segment/
//! transition network ([`search`]) and the trajectory reconstruction that
//! stitches segment stretches, transition arcs and turning maneuvers back
//! into a dense pose sequence ([`reconstruct`]).

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod appendix;
pub mod config;
pub mod course;
pub mod error;
pub mod geometry;
pub mod planner;
pub mod reconstruct;
pub mod search;

// ---------------------------------------------------------------------------
// REEXPORTS
// ---------------------------------------------------------------------------

pub use config::PlannerParams;
pub use error::PlannerError;
pub use geometry::Pose;
pub use planner::CoursePlanner;
