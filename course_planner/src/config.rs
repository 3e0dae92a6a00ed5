//! # Planner configuration
//!
//! Scalar parameters read once at planner construction, loaded with
//! [`util::params::load`] from a flat `course_planner.toml` next to the
//! binary's working directory (the same layout `cam_exec.toml` and
//! `mech_exec.toml` use for their own executables), laid out the same way
//! the keys are grouped in the table below.
//!
//! | Key | Default | Effect |
//! |---|---|---|
//! | `size.forward` | `0.4` | vehicle footprint forward extent (used only by the external footprint check) |
//! | `size.backward` | `-0.6` | footprint backward extent |
//! | `size.width` | `0.5` | footprint width |
//! | `course.penalty.backwards` | `2.5` | multiplier on distance/arc cost when traversed in reverse |
//! | `course.penalty.turn` | `5.0` | fixed cost added per required direction change |
//! | `course.turning.straight` | `0.7` | length of the straight pivot stub emitted on direction changes |

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Vehicle footprint extents, consumed only by the external footprint-aware
/// grid search - the planner's own search and reconstruction never read
/// these, but they travel with the rest of the parameter file since they
/// share its lifecycle.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SizeParams {
    pub forward: f64,
    pub backward: f64,
    pub width: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PenaltyParams {
    /// Multiplier applied to distance/arc-length cost when traversed in
    /// reverse. Must be `>= 1.0` for the cost-monotonicity invariant to hold.
    pub backwards: f64,

    /// Fixed cost added per required direction change.
    pub turn: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TurningParams {
    /// Length, in metres, of the straight pivot stub emitted on direction
    /// changes.
    pub straight: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CourseParams {
    pub penalty: PenaltyParams,
    pub turning: TurningParams,
}

/// Top-level planner parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PlannerParams {
    pub size: SizeParams,
    pub course: CourseParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SizeParams {
    fn default() -> Self {
        Self {
            forward: 0.4,
            backward: -0.6,
            width: 0.5,
        }
    }
}

impl Default for PenaltyParams {
    fn default() -> Self {
        Self {
            backwards: 2.5,
            turn: 5.0,
        }
    }
}

impl Default for TurningParams {
    fn default() -> Self {
        Self { straight: 0.7 }
    }
}

impl Default for CourseParams {
    fn default() -> Self {
        Self {
            penalty: PenaltyParams::default(),
            turning: TurningParams::default(),
        }
    }
}

impl Default for PlannerParams {
    fn default() -> Self {
        Self {
            size: SizeParams::default(),
            course: CourseParams::default(),
        }
    }
}

impl PlannerParams {
    pub fn backward_penalty_factor(&self) -> f64 {
        self.course.penalty.backwards
    }

    pub fn turning_penalty(&self) -> f64 {
        self.course.penalty.turn
    }

    pub fn turning_straight_segment(&self) -> f64 {
        self.course.turning.straight
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let p = PlannerParams::default();
        assert_eq!(p.size.forward, 0.4);
        assert_eq!(p.size.backward, -0.6);
        assert_eq!(p.size.width, 0.5);
        assert_eq!(p.backward_penalty_factor(), 2.5);
        assert_eq!(p.turning_penalty(), 5.0);
        assert_eq!(p.turning_straight_segment(), 0.7);
    }

    #[test]
    fn deserialises_from_toml() {
        let toml_str = r#"
            [size]
            forward = 0.4
            backward = -0.6
            width = 0.5

            [course.penalty]
            backwards = 2.5
            turn = 5.0

            [course.turning]
            straight = 0.7
        "#;

        let params: PlannerParams = toml::from_str(toml_str).unwrap();
        assert_eq!(params.backward_penalty_factor(), 2.5);
    }
}
