//! Course planner executable entry point.
//!
//! Initialises logging and a session, loads [`PlannerParams`] from the
//! bundled configuration file, and hands control to library code.
//! `MapProvider`/`AppendixSolver` implementations are external collaborators
//! (see `appendix.rs`) and are not constructed here.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use color_eyre::{eyre::WrapErr, Result};
use log::info;

// Internal
use course_planner::PlannerParams;
use util::logger::{logger_init, LevelFilter};
use util::session::Session;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    let session = Session::new("course_planner", "sessions")
        .wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Trace, &session)
        .wrap_err("Failed to initialise logging")?;

    let params: PlannerParams = util::params::load("course_planner.toml")
        .unwrap_or_else(|e| {
            log::warn!(
                "Could not load course_planner.toml ({:?}), using defaults",
                e
            );
            PlannerParams::default()
        });

    info!(
        "Course planner ready: backward_penalty_factor={}, turning_penalty={}",
        params.backward_penalty_factor(),
        params.turning_penalty()
    );

    Ok(())
}
