//! Error types for the solver.

use thiserror::Error;

/// Which optimization phase an iteration cap was hit in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Phase I — repairing infeasible restricted rows (`enforce_bfs`).
    One,
    /// Phase II — minimizing the goal row (`optimize`).
    Two,
}

/// Errors the solver can report.
///
/// These are all "best effort" errors: by the time one of these is
/// returned, [`crate::System::minimize`] has already run `compute_values`
/// and populated every key variable's computed value from whatever state
/// the tableau reached. Callers should still call `value_for` after a
/// non-`Ok` result — the system does not roll back partial pivots.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SolverError {
    /// Phase I terminated with at least one restricted row whose key's
    /// constant is still negative.
    #[error("system remains infeasible after phase I; computed values are a best-effort result")]
    Infeasible,

    /// Phase I or Phase II exceeded the configured iteration cap before
    /// converging.
    #[error("iteration cap exceeded during phase {phase:?}; computed values are a best-effort result")]
    IterationLimit {
        /// Which phase hit the cap.
        phase: Phase,
    },

    /// A constraint referenced a variable id that isn't live in this system.
    #[error("variable id {0} is not known to this system")]
    UnknownVariable(u32),
}
