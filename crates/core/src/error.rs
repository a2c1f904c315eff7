//! Error type shared by every solver entry point
//!
//! Field operations themselves are infallible once a simulation has been
//! constructed; errors only surface at configuration time, at the end of a
//! step (sanity check), and from the equilibrium convergence loop.

use crate::simulation::StepPhase;
use crate::solver::FieldKind;
use std::fmt;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, SolverError>;

/// Errors reported by the fluid and equilibrium solvers.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    /// A configuration value is outside its valid range. Raised before any
    /// field operation runs.
    InvalidConfiguration {
        /// Name of the offending parameter (e.g. `"resolution"`, `"dt"`)
        parameter: &'static str,
        /// What the parameter must satisfy, including the rejected value
        reason: String,
    },

    /// The equilibrium loop hit its iteration cap before the residual fell
    /// below epsilon. The best-effort field is still readable on the solver.
    ConvergenceTimeout {
        /// Iterations performed
        iterations: usize,
        /// Max absolute change of the last iteration
        residual: f32,
    },

    /// A cell became NaN or infinite.
    ComputationDiverged {
        /// Field that failed the finiteness check
        field: FieldKind,
    },

    /// A resize was requested while a step was still running.
    StepInFlight {
        /// Phase the stepper was in
        phase: StepPhase,
    },

    /// The caller aborted the equilibrium loop between iterations.
    Interrupted {
        /// Iterations completed before the abort
        iterations: usize,
    },
}

impl SolverError {
    /// Create an `InvalidConfiguration` error.
    ///
    /// # Arguments
    /// * `parameter` - The name of the invalid parameter
    /// * `reason` - Description of the constraint and the rejected value
    pub fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            parameter,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfiguration { parameter, reason } => {
                write!(f, "invalid configuration: {parameter} {reason}")
            }
            Self::ConvergenceTimeout {
                iterations,
                residual,
            } => write!(
                f,
                "no convergence after {iterations} iterations (residual {residual:e})"
            ),
            Self::ComputationDiverged { field } => {
                write!(f, "computation diverged: non-finite value in {field} field")
            }
            Self::StepInFlight { phase } => {
                write!(f, "cannot resize while the stepper is {phase}")
            }
            Self::Interrupted { iterations } => {
                write!(f, "interrupted by caller after {iterations} iterations")
            }
        }
    }
}

impl std::error::Error for SolverError {}
