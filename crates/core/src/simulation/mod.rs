//! Simulations assembled from the stencil stages
//!
//! - [`FluidSimulation`]: stable-fluids smoke (diffuse, project, advect)
//! - [`EquilibriumSolver`]: explicit heat diffusion run until it settles
//! - [`HeatMap`]: per-frame heat painting with diffusion and cooling
//! - [`Ripple`]: damped two-buffer wave surface
//!
//! Each instance owns its fields exclusively and picks its backend once, at
//! construction, from the configured [`ExecutionMode`](crate::solver::ExecutionMode).

mod equilibrium;
mod fluid;
mod heat_map;
mod ripple;

pub use equilibrium::{ConvergenceResult, EquilibriumSolver, IterationReport};
pub use fluid::{FluidSimulation, FluidStats};
pub use heat_map::HeatMap;
pub use ripple::Ripple;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of the fluid stepper inside one time step
///
/// Every step runs `Idle → Diffusing → Projecting → Advecting → Projecting →
/// Diffusing → Advecting → Settled`. A completed step rests in `Settled`;
/// the next step starts from there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StepPhase {
    /// No step has run since construction or the last resize
    #[default]
    Idle,
    /// Implicit diffusion of velocity or density
    Diffusing,
    /// Pressure projection of the velocity
    Projecting,
    /// Semi-Lagrangian transport of velocity or density
    Advecting,
    /// Step complete, fields ready to read
    Settled,
}

impl StepPhase {
    /// Whether the stepper is between steps (resizing is allowed)
    pub fn is_at_rest(self) -> bool {
        matches!(self, Self::Idle | Self::Settled)
    }
}

impl fmt::Display for StepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Diffusing => "diffusing",
            Self::Projecting => "projecting",
            Self::Advecting => "advecting",
            Self::Settled => "settled",
        };
        f.write_str(name)
    }
}
