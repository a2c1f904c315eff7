//! Fluid Simulation Core Library
//!
//! A grid-based PDE engine implementing the stable-fluids method: implicit
//! diffusion by relaxation, semi-Lagrangian advection and pressure projection
//! on a square grid with reflective walls. Every stencil pass runs on either a
//! single-threaded backend (in-place Gauss-Seidel sweeps, bit-reproducible) or
//! a rayon data-parallel backend (one kernel invocation per cell, Jacobi
//! sweeps).
//!
//! ## Simulations
//!
//! - [`FluidSimulation`]: smoke density carried by an incompressible velocity field
//! - [`EquilibriumSolver`]: explicit heat diffusion iterated until it settles
//! - [`HeatMap`]: per-frame heat painting with diffusion and cooling
//! - [`Ripple`]: damped wave surface
//!
//! ## Example
//!
//! ```rust
//! use fluid_sim_core::{FluidConfig, FluidSimulation};
//!
//! let mut sim = FluidSimulation::new(FluidConfig {
//!     resolution: 32,
//!     ..FluidConfig::default()
//! })?;
//! sim.add_density((16, 16), 1.0);
//! sim.add_force((16, 16), (0.0, -1.0));
//! sim.step()?;
//! assert!(sim.total_density() > 0.0);
//! # Ok::<(), fluid_sim_core::SolverError>(())
//! ```

// Configuration and errors
pub mod config;
pub mod error;

// Simulations built on the solver stages
pub mod simulation;

// Fields, boundary rules, kernels and backends
pub mod solver;

// Re-export configuration
pub use config::{
    EquilibriumConfig, FluidConfig, HeatMapConfig, PressureStencil, RippleConfig,
    DEFAULT_EPSILON, DEFAULT_ITERATIONS, MIN_RESOLUTION,
};
pub use error::{Result, SolverError};

// Re-export simulations
pub use simulation::{
    ConvergenceResult, EquilibriumSolver, FluidSimulation, FluidStats, HeatMap, IterationReport,
    Ripple, StepPhase,
};

// Re-export solver building blocks
pub use solver::{
    create_backend, BoundaryKind, ExecutionMode, Field, FieldKind, RelaxationParams,
    StencilBackend,
};
