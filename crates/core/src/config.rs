//! Simulation configuration
//!
//! Every knob is a plain number or enum; there is no file format. Each config
//! has a `Default` tuned for interactive use and a `validate()` that fails
//! fast with [`SolverError::InvalidConfiguration`] before any field is
//! allocated.

use crate::error::{Result, SolverError};
use crate::solver::ExecutionMode;
use serde::{Deserialize, Serialize};

/// Smallest grid with at least one interior cell
pub const MIN_RESOLUTION: usize = 3;

/// Default relaxation sweeps per implicit solve
pub const DEFAULT_ITERATIONS: usize = 20;

/// Default equilibrium convergence threshold
pub const DEFAULT_EPSILON: f32 = 1e-5;

/// Thermal diffusivity of air (m²/s)
pub const AIR_THERMAL_DIFFUSIVITY: f32 = 1.9e-5;

/// Time step of the thermal-conductivity benchmark (s)
pub const THERMAL_DT: f32 = 0.01;

/// Centre weight used by the implicit solves
///
/// The 5-point Laplacian has four neighbours, so `FourNeighbor` gives
/// `c = 4` for the pressure solve and `c = 1 + 4a` for diffusion (mass
/// conserving). `SixNeighbor` uses `c = 6` / `c = 1 + 6a` with the same
/// four-neighbour sum; it under-relaxes the pressure and slowly drains
/// diffused mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PressureStencil {
    /// `c = 4` (true 5-point Laplacian)
    #[default]
    FourNeighbor,
    /// `c = 6` (legacy weighting)
    SixNeighbor,
}

impl PressureStencil {
    /// Centre weight `k` in `c = k` (pressure) and `c = 1 + k·a` (diffusion)
    #[must_use]
    pub const fn centre_weight(self) -> f32 {
        match self {
            Self::FourNeighbor => 4.0,
            Self::SixNeighbor => 6.0,
        }
    }
}

fn require_resolution(parameter: &'static str, value: usize) -> Result<()> {
    if value < MIN_RESOLUTION {
        return Err(SolverError::invalid(
            parameter,
            format!("must be at least {MIN_RESOLUTION}, got {value}"),
        ));
    }
    Ok(())
}

fn require_non_negative(parameter: &'static str, value: f32) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(SolverError::invalid(
            parameter,
            format!("must be finite and non-negative, got {value}"),
        ));
    }
    Ok(())
}

fn require_positive(parameter: &'static str, value: f32) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SolverError::invalid(
            parameter,
            format!("must be finite and positive, got {value}"),
        ));
    }
    Ok(())
}

fn require_unit_interval(parameter: &'static str, value: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(SolverError::invalid(
            parameter,
            format!("must lie in [0, 1], got {value}"),
        ));
    }
    Ok(())
}

/// Configuration of the stable-fluids smoke simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FluidConfig {
    /// Cells per side of the square grid (≥ 3)
    pub resolution: usize,

    /// Kinematic viscosity used when diffusing velocity
    pub viscosity: f32,

    /// Diffusion rate of the transported scalar
    pub diffusion: f32,

    /// Time step in seconds used by `step()`
    pub dt: f32,

    /// Multiplier applied to drag vectors by `add_force`
    pub force: f32,

    /// Radius in cells of density/velocity injections
    pub source_radius: f32,

    /// Relaxation sweeps per diffusion or pressure solve
    pub iterations: usize,

    /// Sequential (Gauss-Seidel) or data-parallel (Jacobi) execution
    pub mode: ExecutionMode,

    /// Centre weight of the implicit solves
    pub pressure_stencil: PressureStencil,
}

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            resolution: 128,
            viscosity: 0.0001,
            diffusion: 0.0001,
            dt: 1.0 / 60.0,
            force: 10.0,
            source_radius: 10.0,
            iterations: DEFAULT_ITERATIONS,
            mode: ExecutionMode::Sequential,
            pressure_stencil: PressureStencil::FourNeighbor,
        }
    }
}

impl FluidConfig {
    /// Check every parameter
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` naming the first offending parameter.
    pub fn validate(&self) -> Result<()> {
        require_resolution("resolution", self.resolution)?;
        require_non_negative("viscosity", self.viscosity)?;
        require_non_negative("diffusion", self.diffusion)?;
        require_positive("dt", self.dt)?;
        require_non_negative("force", self.force)?;
        require_non_negative("source_radius", self.source_radius)?;
        Ok(())
    }
}

/// Configuration of the convergence-driven heat equilibrium solver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquilibriumConfig {
    /// Cells per side of the square grid (≥ 3)
    pub grid_size: usize,

    /// Explicit diffusion number `r = α·dt/dx²`; the scheme is stable for
    /// `r ≤ 0.25`
    pub diffusion_coefficient: f32,

    /// Stop once the max per-cell change of one iteration is below this
    pub epsilon: f32,

    /// Safety valve against non-convergence. `None` loops until epsilon is
    /// reached, however long that takes.
    pub max_iterations: Option<usize>,

    /// Sequential or data-parallel execution
    pub mode: ExecutionMode,
}

impl Default for EquilibriumConfig {
    fn default() -> Self {
        Self {
            grid_size: 16,
            diffusion_coefficient: 0.1,
            epsilon: DEFAULT_EPSILON,
            max_iterations: Some(100_000),
            mode: ExecutionMode::Sequential,
        }
    }
}

impl EquilibriumConfig {
    /// Air heat-conduction benchmark on a unit square
    ///
    /// `r = α·dt/dx²` with `α = 1.9e-5 m²/s`, `dt = 0.01 s` and
    /// `dx = 1/(n - 1)`.
    #[must_use]
    pub fn air(grid_size: usize) -> Self {
        let dx = 1.0 / (grid_size.max(2) - 1) as f32;
        Self {
            grid_size,
            diffusion_coefficient: AIR_THERMAL_DIFFUSIVITY * THERMAL_DT / (dx * dx),
            ..Self::default()
        }
    }

    /// Check every parameter
    ///
    /// Coefficients above the stability limit are accepted; the iteration cap
    /// and the divergence check handle them at run time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` naming the first offending parameter.
    pub fn validate(&self) -> Result<()> {
        require_resolution("grid_size", self.grid_size)?;
        require_non_negative("diffusion_coefficient", self.diffusion_coefficient)?;
        require_positive("epsilon", self.epsilon)?;
        if self.max_iterations == Some(0) {
            return Err(SolverError::invalid(
                "max_iterations",
                "must be at least 1 when set, got 0",
            ));
        }
        Ok(())
    }
}

/// Configuration of the heat-painting map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatMapConfig {
    /// Grid width in cells (≥ 3)
    pub width: usize,

    /// Grid height in cells (≥ 3)
    pub height: usize,

    /// Brush radius in cells
    pub brush_size: f32,

    /// Heat added at the brush centre per stroke
    pub heat_intensity: f32,

    /// Explicit diffusion number per frame, in `[0, 0.25]` so the field stays
    /// non-negative
    pub diffusion_rate: f32,

    /// Fraction of heat lost per frame, in `[0, 1]`
    pub cooling_rate: f32,

    /// Sequential or data-parallel execution
    pub mode: ExecutionMode,
}

impl Default for HeatMapConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            brush_size: 20.0,
            heat_intensity: 0.1,
            diffusion_rate: 0.05,
            cooling_rate: 0.01,
            mode: ExecutionMode::Sequential,
        }
    }
}

impl HeatMapConfig {
    /// Upper bound on `diffusion_rate` for a stable explicit update
    pub const MAX_DIFFUSION_RATE: f32 = 0.25;

    /// Check every parameter
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` naming the first offending parameter.
    pub fn validate(&self) -> Result<()> {
        require_resolution("width", self.width)?;
        require_resolution("height", self.height)?;
        require_non_negative("brush_size", self.brush_size)?;
        require_non_negative("heat_intensity", self.heat_intensity)?;
        require_non_negative("diffusion_rate", self.diffusion_rate)?;
        if self.diffusion_rate > Self::MAX_DIFFUSION_RATE {
            return Err(SolverError::invalid(
                "diffusion_rate",
                format!(
                    "must not exceed {}, got {}",
                    Self::MAX_DIFFUSION_RATE,
                    self.diffusion_rate
                ),
            ));
        }
        require_unit_interval("cooling_rate", self.cooling_rate)?;
        Ok(())
    }
}

/// Configuration of the damped ripple surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RippleConfig {
    /// Cells per side of the square grid (≥ 3)
    pub resolution: usize,

    /// Amplitude kept per step, in `[0, 1]`
    pub damping: f32,

    /// Blend toward the neighbour average per step, in `[0, 1]`
    pub diffusion: f32,

    /// Displacement scale of a disturbance
    pub force_scale: f32,

    /// Disturbance radius as a percentage of the resolution
    pub input_radius: f32,

    /// Sequential or data-parallel execution
    pub mode: ExecutionMode,
}

impl Default for RippleConfig {
    fn default() -> Self {
        Self {
            resolution: 128,
            damping: 0.98,
            diffusion: 0.01,
            force_scale: 100.0,
            input_radius: 10.0,
            mode: ExecutionMode::Sequential,
        }
    }
}

impl RippleConfig {
    /// Disturbance radius in cells
    #[must_use]
    pub fn radius_cells(&self) -> f32 {
        (self.input_radius * self.resolution as f32 / 100.0).trunc()
    }

    /// Check every parameter
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` naming the first offending parameter.
    pub fn validate(&self) -> Result<()> {
        require_resolution("resolution", self.resolution)?;
        require_unit_interval("damping", self.damping)?;
        require_unit_interval("diffusion", self.diffusion)?;
        require_non_negative("force_scale", self.force_scale)?;
        require_non_negative("input_radius", self.input_radius)?;
        Ok(())
    }
}
