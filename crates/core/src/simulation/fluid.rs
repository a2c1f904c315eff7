//! Stable-fluids smoke simulation
//!
//! `FluidSimulation` owns the density and velocity double buffers plus the
//! projection work buffers, and advances them with a fixed stage sequence:
//!
//! 1. diffuse velocity (viscosity)
//! 2. project
//! 3. advect velocity along itself
//! 4. project again
//! 5. diffuse density
//! 6. advect density along the final velocity
//!
//! Buffers rotate by swapping, never by copying, so after each stage the
//! "current" slot names the freshly computed field.

use crate::config::FluidConfig;
use crate::error::{Result, SolverError};
use crate::simulation::StepPhase;
use crate::solver::{
    advect, create_backend, diffuse, inject, inject_pair, project, BoundaryKind, Field,
    FieldKind, ProjectionBuffers, RelaxationParams, StencilBackend,
};
use std::borrow::Cow;
use tracing::{debug, info, trace, warn};

/// Every field of one fluid simulation, allocated together
struct SimulationState {
    density: Field,
    density_prev: Field,
    velocity_x: Field,
    velocity_x_prev: Field,
    velocity_y: Field,
    velocity_y_prev: Field,
    pressure: Field,
    divergence: Field,
    scratch: Field,
}

impl SimulationState {
    /// Zero-initialised state for an `n × n` grid
    fn new(n: usize) -> Self {
        Self {
            density: Field::new(n, n, FieldKind::Scalar),
            density_prev: Field::new(n, n, FieldKind::Scalar),
            velocity_x: Field::new(n, n, FieldKind::VelocityX),
            velocity_x_prev: Field::new(n, n, FieldKind::VelocityX),
            velocity_y: Field::new(n, n, FieldKind::VelocityY),
            velocity_y_prev: Field::new(n, n, FieldKind::VelocityY),
            pressure: Field::new(n, n, FieldKind::Pressure),
            divergence: Field::new(n, n, FieldKind::Divergence),
            scratch: Field::new(n, n, FieldKind::Scalar),
        }
    }

    fn projection_buffers(&mut self) -> (&mut Field, &mut Field, ProjectionBuffers<'_>) {
        (
            &mut self.velocity_x,
            &mut self.velocity_y,
            ProjectionBuffers {
                pressure: &mut self.pressure,
                divergence: &mut self.divergence,
                scratch: &mut self.scratch,
            },
        )
    }
}

/// Summary statistics of the current state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FluidStats {
    /// Sum of all density cells
    pub total_density: f32,
    /// Largest velocity magnitude
    pub max_speed: f32,
    /// `0.5 · Σ (u² + v²)`
    pub kinetic_energy: f32,
}

/// Stable-fluids smoke simulation on a square grid
pub struct FluidSimulation {
    config: FluidConfig,
    backend: Box<dyn StencilBackend>,
    state: SimulationState,
    phase: StepPhase,
    steps: u64,
    simulation_time: f32,
}

impl FluidSimulation {
    /// Create a new smoke simulation with zeroed fields
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if any parameter of `config` is out of
    /// range (resolution below 3, negative viscosity, non-finite `dt`, ...).
    pub fn new(config: FluidConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "Creating fluid simulation: {0}x{0} grid, viscosity={1:e}, diffusion={2:e}, mode={3}",
            config.resolution, config.viscosity, config.diffusion, config.mode
        );

        let backend = create_backend(config.mode);
        let state = SimulationState::new(config.resolution);

        Ok(Self {
            config,
            backend,
            state,
            phase: StepPhase::Idle,
            steps: 0,
            simulation_time: 0.0,
        })
    }

    /// Advance one step with the configured `dt`
    ///
    /// # Errors
    ///
    /// Returns `ComputationDiverged` if a density or velocity cell is NaN or
    /// infinite after the step.
    pub fn step(&mut self) -> Result<()> {
        self.advance(self.config.dt)
    }

    /// Advance one step with an explicit `dt`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for a non-positive or non-finite `dt`,
    /// and `ComputationDiverged` as for [`step`](Self::step).
    pub fn step_with(&mut self, dt: f32) -> Result<()> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SolverError::invalid(
                "dt",
                format!("must be finite and positive, got {dt}"),
            ));
        }
        self.advance(dt)
    }

    fn enter(&mut self, phase: StepPhase) {
        trace!("Fluid stepper {} -> {}", self.phase, phase);
        self.phase = phase;
    }

    fn advance(&mut self, dt: f32) -> Result<()> {
        let n = self.config.resolution;
        let scale = n as f32;
        let iterations = self.config.iterations;
        let stencil = self.config.pressure_stencil;
        let pressure = RelaxationParams::pressure(iterations, stencil);
        let viscous = |boundary| {
            RelaxationParams::diffusion(boundary, self.config.viscosity, dt, n, iterations, stencil)
        };
        let visc_x = viscous(BoundaryKind::VelocityX);
        let visc_y = viscous(BoundaryKind::VelocityY);
        let density_diffusion = RelaxationParams::diffusion(
            BoundaryKind::Scalar,
            self.config.diffusion,
            dt,
            n,
            iterations,
            stencil,
        );

        // Velocity
        self.enter(StepPhase::Diffusing);
        {
            let backend = self.backend.as_ref();
            let s = &mut self.state;
            s.velocity_x.swap_cells(&mut s.velocity_x_prev);
            diffuse(backend, &mut s.velocity_x, &mut s.scratch, &s.velocity_x_prev, &visc_x);
            s.velocity_y.swap_cells(&mut s.velocity_y_prev);
            diffuse(backend, &mut s.velocity_y, &mut s.scratch, &s.velocity_y_prev, &visc_y);
        }

        self.enter(StepPhase::Projecting);
        self.project(&pressure, scale);

        self.enter(StepPhase::Advecting);
        {
            let backend = self.backend.as_ref();
            let s = &mut self.state;
            s.velocity_x.swap_cells(&mut s.velocity_x_prev);
            s.velocity_y.swap_cells(&mut s.velocity_y_prev);
            advect(
                backend,
                &mut s.velocity_x,
                &s.velocity_x_prev,
                &s.velocity_x_prev,
                &s.velocity_y_prev,
                dt,
                BoundaryKind::VelocityX,
            );
            advect(
                backend,
                &mut s.velocity_y,
                &s.velocity_y_prev,
                &s.velocity_x_prev,
                &s.velocity_y_prev,
                dt,
                BoundaryKind::VelocityY,
            );
        }

        self.enter(StepPhase::Projecting);
        self.project(&pressure, scale);

        // Density
        self.enter(StepPhase::Diffusing);
        {
            let backend = self.backend.as_ref();
            let s = &mut self.state;
            s.density.swap_cells(&mut s.density_prev);
            diffuse(
                backend,
                &mut s.density,
                &mut s.scratch,
                &s.density_prev,
                &density_diffusion,
            );
        }

        self.enter(StepPhase::Advecting);
        {
            let backend = self.backend.as_ref();
            let s = &mut self.state;
            s.density.swap_cells(&mut s.density_prev);
            advect(
                backend,
                &mut s.density,
                &s.density_prev,
                &s.velocity_x,
                &s.velocity_y,
                dt,
                BoundaryKind::Scalar,
            );
        }

        self.enter(StepPhase::Settled);
        self.steps += 1;
        self.simulation_time += dt;

        self.check_finite()?;

        debug!(
            "Fluid step {}: t={:.3}s, dt={:.4}s, total_density={:.4}",
            self.steps,
            self.simulation_time,
            dt,
            self.total_density()
        );
        Ok(())
    }

    fn project(&mut self, params: &RelaxationParams, scale: f32) {
        let backend = self.backend.as_ref();
        let (velocity_x, velocity_y, buffers) = self.state.projection_buffers();
        project(backend, velocity_x, velocity_y, buffers, params, scale);
    }

    fn check_finite(&self) -> Result<()> {
        for field in [
            &self.state.density,
            &self.state.velocity_x,
            &self.state.velocity_y,
        ] {
            if !field.is_finite() {
                warn!(
                    "Fluid simulation diverged after step {}: non-finite {} field",
                    self.steps,
                    field.kind()
                );
                return Err(SolverError::ComputationDiverged {
                    field: field.kind(),
                });
            }
        }
        Ok(())
    }

    /// Reallocate every field at a new resolution, zeroed
    ///
    /// # Errors
    ///
    /// Returns `StepInFlight` unless the stepper is `Idle` or `Settled`, and
    /// `InvalidConfiguration` for a resolution below 3. The existing state is
    /// untouched on error.
    pub fn resize(&mut self, resolution: usize) -> Result<()> {
        if !self.phase.is_at_rest() {
            return Err(SolverError::StepInFlight { phase: self.phase });
        }

        let config = FluidConfig {
            resolution,
            ..self.config.clone()
        };
        config.validate()?;

        info!(
            "Resizing fluid simulation: {0}x{0} -> {1}x{1}",
            self.config.resolution, resolution
        );
        self.state = SimulationState::new(resolution);
        self.config = config;
        self.phase = StepPhase::Idle;
        Ok(())
    }

    /// Add density around `center` with the configured source radius
    pub fn add_density(&mut self, center: (isize, isize), amount: f32) {
        inject(&mut self.state.density, center, self.config.source_radius, amount);
    }

    /// Add a velocity impulse around `center` with the configured source radius
    pub fn add_velocity(&mut self, center: (isize, isize), amount: (f32, f32)) {
        let s = &mut self.state;
        inject_pair(
            &mut s.velocity_x,
            &mut s.velocity_y,
            center,
            self.config.source_radius,
            amount,
        );
    }

    /// Add a drag force: `drag` (cells moved this frame) scaled by the configured force
    pub fn add_force(&mut self, center: (isize, isize), drag: (f32, f32)) {
        let force = self.config.force;
        self.add_velocity(center, (drag.0 * force, drag.1 * force));
    }

    /// Add `amount` to density with an explicit radius
    pub fn inject_density(&mut self, center: (isize, isize), radius: f32, amount: f32) {
        inject(&mut self.state.density, center, radius, amount);
    }

    /// Replace the density field
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `values` does not hold exactly
    /// `resolution²` cells.
    pub fn load_density(&mut self, values: &[f32]) -> Result<()> {
        self.check_len("density", values.len())?;
        self.state.density.as_mut_slice().copy_from_slice(values);
        Ok(())
    }

    /// Replace both velocity components
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if either slice does not hold exactly
    /// `resolution²` cells.
    pub fn load_velocity(&mut self, velocity_x: &[f32], velocity_y: &[f32]) -> Result<()> {
        self.check_len("velocity_x", velocity_x.len())?;
        self.check_len("velocity_y", velocity_y.len())?;
        self.state.velocity_x.as_mut_slice().copy_from_slice(velocity_x);
        self.state.velocity_y.as_mut_slice().copy_from_slice(velocity_y);
        Ok(())
    }

    fn check_len(&self, parameter: &'static str, len: usize) -> Result<()> {
        let expected = self.config.resolution * self.config.resolution;
        if len != expected {
            return Err(SolverError::invalid(
                parameter,
                format!("must hold {expected} cells, got {len}"),
            ));
        }
        Ok(())
    }

    /// Density field
    pub fn density(&self) -> &Field {
        &self.state.density
    }

    /// Horizontal velocity field
    pub fn velocity_x(&self) -> &Field {
        &self.state.velocity_x
    }

    /// Vertical velocity field
    pub fn velocity_y(&self) -> &Field {
        &self.state.velocity_y
    }

    /// Pressure solved by the last projection
    pub fn pressure(&self) -> &Field {
        &self.state.pressure
    }

    /// Read density for rendering
    pub fn read_density(&self) -> Cow<'_, [f32]> {
        Cow::Borrowed(self.state.density.as_slice())
    }

    /// Read horizontal velocity for rendering
    pub fn read_velocity_x(&self) -> Cow<'_, [f32]> {
        Cow::Borrowed(self.state.velocity_x.as_slice())
    }

    /// Read vertical velocity for rendering
    pub fn read_velocity_y(&self) -> Cow<'_, [f32]> {
        Cow::Borrowed(self.state.velocity_y.as_slice())
    }

    /// Sum of all density cells
    pub fn total_density(&self) -> f32 {
        self.state.density.sum()
    }

    /// Largest velocity magnitude over the grid
    pub fn max_speed(&self) -> f32 {
        self.speeds_squared().fold(0.0_f32, f32::max).sqrt()
    }

    /// `0.5 · Σ (u² + v²)`
    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.speeds_squared().sum::<f32>()
    }

    fn speeds_squared(&self) -> impl Iterator<Item = f32> + '_ {
        self.state
            .velocity_x
            .as_slice()
            .iter()
            .zip(self.state.velocity_y.as_slice())
            .map(|(u, v)| u * u + v * v)
    }

    /// All diagnostics at once
    pub fn stats(&self) -> FluidStats {
        FluidStats {
            total_density: self.total_density(),
            max_speed: self.max_speed(),
            kinetic_energy: self.kinetic_energy(),
        }
    }

    /// Current stepper phase
    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    /// Active configuration
    pub fn config(&self) -> &FluidConfig {
        &self.config
    }

    /// Cells per side
    pub fn resolution(&self) -> usize {
        self.config.resolution
    }

    /// Completed steps since construction
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Simulated time in seconds
    pub fn simulation_time(&self) -> f32 {
        self.simulation_time
    }

    /// Check if the data-parallel backend is being used
    pub fn is_parallel(&self) -> bool {
        self.backend.is_parallel()
    }
}
