//! Convergence-driven heat equilibrium
//!
//! Repeats the explicit update
//!
//! ```text
//! T'[i,j] = T[i,j] + r·(T[i-1,j] + T[i+1,j] + T[i,j-1] + T[i,j+1] - 4·T[i,j])
//! ```
//!
//! into a second buffer until the largest per-cell change of one iteration
//! drops below `epsilon`. The border is held at zero. Every iteration reads
//! only the previous iterate, so the sequential and data-parallel backends
//! produce identical results; the max-change reduction finishes before the
//! next iteration starts.
//!
//! The scheme is stable for `r ≤ 0.25`. Larger coefficients grow without
//! bound; the iteration cap and the finiteness check on the residual turn that
//! into an error instead of an endless loop.

use crate::config::EquilibriumConfig;
use crate::error::{Result, SolverError};
use crate::solver::{create_backend, Field, FieldKind, StencilBackend};
use std::ops::ControlFlow;
use tracing::{debug, info, warn};

/// Progress report passed to the observer after every iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationReport {
    /// Iterations completed so far (starting at 1)
    pub iteration: usize,
    /// Max absolute change of this iteration
    pub residual: f32,
}

/// Outcome of a converged solve
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceResult {
    /// Settled field
    pub field: Field,
    /// Iterations taken (at least 1)
    pub iterations: usize,
    /// Max absolute change of the final iteration (below epsilon)
    pub residual: f32,
}

/// Heat diffusion run to equilibrium on a square grid
pub struct EquilibriumSolver {
    config: EquilibriumConfig,
    backend: Box<dyn StencilBackend>,
    field: Field,
    next: Field,
    /// Dirichlet sources as (flat index, value)
    pins: Vec<(usize, f32)>,
    iterations: usize,
    residual: f32,
}

impl EquilibriumSolver {
    /// Create a solver with a zero field and no sources
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `config` fails validation.
    pub fn new(config: EquilibriumConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "Creating equilibrium solver: {0}x{0} grid, r={1:e}, epsilon={2:e}, cap={3:?}, mode={4}",
            config.grid_size,
            config.diffusion_coefficient,
            config.epsilon,
            config.max_iterations,
            config.mode
        );

        let n = config.grid_size;
        Ok(Self {
            backend: create_backend(config.mode),
            field: Field::new(n, n, FieldKind::Scalar),
            next: Field::new(n, n, FieldKind::Scalar),
            pins: Vec::new(),
            iterations: 0,
            residual: f32::INFINITY,
            config,
        })
    }

    fn interior_index(&self, i: usize, j: usize) -> Result<usize> {
        if !self.field.is_interior(i, j) {
            let n = self.config.grid_size;
            return Err(SolverError::invalid(
                "cell",
                format!("({i}, {j}) must be an interior cell of the {n}x{n} grid"),
            ));
        }
        Ok(self.field.index(i, j))
    }

    /// Set a one-off initial value; it diffuses away like the rest of the field
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` unless `(i, j)` is an interior cell.
    pub fn seed_pulse(&mut self, i: usize, j: usize, value: f32) -> Result<()> {
        let idx = self.interior_index(i, j)?;
        self.field.as_mut_slice()[idx] = value;
        Ok(())
    }

    /// Hold `(i, j)` at `value` on every iteration (heat source or sink)
    ///
    /// Pinning the same cell again replaces its value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` unless `(i, j)` is an interior cell.
    pub fn pin(&mut self, i: usize, j: usize, value: f32) -> Result<()> {
        let idx = self.interior_index(i, j)?;
        match self.pins.iter_mut().find(|(pinned, _)| *pinned == idx) {
            Some(pin) => pin.1 = value,
            None => self.pins.push((idx, value)),
        }
        self.field.as_mut_slice()[idx] = value;
        Ok(())
    }

    fn apply_pins(pins: &[(usize, f32)], field: &mut Field) {
        let cells = field.as_mut_slice();
        for &(idx, value) in pins {
            cells[idx] = value;
        }
    }

    /// Iterate until the field settles
    ///
    /// # Errors
    ///
    /// See [`solve_with`](Self::solve_with).
    pub fn solve(&mut self) -> Result<ConvergenceResult> {
        self.solve_with(|_| ControlFlow::Continue(()))
    }

    /// Iterate until the field settles, reporting every iteration to `observer`
    ///
    /// The observer runs between iterations, the only point where the loop
    /// can be stopped; returning `ControlFlow::Break(())` ends the solve.
    /// After any error the best-effort field stays readable via
    /// [`field`](Self::field).
    ///
    /// # Errors
    ///
    /// - `Interrupted` if the observer breaks
    /// - `ConvergenceTimeout` if `max_iterations` is reached first
    /// - `ComputationDiverged` if the residual becomes NaN or infinite
    pub fn solve_with<F>(&mut self, mut observer: F) -> Result<ConvergenceResult>
    where
        F: FnMut(IterationReport) -> ControlFlow<()>,
    {
        let r = self.config.diffusion_coefficient;
        let epsilon = self.config.epsilon;
        let cap = self.config.max_iterations;
        let start = self.iterations;

        Self::apply_pins(&self.pins, &mut self.field);

        loop {
            self.backend
                .explicit_diffusion(&mut self.next, &self.field, r, 1.0);
            Self::apply_pins(&self.pins, &mut self.next);
            let residual = self.backend.max_abs_diff(&self.field, &self.next);
            self.field.swap_cells(&mut self.next);
            self.iterations += 1;
            self.residual = residual;
            let taken = self.iterations - start;

            if !residual.is_finite() {
                warn!(
                    "Equilibrium solve diverged after {} iterations (residual {})",
                    taken, residual
                );
                return Err(SolverError::ComputationDiverged {
                    field: FieldKind::Scalar,
                });
            }

            let report = IterationReport {
                iteration: taken,
                residual,
            };
            if observer(report).is_break() {
                debug!("Equilibrium solve interrupted after {} iterations", taken);
                return Err(SolverError::Interrupted { iterations: taken });
            }

            if residual < epsilon {
                debug!(
                    "Equilibrium reached in {} iterations (residual {:e}, backend {})",
                    taken,
                    residual,
                    self.backend.name()
                );
                return Ok(ConvergenceResult {
                    field: self.field.clone(),
                    iterations: taken,
                    residual,
                });
            }

            if cap.is_some_and(|max| taken >= max) {
                warn!(
                    "Equilibrium solve hit the iteration cap ({}) with residual {:e}",
                    taken, residual
                );
                return Err(SolverError::ConvergenceTimeout {
                    iterations: taken,
                    residual,
                });
            }
        }
    }

    /// Reallocate the grid at `grid_size`, zeroed and without sources
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for a size below 3; the solver is
    /// untouched in that case.
    pub fn resize(&mut self, grid_size: usize) -> Result<()> {
        let config = EquilibriumConfig {
            grid_size,
            ..self.config.clone()
        };
        config.validate()?;

        info!(
            "Resizing equilibrium solver: {0}x{0} -> {1}x{1}",
            self.config.grid_size, grid_size
        );
        self.field = Field::new(grid_size, grid_size, FieldKind::Scalar);
        self.next = Field::new(grid_size, grid_size, FieldKind::Scalar);
        self.pins.clear();
        self.iterations = 0;
        self.residual = f32::INFINITY;
        self.config = config;
        Ok(())
    }

    /// Current (possibly unsettled) field
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Iterations run since construction or the last resize
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Residual of the most recent iteration (infinite before the first)
    pub fn residual(&self) -> f32 {
        self.residual
    }

    /// Active configuration
    pub fn config(&self) -> &EquilibriumConfig {
        &self.config
    }

    /// Check if the data-parallel backend is being used
    pub fn is_parallel(&self) -> bool {
        self.backend.is_parallel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(n: usize, r: f32) -> EquilibriumConfig {
        EquilibriumConfig {
            grid_size: n,
            diffusion_coefficient: r,
            ..EquilibriumConfig::default()
        }
    }

    #[test]
    fn test_free_pulse_decays_to_zero() {
        let mut solver = EquilibriumSolver::new(config(8, 0.2)).expect("config");
        solver.seed_pulse(4, 4, 1.0).expect("interior");
        let result = solver.solve().expect("converges");
        assert!(result.iterations >= 1);
        assert!(result.residual < 1e-5);
        assert!(result.field.max_abs() < 1e-3);
    }

    #[test]
    fn test_border_cells_rejected() {
        let mut solver = EquilibriumSolver::new(config(8, 0.1)).expect("config");
        assert!(solver.pin(0, 3, 1.0).is_err());
        assert!(solver.seed_pulse(3, 7, 1.0).is_err());
        assert!(solver.pin(3, 3, 1.0).is_ok());
    }

    #[test]
    fn test_zero_field_converges_in_one_iteration() {
        let mut solver = EquilibriumSolver::new(config(5, 0.1)).expect("config");
        let result = solver.solve().expect("converges");
        assert_eq!(result.iterations, 1);
        assert_eq!(result.residual, 0.0);
    }

    #[test]
    fn test_observer_sees_every_iteration() {
        let mut solver = EquilibriumSolver::new(config(8, 0.2)).expect("config");
        solver.seed_pulse(3, 3, 1.0).expect("interior");
        let mut seen = Vec::new();
        let result = solver
            .solve_with(|report| {
                seen.push(report.iteration);
                ControlFlow::Continue(())
            })
            .expect("converges");
        assert_eq!(seen.len(), result.iterations);
        assert_eq!(seen.first(), Some(&1));
    }
}
