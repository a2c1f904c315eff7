//! Stencil backend trait definition
//!
//! This module defines the `StencilBackend` trait, the seam between the
//! solver stages (diffuse, project, advect, equilibrium) and the way the
//! per-cell kernels are scheduled. Both the sequential and the data-parallel
//! backends implement it with the same kernel bodies.

use super::boundary::BoundaryKind;
use super::fields::Field;

/// Backend-agnostic interface for the grid stencil passes
///
/// Every method except [`relax`](Self::relax) writes interior cells only; the
/// caller applies the boundary rule afterwards. All fields passed to one call
/// must share a resolution and be at least 3×3.
pub trait StencilBackend: Send + Sync {
    /// Human-readable backend name for logs
    fn name(&self) -> &'static str;

    /// Check if this backend dispatches cells concurrently
    ///
    /// # Returns
    ///
    /// `true` for the data-parallel backend (Jacobi relaxation), `false` for
    /// the sequential one (Gauss-Seidel relaxation)
    fn is_parallel(&self) -> bool;

    /// Run `iterations` relaxation sweeps of `c·x = x0 + a·Σneighbours(x)`
    ///
    /// Each sweep is followed by `apply_boundary(x, boundary)`. With zero
    /// iterations only the boundary is applied.
    ///
    /// # Arguments
    ///
    /// * `x` - Working buffer, pre-seeded by the caller, updated in place
    /// * `scratch` - Second buffer for snapshot sweeps; contents are clobbered
    /// * `x0` - Right-hand side
    /// * `boundary` - Edge rule applied after each sweep
    /// * `a` - Neighbour coefficient
    /// * `c` - Centre coefficient
    /// * `iterations` - Number of sweeps
    fn relax(
        &self,
        x: &mut Field,
        scratch: &mut Field,
        x0: &Field,
        boundary: BoundaryKind,
        a: f32,
        c: f32,
        iterations: usize,
    );

    /// Semi-Lagrangian transport of `d0` along `(velocity_x, velocity_y)` into `d`
    fn advect(&self, d: &mut Field, d0: &Field, velocity_x: &Field, velocity_y: &Field, dt: f32);

    /// Write the scaled velocity divergence into `divergence`
    fn divergence(&self, divergence: &mut Field, velocity_x: &Field, velocity_y: &Field, scale: f32);

    /// Subtract the pressure gradient from both velocity components
    fn subtract_gradient(
        &self,
        velocity_x: &mut Field,
        velocity_y: &mut Field,
        pressure: &Field,
        scale: f32,
    );

    /// One explicit diffusion update from `input` into `output`, scaled by `retain`
    fn explicit_diffusion(&self, output: &mut Field, input: &Field, r: f32, retain: f32);

    /// Damped ripple update of `current` from the `previous` step
    fn wave(&self, current: &mut Field, previous: &Field, damping: f32, diffusion: f32);

    /// Maximum absolute interior difference between two fields
    ///
    /// NaN anywhere in the interior yields NaN.
    fn max_abs_diff(&self, a: &Field, b: &Field) -> f32;
}
