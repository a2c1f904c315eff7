//! Pressure projection
//!
//! Makes a velocity field approximately divergence-free by solving a Poisson
//! equation for pressure and subtracting its gradient.

use super::boundary::{apply_boundary, BoundaryKind};
use super::fields::Field;
use super::relaxation::{relax, RelaxationParams};
use super::StencilBackend;

/// Work buffers used by one projection
///
/// Borrowed from the owning simulation so repeated projections never
/// allocate.
pub struct ProjectionBuffers<'a> {
    /// Solved pressure (zeroed at the start of every projection)
    pub pressure: &'a mut Field,
    /// Scaled divergence of the input velocity
    pub divergence: &'a mut Field,
    /// Relaxation scratch buffer
    pub scratch: &'a mut Field,
}

/// Project `(velocity_x, velocity_y)` onto its divergence-free part in place
///
/// # Arguments
///
/// * `backend` - Stencil scheduling strategy
/// * `velocity_x`, `velocity_y` - Velocity components, corrected in place
/// * `buffers` - Pressure, divergence and scratch storage
/// * `params` - Pressure relaxation coefficients (`a = 1`)
/// * `scale` - Grid resolution `N` (divergence is divided by it, the gradient
///   multiplied by it)
pub fn project(
    backend: &dyn StencilBackend,
    velocity_x: &mut Field,
    velocity_y: &mut Field,
    buffers: ProjectionBuffers<'_>,
    params: &RelaxationParams,
    scale: f32,
) {
    let ProjectionBuffers {
        pressure,
        divergence,
        scratch,
    } = buffers;

    backend.divergence(divergence, velocity_x, velocity_y, scale);
    pressure.fill(0.0);
    apply_boundary(divergence, BoundaryKind::Scalar);
    apply_boundary(pressure, BoundaryKind::Scalar);

    relax(backend, pressure, scratch, divergence, params);

    backend.subtract_gradient(velocity_x, velocity_y, pressure, scale);
    apply_boundary(velocity_x, BoundaryKind::VelocityX);
    apply_boundary(velocity_y, BoundaryKind::VelocityY);
}
