//! Semi-Lagrangian advection
//!
//! For every interior cell the velocity is traced backward over `dt` and the
//! source field is bilinearly resampled at the departure point. The result is
//! a convex combination of four source cells, so advection never creates
//! values outside the local range of its input (unconditionally stable).

use super::boundary::{apply_boundary, BoundaryKind};
use super::fields::Field;
use super::StencilBackend;

/// Transport `d0` along `(velocity_x, velocity_y)` into `d`, then apply `boundary`
///
/// `d` must not alias any input; the stepper passes its "previous" slot as the
/// destination and swaps afterwards.
pub fn advect(
    backend: &dyn StencilBackend,
    d: &mut Field,
    d0: &Field,
    velocity_x: &Field,
    velocity_y: &Field,
    dt: f32,
    boundary: BoundaryKind,
) {
    backend.advect(d, d0, velocity_x, velocity_y, dt);
    apply_boundary(d, boundary);
}
