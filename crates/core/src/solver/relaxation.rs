//! Implicit relaxation solves (diffusion and pressure)
//!
//! Both solves approximate the 5-point system
//!
//! ```text
//! c·x[i,j] = x0[i,j] + a·(x[i-1,j] + x[i+1,j] + x[i,j-1] + x[i,j+1])
//! ```
//!
//! over the interior with a fixed number of sweeps. Diffusion uses
//! `a = dt·rate·(N-2)²`, `c = 1 + k·a`; the pressure solve uses `a = 1`,
//! `c = k`, where `k` is the [`PressureStencil`] centre weight.

use super::boundary::BoundaryKind;
use super::fields::Field;
use super::StencilBackend;
use crate::config::PressureStencil;

/// Coefficients of one relaxation solve
///
/// A pure value recomputed on every call from the physical parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxationParams {
    /// Edge rule applied after every sweep
    pub boundary: BoundaryKind,
    /// Neighbour coefficient `a`
    pub a: f32,
    /// Centre coefficient `c`
    pub c: f32,
    /// Number of sweeps `K`
    pub iterations: usize,
}

impl RelaxationParams {
    /// Coefficients for implicit diffusion of a field at `rate` over `dt`
    ///
    /// # Arguments
    ///
    /// * `boundary` - Edge rule of the diffused field
    /// * `rate` - Diffusion rate or viscosity (0 makes the solve an identity)
    /// * `dt` - Time step in seconds
    /// * `resolution` - Cells per side
    /// * `iterations` - Sweeps
    /// * `stencil` - Centre weight variant
    #[must_use]
    pub fn diffusion(
        boundary: BoundaryKind,
        rate: f32,
        dt: f32,
        resolution: usize,
        iterations: usize,
        stencil: PressureStencil,
    ) -> Self {
        let interior = resolution.saturating_sub(2) as f32;
        let a = dt * rate * interior * interior;
        Self {
            boundary,
            a,
            c: 1.0 + stencil.centre_weight() * a,
            iterations,
        }
    }

    /// Coefficients for the pressure Poisson solve
    #[must_use]
    pub fn pressure(iterations: usize, stencil: PressureStencil) -> Self {
        Self {
            boundary: BoundaryKind::Scalar,
            a: 1.0,
            c: stencil.centre_weight(),
            iterations,
        }
    }
}

/// Run the relaxation sweeps on an already seeded `x`
pub fn relax(
    backend: &dyn StencilBackend,
    x: &mut Field,
    scratch: &mut Field,
    x0: &Field,
    params: &RelaxationParams,
) {
    backend.relax(
        x,
        scratch,
        x0,
        params.boundary,
        params.a,
        params.c,
        params.iterations,
    );
}

/// Implicitly diffuse `x0` into `x`
///
/// `x` is seeded with `x0` and then relaxed. With `a = 0` the interior of `x`
/// is an exact copy of `x0`.
pub fn diffuse(
    backend: &dyn StencilBackend,
    x: &mut Field,
    scratch: &mut Field,
    x0: &Field,
    params: &RelaxationParams,
) {
    x.copy_from(x0);
    relax(backend, x, scratch, x0, params);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{FieldKind, SequentialBackend};
    use approx::assert_relative_eq;

    fn hot_spot(resolution: usize) -> Field {
        let mut field = Field::new(resolution, resolution, FieldKind::Scalar);
        field.set(resolution / 2, resolution / 2, 1.0);
        field
    }

    #[test]
    fn test_diffusion_coefficients() {
        let params = RelaxationParams::diffusion(
            BoundaryKind::Scalar,
            0.5,
            0.1,
            12,
            20,
            PressureStencil::FourNeighbor,
        );
        assert_relative_eq!(params.a, 5.0, epsilon = 1e-5);
        assert_relative_eq!(params.c, 21.0, epsilon = 1e-5);

        let legacy = RelaxationParams::diffusion(
            BoundaryKind::Scalar,
            0.5,
            0.1,
            12,
            20,
            PressureStencil::SixNeighbor,
        );
        assert_relative_eq!(legacy.c, 31.0, epsilon = 1e-5);
    }

    #[test]
    fn test_zero_rate_diffusion_is_identity() {
        let backend = SequentialBackend::new();
        let x0 = hot_spot(9);
        let mut x = Field::new(9, 9, FieldKind::Scalar);
        let mut scratch = Field::new(9, 9, FieldKind::Scalar);
        let params = RelaxationParams::diffusion(
            BoundaryKind::Scalar,
            0.0,
            0.1,
            9,
            20,
            PressureStencil::FourNeighbor,
        );
        diffuse(&backend, &mut x, &mut scratch, &x0, &params);
        assert_eq!(x, x0);
    }

    #[test]
    fn test_diffusion_spreads_and_conserves_interior_mass() {
        let backend = SequentialBackend::new();
        let x0 = hot_spot(21);
        let mut x = Field::new(21, 21, FieldKind::Scalar);
        let mut scratch = Field::new(21, 21, FieldKind::Scalar);
        let params = RelaxationParams::diffusion(
            BoundaryKind::Scalar,
            0.001,
            0.01,
            21,
            60,
            PressureStencil::FourNeighbor,
        );
        diffuse(&backend, &mut x, &mut scratch, &x0, &params);

        assert!(x.get(10, 10) < 1.0);
        assert!(x.get(11, 10) > 0.0);
        let interior: f32 = (1..20)
            .flat_map(|j| (1..20).map(move |i| (i, j)))
            .map(|(i, j)| x.get(i, j))
            .sum();
        assert_relative_eq!(interior, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_pressure_coefficients() {
        let params = RelaxationParams::pressure(20, PressureStencil::FourNeighbor);
        assert_eq!(params.a, 1.0);
        assert_eq!(params.c, 4.0);
        assert_eq!(params.boundary, BoundaryKind::Scalar);
    }
}
