//! Single-threaded stencil backend
//!
//! Sweeps run in a fixed order: outer loop over columns `i` ascending, inner
//! loop over rows `j` ascending, index `i + j * width`. Relaxation updates `x`
//! in place, so each cell sees neighbours already updated earlier in the same
//! sweep (Gauss-Seidel). Given identical inputs the output is reproducible
//! bit-for-bit.

use super::boundary::{apply_boundary, BoundaryKind};
use super::fields::Field;
use super::kernels::{
    advect_cell, divergence_cell, explicit_diffusion_cell, nan_max, pressure_gradient,
    relax_cell, wave_cell,
};
use super::StencilBackend;

/// Sequential scalar-sweep backend
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialBackend;

impl SequentialBackend {
    /// Create a new sequential backend
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl StencilBackend for SequentialBackend {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn is_parallel(&self) -> bool {
        false
    }

    fn relax(
        &self,
        x: &mut Field,
        _scratch: &mut Field,
        x0: &Field,
        boundary: BoundaryKind,
        a: f32,
        c: f32,
        iterations: usize,
    ) {
        let (w, h) = (x.width(), x.height());
        for _ in 0..iterations {
            let cells = x.as_mut_slice();
            for i in 1..w - 1 {
                for j in 1..h - 1 {
                    let idx = i + j * w;
                    let updated = relax_cell(cells, x0.as_slice(), w, idx, a, c);
                    cells[idx] = updated;
                }
            }
            apply_boundary(x, boundary);
        }

        if iterations == 0 {
            apply_boundary(x, boundary);
        }
    }

    fn advect(&self, d: &mut Field, d0: &Field, velocity_x: &Field, velocity_y: &Field, dt: f32) {
        let (w, h) = (d.width(), d.height());
        let out = d.as_mut_slice();
        for i in 1..w - 1 {
            for j in 1..h - 1 {
                out[i + j * w] = advect_cell(
                    d0.as_slice(),
                    velocity_x.as_slice(),
                    velocity_y.as_slice(),
                    w,
                    h,
                    i,
                    j,
                    dt,
                );
            }
        }
    }

    fn divergence(&self, divergence: &mut Field, velocity_x: &Field, velocity_y: &Field, scale: f32) {
        let (w, h) = (divergence.width(), divergence.height());
        let out = divergence.as_mut_slice();
        for i in 1..w - 1 {
            for j in 1..h - 1 {
                let idx = i + j * w;
                out[idx] =
                    divergence_cell(velocity_x.as_slice(), velocity_y.as_slice(), w, idx, scale);
            }
        }
    }

    fn subtract_gradient(
        &self,
        velocity_x: &mut Field,
        velocity_y: &mut Field,
        pressure: &Field,
        scale: f32,
    ) {
        let (w, h) = (pressure.width(), pressure.height());
        let u = velocity_x.as_mut_slice();
        let v = velocity_y.as_mut_slice();
        for i in 1..w - 1 {
            for j in 1..h - 1 {
                let idx = i + j * w;
                let (gx, gy) = pressure_gradient(pressure.as_slice(), w, idx, scale);
                u[idx] -= gx;
                v[idx] -= gy;
            }
        }
    }

    fn explicit_diffusion(&self, output: &mut Field, input: &Field, r: f32, retain: f32) {
        let (w, h) = (input.width(), input.height());
        let out = output.as_mut_slice();
        for i in 1..w - 1 {
            for j in 1..h - 1 {
                let idx = i + j * w;
                out[idx] = explicit_diffusion_cell(input.as_slice(), w, idx, r, retain);
            }
        }
    }

    fn wave(&self, current: &mut Field, previous: &Field, damping: f32, diffusion: f32) {
        let (w, h) = (previous.width(), previous.height());
        let out = current.as_mut_slice();
        for i in 1..w - 1 {
            for j in 1..h - 1 {
                let idx = i + j * w;
                out[idx] = wave_cell(previous.as_slice(), out[idx], w, idx, damping, diffusion);
            }
        }
    }

    fn max_abs_diff(&self, a: &Field, b: &Field) -> f32 {
        let (w, h) = (a.width(), a.height());
        let (lhs, rhs) = (a.as_slice(), b.as_slice());
        let mut max_diff = 0.0_f32;
        for i in 1..w - 1 {
            for j in 1..h - 1 {
                let idx = i + j * w;
                max_diff = nan_max(max_diff, (lhs[idx] - rhs[idx]).abs());
            }
        }
        max_diff
    }
}
