//! Pure per-cell update functions
//!
//! Each function computes the new value of exactly one interior cell from
//! read-only inputs. The sequential backend calls them inside its ordered
//! loops; the parallel backend hands them to the rayon dispatcher. Because both
//! paths run the same bodies, any numerical difference between the two modes
//! comes only from *which* buffer a kernel reads (in-place vs. snapshot).
//!
//! All indices are flat (`i + j * width`) and must address interior cells.

/// Relaxation update for `c·x = x0 + a·(x_w + x_e + x_s + x_n)`
///
/// Reads the four neighbours from `x`. When `x` is the buffer being written
/// (sequential mode) this is a Gauss-Seidel update; when `x` is last sweep's
/// snapshot (parallel mode) it is a Jacobi update.
#[inline(always)]
pub fn relax_cell(x: &[f32], x0: &[f32], width: usize, idx: usize, a: f32, c: f32) -> f32 {
    (x0[idx] + a * (x[idx - 1] + x[idx + 1] + x[idx - width] + x[idx + width])) / c
}

/// Semi-Lagrangian backtrace and bilinear resample for cell `(i, j)`
///
/// The departure point `(i - dt·u·W, j - dt·v·H)` is clamped to
/// `[0.5, W - 1.5] × [0.5, H - 1.5]` so the 2×2 stencil stays inside the grid.
/// The result is a convex combination of the four sampled cells.
#[inline(always)]
pub fn advect_cell(
    d0: &[f32],
    velocity_x: &[f32],
    velocity_y: &[f32],
    width: usize,
    height: usize,
    i: usize,
    j: usize,
    dt: f32,
) -> f32 {
    let idx = i + j * width;
    let w = width as f32;
    let h = height as f32;

    let x = (i as f32 - dt * velocity_x[idx] * w).clamp(0.5, w - 1.5);
    let y = (j as f32 - dt * velocity_y[idx] * h).clamp(0.5, h - 1.5);

    let i0 = x as usize;
    let j0 = y as usize;
    let i1 = i0 + 1;
    let j1 = j0 + 1;

    let s1 = x - i0 as f32;
    let s0 = 1.0 - s1;
    let t1 = y - j0 as f32;
    let t0 = 1.0 - t1;

    s0 * (t0 * d0[i0 + j0 * width] + t1 * d0[i0 + j1 * width])
        + s1 * (t0 * d0[i1 + j0 * width] + t1 * d0[i1 + j1 * width])
}

/// Central-difference divergence, scaled for the pressure solve
///
/// `-0.5 · ((u_e - u_w) + (v_n - v_s)) / scale`
#[inline(always)]
pub fn divergence_cell(
    velocity_x: &[f32],
    velocity_y: &[f32],
    width: usize,
    idx: usize,
    scale: f32,
) -> f32 {
    -0.5 * (velocity_x[idx + 1] - velocity_x[idx - 1] + velocity_y[idx + width]
        - velocity_y[idx - width])
        / scale
}

/// Central-difference pressure gradient `(∂p/∂x, ∂p/∂y)` in velocity units
#[inline(always)]
pub fn pressure_gradient(pressure: &[f32], width: usize, idx: usize, scale: f32) -> (f32, f32) {
    (
        0.5 * (pressure[idx + 1] - pressure[idx - 1]) * scale,
        0.5 * (pressure[idx + width] - pressure[idx - width]) * scale,
    )
}

/// Explicit (forward Euler) diffusion step
///
/// `retain · (g + r · (g_s + g_n + g_w + g_e - 4g))`. `retain = 1` is pure
/// diffusion; `retain < 1` also cools the cell.
#[inline(always)]
pub fn explicit_diffusion_cell(grid: &[f32], width: usize, idx: usize, r: f32, retain: f32) -> f32 {
    let g = grid[idx];
    let updated = g + r
        * (grid[idx - width] + grid[idx + width] + grid[idx - 1] + grid[idx + 1] - 4.0 * g);
    updated * retain
}

/// Damped ripple update
///
/// `current` is this cell's value two steps back; the neighbour sum comes from
/// the previous step. The result is damped and then relaxed toward the
/// neighbour average by `diffusion` (clamped to `[0, 1]`).
#[inline(always)]
pub fn wave_cell(
    previous: &[f32],
    current: f32,
    width: usize,
    idx: usize,
    damping: f32,
    diffusion: f32,
) -> f32 {
    let neighbours =
        previous[idx - 1] + previous[idx + 1] + previous[idx - width] + previous[idx + width];
    let wave = (neighbours / 2.0 - current) * damping;
    let average = neighbours * 0.25;
    wave + (average - wave) * diffusion.clamp(0.0, 1.0)
}

/// Maximum that propagates NaN, so a diverged cell cannot hide in a reduction
#[inline(always)]
pub fn nan_max(a: f32, b: f32) -> f32 {
    if a.is_nan() || b.is_nan() {
        f32::NAN
    } else {
        a.max(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_relax_cell_identity_without_coupling() {
        let x = vec![9.0; 9];
        let x0 = vec![3.0; 9];
        assert_eq!(relax_cell(&x, &x0, 3, 4, 0.0, 1.0), 3.0);
    }

    #[test]
    fn test_relax_cell_averages_neighbours() {
        // 3x3, neighbours of the centre are 1, 2, 3, 4
        let x = vec![0.0, 3.0, 0.0, 1.0, 100.0, 2.0, 0.0, 4.0, 0.0];
        let x0 = vec![0.0; 9];
        assert_relative_eq!(relax_cell(&x, &x0, 3, 4, 1.0, 4.0), 2.5);
    }

    #[test]
    fn test_advect_zero_velocity_is_identity() {
        let width = 5;
        let d0: Vec<f32> = (0..25).map(|v| v as f32).collect();
        let zero = vec![0.0; 25];
        for j in 1..4 {
            for i in 1..4 {
                let v = advect_cell(&d0, &zero, &zero, width, 5, i, j, 0.1);
                assert_eq!(v, d0[i + j * width]);
            }
        }
    }

    #[test]
    fn test_advect_half_cell_shift_interpolates() {
        // u such that dt·u·W = 0.5 → sample halfway between (1, 2) and (2, 2)
        let width = 5;
        let d0: Vec<f32> = (0..25).map(|v| v as f32).collect();
        let velocity_x = vec![0.5 / (0.1 * 5.0); 25];
        let zero = vec![0.0; 25];
        let v = advect_cell(&d0, &velocity_x, &zero, width, 5, 2, 2, 0.1);
        assert_relative_eq!(v, 0.5 * (d0[11] + d0[12]), epsilon = 1e-5);
    }

    #[test]
    fn test_advect_clamps_departure_point() {
        let width = 4;
        let d0 = vec![1.0; 16];
        let huge = vec![1.0e6; 16];
        let v = advect_cell(&d0, &huge, &huge, width, 4, 1, 1, 1.0);
        assert_relative_eq!(v, 1.0);
    }

    #[test]
    fn test_divergence_of_expanding_field() {
        // u = i, v = j gives du/dx + dv/dy = 2 per cell
        let width = 3;
        let u: Vec<f32> = (0..9).map(|k| (k % 3) as f32).collect();
        let v: Vec<f32> = (0..9).map(|k| (k / 3) as f32).collect();
        assert_relative_eq!(divergence_cell(&u, &v, width, 4, 1.0), -2.0);
    }

    #[test]
    fn test_explicit_diffusion_conserves_flat_field() {
        let grid = vec![2.0; 9];
        assert_eq!(explicit_diffusion_cell(&grid, 3, 4, 0.2, 1.0), 2.0);
        assert_relative_eq!(explicit_diffusion_cell(&grid, 3, 4, 0.2, 0.5), 1.0);
    }

    #[test]
    fn test_wave_cell_flat_previous() {
        let previous = vec![1.0; 9];
        // neighbours/2 = 2, minus current 0, no damping or smoothing
        assert_eq!(wave_cell(&previous, 0.0, 3, 4, 1.0, 0.0), 2.0);
        // full smoothing returns the neighbour average
        assert_eq!(wave_cell(&previous, 0.0, 3, 4, 1.0, 1.0), 1.0);
    }

    #[test]
    fn test_nan_max_propagates() {
        assert!(nan_max(1.0, f32::NAN).is_nan());
        assert_eq!(nan_max(1.0, 2.0), 2.0);
    }
}
