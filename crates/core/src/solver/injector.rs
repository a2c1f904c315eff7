//! Falloff-weighted source injection
//!
//! External forcing (a pointer drag, a brush stroke, a droplet) adds
//! `amount · (1 - dist / radius)` to every cell within `radius` of a centre.
//! The centre may lie outside the grid; cells that fall off the grid are
//! skipped. Border cells are written like any other and get overwritten by
//! the next boundary pass.

use super::fields::Field;

/// Visit every in-grid cell within `radius` of `center` with its falloff weight
fn for_each_weighted(
    width: usize,
    height: usize,
    center: (isize, isize),
    radius: f32,
    mut visit: impl FnMut(usize, f32),
) {
    if !radius.is_finite() || radius <= 0.0 {
        return;
    }

    // Saturating: a radius wider than the grid only ever reaches the grid
    let reach = radius.floor() as isize;
    let (cx, cy) = center;
    let x_range =
        cx.saturating_sub(reach).max(0)..=cx.saturating_add(reach).min(width as isize - 1);
    let y_range =
        cy.saturating_sub(reach).max(0)..=cy.saturating_add(reach).min(height as isize - 1);

    for y in y_range {
        for x in x_range.clone() {
            let (dx, dy) = ((x - cx) as f32, (y - cy) as f32);
            let dist = (dx * dx + dy * dy).sqrt();
            if dist > radius {
                continue;
            }

            visit(x as usize + y as usize * width, 1.0 - dist / radius);
        }
    }
}

/// Add `amount` with linear radial falloff to `field` around `center`
///
/// A non-positive or non-finite `radius` is a no-op.
pub fn inject(field: &mut Field, center: (isize, isize), radius: f32, amount: f32) {
    let (w, h) = (field.width(), field.height());
    let cells = field.as_mut_slice();
    for_each_weighted(w, h, center, radius, |idx, weight| {
        cells[idx] += amount * weight;
    });
}

/// Add a two-component amount to a pair of fields with the same falloff
///
/// Used for velocity forcing, where both components share the brush.
pub fn inject_pair(
    field_x: &mut Field,
    field_y: &mut Field,
    center: (isize, isize),
    radius: f32,
    amount: (f32, f32),
) {
    let (w, h) = (field_x.width(), field_x.height());
    let (xs, ys) = (field_x.as_mut_slice(), field_y.as_mut_slice());
    for_each_weighted(w, h, center, radius, |idx, weight| {
        xs[idx] += amount.0 * weight;
        ys[idx] += amount.1 * weight;
    });
}
