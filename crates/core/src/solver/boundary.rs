//! Edge conditions applied after every stencil pass
//!
//! The one-cell border of a field is never computed by a stencil; it is
//! derived from the first interior ring by [`apply_boundary`]:
//!
//! ```text
//! Scalar     edge = interior          (zero gradient, insulating wall)
//! VelocityX  left/right edge = -interior, top/bottom edge = interior
//! VelocityY  top/bottom edge = -interior, left/right edge = interior
//! corner     = 0.5 * (horizontal edge neighbour + vertical edge neighbour)
//! ```
//!
//! The sign flip makes the normal velocity component vanish at the wall
//! (reflective, no-through-flow). Corners average the two edge cells that
//! share a side with them, not the diagonal interior cell.

use super::fields::{Field, FieldKind};
use serde::{Deserialize, Serialize};

/// Rule used to derive border cells from the interior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryKind {
    /// Copy the adjacent interior value
    Scalar,
    /// Negate on the left/right walls, copy on top/bottom
    VelocityX,
    /// Negate on the top/bottom walls, copy on left/right
    VelocityY,
}

impl BoundaryKind {
    /// Sign applied to the mirrored value on the left/right walls
    #[inline]
    fn vertical_wall_sign(self) -> f32 {
        if self == Self::VelocityX {
            -1.0
        } else {
            1.0
        }
    }

    /// Sign applied to the mirrored value on the top/bottom walls
    #[inline]
    fn horizontal_wall_sign(self) -> f32 {
        if self == Self::VelocityY {
            -1.0
        } else {
            1.0
        }
    }
}

impl From<FieldKind> for BoundaryKind {
    fn from(kind: FieldKind) -> Self {
        match kind {
            FieldKind::VelocityX => Self::VelocityX,
            FieldKind::VelocityY => Self::VelocityY,
            FieldKind::Scalar | FieldKind::Pressure | FieldKind::Divergence => Self::Scalar,
        }
    }
}

/// Rewrite the border rows, columns and corners of `field` from its interior
///
/// Runs identically for both execution modes; it is O(width + height) and is
/// part of every field update.
pub fn apply_boundary(field: &mut Field, kind: BoundaryKind) {
    let w = field.width();
    let h = field.height();
    debug_assert!(w >= 3 && h >= 3, "boundary needs at least one interior cell");

    let top_bottom = kind.horizontal_wall_sign();
    let left_right = kind.vertical_wall_sign();
    let x = field.as_mut_slice();

    // Top (j = 0) and bottom (j = h - 1) rows
    for i in 1..w - 1 {
        x[i] = top_bottom * x[i + w];
        x[i + (h - 1) * w] = top_bottom * x[i + (h - 2) * w];
    }

    // Left (i = 0) and right (i = w - 1) columns
    for j in 1..h - 1 {
        x[j * w] = left_right * x[1 + j * w];
        x[(w - 1) + j * w] = left_right * x[(w - 2) + j * w];
    }

    x[0] = 0.5 * (x[1] + x[w]);
    x[w - 1] = 0.5 * (x[w - 2] + x[(w - 1) + w]);
    x[(h - 1) * w] = 0.5 * (x[(h - 2) * w] + x[1 + (h - 1) * w]);
    x[w * h - 1] = 0.5 * (x[w * h - 2] + x[(w - 1) + (h - 2) * w]);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Field whose interior values are all distinct and non-zero
    fn ramp(width: usize, height: usize) -> Field {
        let data = (0..width * height).map(|v| v as f32 * 0.5 + 1.0).collect();
        Field::from_vec(width, height, FieldKind::Scalar, data)
    }

    fn check_edges(field: &Field, kind: BoundaryKind) {
        let (w, h) = (field.width(), field.height());
        let lr = if kind == BoundaryKind::VelocityX { -1.0 } else { 1.0 };
        let tb = if kind == BoundaryKind::VelocityY { -1.0 } else { 1.0 };

        for i in 1..w - 1 {
            assert_eq!(field.get(i, 0), tb * field.get(i, 1), "top edge at i={i}");
            assert_eq!(
                field.get(i, h - 1),
                tb * field.get(i, h - 2),
                "bottom edge at i={i}"
            );
        }
        for j in 1..h - 1 {
            assert_eq!(field.get(0, j), lr * field.get(1, j), "left edge at j={j}");
            assert_eq!(
                field.get(w - 1, j),
                lr * field.get(w - 2, j),
                "right edge at j={j}"
            );
        }

        assert_eq!(field.get(0, 0), 0.5 * (field.get(1, 0) + field.get(0, 1)));
        assert_eq!(
            field.get(w - 1, 0),
            0.5 * (field.get(w - 2, 0) + field.get(w - 1, 1))
        );
        assert_eq!(
            field.get(0, h - 1),
            0.5 * (field.get(0, h - 2) + field.get(1, h - 1))
        );
        assert_eq!(
            field.get(w - 1, h - 1),
            0.5 * (field.get(w - 2, h - 1) + field.get(w - 1, h - 2))
        );
    }

    #[test]
    fn test_scalar_mirrors_interior() {
        let mut field = ramp(6, 5);
        apply_boundary(&mut field, BoundaryKind::Scalar);
        check_edges(&field, BoundaryKind::Scalar);
    }

    #[test]
    fn test_velocity_x_flips_on_vertical_walls() {
        let mut field = ramp(5, 7);
        apply_boundary(&mut field, BoundaryKind::VelocityX);
        check_edges(&field, BoundaryKind::VelocityX);
        assert_eq!(field.get(0, 3), -field.get(1, 3));
        assert_eq!(field.get(2, 0), field.get(2, 1));
    }

    #[test]
    fn test_velocity_y_flips_on_horizontal_walls() {
        let mut field = ramp(7, 5);
        apply_boundary(&mut field, BoundaryKind::VelocityY);
        check_edges(&field, BoundaryKind::VelocityY);
        assert_eq!(field.get(3, 0), -field.get(3, 1));
        assert_eq!(field.get(0, 2), field.get(1, 2));
    }

    #[test]
    fn test_interior_untouched() {
        let original = ramp(6, 6);
        let mut field = original.clone();
        apply_boundary(&mut field, BoundaryKind::VelocityX);
        for j in 1..5 {
            for i in 1..5 {
                assert_eq!(field.get(i, j), original.get(i, j));
            }
        }
    }

    #[test]
    fn test_minimal_grid() {
        let mut field = Field::new(3, 3, FieldKind::Scalar);
        field.set(1, 1, 4.0);
        apply_boundary(&mut field, BoundaryKind::Scalar);
        assert!(field.as_slice().iter().all(|&v| v == 4.0));
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(BoundaryKind::from(FieldKind::Pressure), BoundaryKind::Scalar);
        assert_eq!(BoundaryKind::from(FieldKind::VelocityX), BoundaryKind::VelocityX);
        assert_eq!(BoundaryKind::from(FieldKind::VelocityY), BoundaryKind::VelocityY);
    }
}
