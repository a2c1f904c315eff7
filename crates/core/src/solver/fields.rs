//! Field storage for the stencil solvers
//!
//! A `Field` is a flat `Vec<f32>` holding one scalar per grid cell. Every
//! quantity the solvers touch (density, temperature, each velocity component,
//! pressure, divergence) lives in its own `Field`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a field stores. Used for diagnostics and to pick the default
/// boundary rule; the rule actually applied is passed per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Transported scalar (density, temperature, displacement)
    Scalar,
    /// Horizontal velocity component
    VelocityX,
    /// Vertical velocity component
    VelocityY,
    /// Pressure solved during projection
    Pressure,
    /// Velocity divergence (projection right-hand side)
    Divergence,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scalar => "scalar",
            Self::VelocityX => "velocity-x",
            Self::VelocityY => "velocity-y",
            Self::Pressure => "pressure",
            Self::Divergence => "divergence",
        };
        f.write_str(name)
    }
}

/// 2D grid of `f32` values with fixed resolution
///
/// Cell `(i, j)` (column `i`, row `j`) lives at index `i + j * width`. This
/// convention is used by every kernel in the crate.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    data: Vec<f32>,
    width: usize,
    height: usize,
    kind: FieldKind,
}

impl Field {
    /// Create a new field with given dimensions, initialized to zero
    ///
    /// # Arguments
    ///
    /// * `width` - Grid width in cells
    /// * `height` - Grid height in cells
    /// * `kind` - What the field stores
    #[must_use]
    pub fn new(width: usize, height: usize, kind: FieldKind) -> Self {
        Self::with_value(width, height, kind, 0.0)
    }

    /// Create a new field with given dimensions, initialized to a value
    #[must_use]
    pub fn with_value(width: usize, height: usize, kind: FieldKind, value: f32) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
            kind,
        }
    }

    /// Build a field from existing values
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != width * height`
    #[must_use]
    pub fn from_vec(width: usize, height: usize, kind: FieldKind, data: Vec<f32>) -> Self {
        assert_eq!(data.len(), width * height, "Field data length mismatch");
        Self {
            data,
            width,
            height,
            kind,
        }
    }

    /// Grid width in cells
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// What this field stores
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Flat index of cell `(i, j)`
    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        i + j * self.width
    }

    /// Get reference to field data
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Get mutable reference to field data
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Get value at cell `(i, j)`
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        assert!(
            i < self.width && j < self.height,
            "Coordinates out of bounds"
        );
        self.data[self.index(i, j)]
    }

    /// Set value at cell `(i, j)`
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn set(&mut self, i: usize, j: usize, value: f32) {
        assert!(
            i < self.width && j < self.height,
            "Coordinates out of bounds"
        );
        let idx = self.index(i, j);
        self.data[idx] = value;
    }

    /// Fill entire field with a value
    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    /// Whether `(i, j)` is an interior cell (not on the one-cell border)
    #[inline]
    pub fn is_interior(&self, i: usize, j: usize) -> bool {
        i > 0 && j > 0 && i + 1 < self.width && j + 1 < self.height
    }

    /// Whether `other` has the same resolution
    pub fn same_shape(&self, other: &Field) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Overwrite all cells with the values of `other`
    ///
    /// # Panics
    ///
    /// Panics if the resolutions differ
    pub fn copy_from(&mut self, other: &Field) {
        assert!(self.same_shape(other), "Field resolution mismatch");
        self.data.copy_from_slice(&other.data);
    }

    /// Exchange cell storage with `other` in O(1)
    ///
    /// Only the buffers move; each field keeps its own `kind`.
    ///
    /// # Panics
    ///
    /// Panics if the resolutions differ
    pub fn swap_cells(&mut self, other: &mut Field) {
        assert!(self.same_shape(other), "Field resolution mismatch");
        std::mem::swap(&mut self.data, &mut other.data);
    }

    /// Set every border cell to zero
    pub fn zero_border(&mut self) {
        let (w, h) = (self.width, self.height);
        if w == 0 || h == 0 {
            return;
        }
        for i in 0..w {
            self.data[i] = 0.0;
            self.data[i + (h - 1) * w] = 0.0;
        }
        for j in 0..h {
            self.data[j * w] = 0.0;
            self.data[(w - 1) + j * w] = 0.0;
        }
    }

    /// True if no cell is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    /// Sum over all cells
    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }

    /// Largest absolute cell value
    pub fn max_abs(&self) -> f32 {
        self.data.iter().fold(0.0_f32, |m, v| m.max(v.abs()))
    }

    /// Cell values clamped to `[0, 1]`, ready for a colormap lookup
    pub fn clamped_unit(&self) -> impl Iterator<Item = f32> + '_ {
        self.data.iter().map(|v| v.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_creation() {
        let field = Field::new(10, 20, FieldKind::Scalar);
        assert_eq!(field.width(), 10);
        assert_eq!(field.height(), 20);
        assert_eq!(field.as_slice().len(), 200);
        assert!(field.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_field_with_value() {
        let field = Field::with_value(5, 5, FieldKind::Pressure, 42.0);
        assert_eq!(field.kind(), FieldKind::Pressure);
        assert!(field.as_slice().iter().all(|&v| v == 42.0));
    }

    #[test]
    fn test_field_get_set() {
        let mut field = Field::new(10, 10, FieldKind::Scalar);
        field.set(3, 4, 123.45);
        assert_eq!(field.get(3, 4), 123.45);

        // Column i, row j lives at i + j * width
        let index = 3 + 4 * 10;
        assert_eq!(field.as_slice()[index], 123.45);
    }

    #[test]
    fn test_swap_cells_keeps_kind() {
        let mut a = Field::with_value(4, 4, FieldKind::VelocityX, 1.0);
        let mut b = Field::with_value(4, 4, FieldKind::Pressure, 2.0);
        a.swap_cells(&mut b);
        assert_eq!(a.kind(), FieldKind::VelocityX);
        assert_eq!(b.kind(), FieldKind::Pressure);
        assert_eq!(a.get(0, 0), 2.0);
        assert_eq!(b.get(0, 0), 1.0);
    }

    #[test]
    fn test_zero_border() {
        let mut field = Field::with_value(4, 5, FieldKind::Scalar, 1.0);
        field.zero_border();
        for j in 0..5 {
            for i in 0..4 {
                let expected = if field.is_interior(i, j) { 1.0 } else { 0.0 };
                assert_eq!(field.get(i, j), expected, "cell ({i}, {j})");
            }
        }
    }

    #[test]
    fn test_clamped_unit() {
        let field = Field::from_vec(3, 1, FieldKind::Scalar, vec![-1.0, 0.5, 3.0]);
        let clamped: Vec<f32> = field.clamped_unit().collect();
        assert_eq!(clamped, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_is_finite() {
        let mut field = Field::new(3, 3, FieldKind::Scalar);
        assert!(field.is_finite());
        field.set(1, 1, f32::NAN);
        assert!(!field.is_finite());
    }

    #[test]
    #[should_panic(expected = "Coordinates out of bounds")]
    fn test_field_bounds_check() {
        let field = Field::new(10, 10, FieldKind::Scalar);
        let _ = field.get(10, 5);
    }
}
