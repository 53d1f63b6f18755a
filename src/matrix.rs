//! Caller-facing matrix forms and upfront shape validation.
//!
//! Two host representations are supported: nested rows (`[Vec<T>]`) and
//! `ndarray` views. Both are read through [`MatrixSource`], which is all the
//! layout stage needs to know about them.

use std::fmt;

use ndarray::ArrayView2;

use crate::error::{dimension_mismatch, ragged_matrix, Operand, Result};

/// Row and column count of a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Shape { rows, cols }
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Read access to a dense matrix in whatever form the caller holds it.
pub trait MatrixSource<T> {
    /// Returns the shape, rejecting forms that are not rectangular.
    fn checked_shape(&self, operand: Operand) -> Result<Shape>;

    /// Whether the reported column count is real. A nested matrix with no
    /// rows has none, so its shape reads as `0x0`.
    fn has_known_columns(&self) -> bool {
        true
    }

    /// Visits every cell as `(row, column, value)` in row-major order.
    fn for_each_cell<F>(&self, f: F)
    where
        F: FnMut(usize, usize, T);
}

impl<T: Copy> MatrixSource<T> for [Vec<T>] {
    fn checked_shape(&self, operand: Operand) -> Result<Shape> {
        let Some(first) = self.first() else {
            return Ok(Shape::new(0, 0));
        };

        let cols = first.len();
        if let Some((row, found)) = self
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|&(_, len)| len != cols)
        {
            return Err(ragged_matrix(operand, row, cols, found));
        }

        Ok(Shape::new(self.len(), cols))
    }

    fn has_known_columns(&self) -> bool {
        !self.is_empty()
    }

    fn for_each_cell<F>(&self, mut f: F)
    where
        F: FnMut(usize, usize, T),
    {
        for (i, row) in self.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                f(i, j, value);
            }
        }
    }
}

impl<T: Copy> MatrixSource<T> for ArrayView2<'_, T> {
    fn checked_shape(&self, _operand: Operand) -> Result<Shape> {
        let (rows, cols) = self.dim();
        Ok(Shape::new(rows, cols))
    }

    fn for_each_cell<F>(&self, mut f: F)
    where
        F: FnMut(usize, usize, T),
    {
        for ((i, j), &value) in self.indexed_iter() {
            f(i, j, value);
        }
    }
}

/// Checks both operands and returns their shapes.
///
/// The inner dimension is compared whenever the left operand knows its
/// column count. Only a nested left operand with no rows skips the check; it
/// always yields an empty product.
pub fn validate_pair<T, L, R>(left: &L, right: &R) -> Result<(Shape, Shape)>
where
    L: MatrixSource<T> + ?Sized,
    R: MatrixSource<T> + ?Sized,
{
    let left_shape = left.checked_shape(Operand::Left)?;
    let right_shape = right.checked_shape(Operand::Right)?;

    if left.has_known_columns() && left_shape.cols != right_shape.rows {
        return Err(dimension_mismatch(left_shape.cols, right_shape.rows));
    }

    Ok((left_shape, right_shape))
}
